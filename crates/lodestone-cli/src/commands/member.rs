//! Member command implementation.

use super::parse_name;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lodestone_domain::traits::EntryStore;
use lodestone_resolver::Resolver;
use std::fmt::Display;
use uuid::Uuid;

/// Execute the member command.
pub async fn execute_member<S>(
    name: &str,
    profile_id: &str,
    resolver: &Resolver<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: EntryStore,
    S::Error: Display,
{
    let name = parse_name(name)?;
    let profile_id = parse_profile_id(profile_id)?;
    let metrics = resolver.member_metrics_by_name(&name, profile_id).await?;
    println!("{}", formatter.format_metrics(&metrics)?);
    Ok(())
}

fn parse_profile_id(raw: &str) -> Result<Uuid> {
    Uuid::try_parse(raw).map_err(|e| CliError::InvalidInput(format!("Invalid profile id '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_id() {
        let id = parse_profile_id("4f1d8d561a894e569c1d23b0b7e3a5a1").unwrap();
        assert_eq!(id.to_string(), "4f1d8d56-1a89-4e56-9c1d-23b0b7e3a5a1");
        assert!(matches!(parse_profile_id("papaya"), Err(CliError::InvalidInput(_))));
    }
}
