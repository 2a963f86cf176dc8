//! Profiles command implementation.

use super::parse_name;
use crate::error::Result;
use crate::output::Formatter;
use lodestone_domain::traits::EntryStore;
use lodestone_resolver::{IdentityRef, Resolver};
use std::fmt::Display;

/// Execute the profiles command.
pub async fn execute_profiles<S>(name: &str, resolver: &Resolver<S>, formatter: &Formatter) -> Result<()>
where
    S: EntryStore,
    S::Error: Display,
{
    let target = IdentityRef::Name(parse_name(name)?);
    let profiles = resolver.profiles(&target).await?;
    println!("{}", formatter.format_profiles(&profiles)?);
    Ok(())
}
