//! Player lookup commands.

use super::parse_name;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lodestone_domain::traits::EntryStore;
use lodestone_domain::IdentityId;
use lodestone_resolver::Resolver;
use std::fmt::Display;

/// Execute the player command.
pub async fn execute_player<S>(name: &str, resolver: &Resolver<S>, formatter: &Formatter) -> Result<()>
where
    S: EntryStore,
    S::Error: Display,
{
    let name = parse_name(name)?;
    let identity = resolver.identity(&name).await?;
    println!("{}", formatter.format_identity(&identity)?);
    Ok(())
}

/// Execute the player-id command.
pub async fn execute_player_id<S>(id: &str, resolver: &Resolver<S>, formatter: &Formatter) -> Result<()>
where
    S: EntryStore,
    S::Error: Display,
{
    let id = IdentityId::parse(id).map_err(CliError::InvalidInput)?;
    let identity = resolver.identity_by_id(&id).await?;
    println!("{}", formatter.format_identity(&identity)?);
    Ok(())
}
