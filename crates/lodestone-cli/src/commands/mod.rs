//! Command implementations.

pub mod member;
pub mod player;
pub mod profiles;

pub use self::member::execute_member;
pub use self::player::{execute_player, execute_player_id};
pub use self::profiles::execute_profiles;

use crate::error::{CliError, Result};
use lodestone_domain::PlayerName;

/// Parse a player name argument.
pub(crate) fn parse_name(raw: &str) -> Result<PlayerName> {
    PlayerName::new(raw).map_err(CliError::InvalidInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("Notch").unwrap().as_str(), "Notch");
        assert!(matches!(parse_name("not a name"), Err(CliError::InvalidInput(_))));
    }
}
