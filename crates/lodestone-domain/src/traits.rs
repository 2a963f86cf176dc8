//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Identity, IdentityId, PlayerName};

/// Trait for durable identity lookups
///
/// Implemented by the infrastructure layer (lodestone-store). Writes are
/// upserts keyed on the identity id; nothing in the resolution pipeline ever
/// deletes an entry.
pub trait EntryStore {
    /// Error type for store operations
    type Error;

    /// Find an identity by name, ignoring case
    fn find_by_name(&self, name: &PlayerName) -> Result<Option<Identity>, Self::Error>;

    /// Find an identity by id
    fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Self::Error>;

    /// Insert an identity, replacing the name of an existing entry with the same id
    fn insert(&mut self, identity: Identity) -> Result<(), Self::Error>;
}
