//! Gatekeeper error types

use thiserror::Error;

/// Every rule a payload broke, in the order they were found
///
/// Displays as the messages joined with `"; "`.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", .0.join("; "))]
pub struct Violations(Vec<String>);

impl Violations {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation at a path such as `profiles[0].cute_name`
    pub fn push(&mut self, path: &str, message: impl AsRef<str>) {
        self.0.push(format!("{}: {}", path, message.as_ref()));
    }

    /// Number of violations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no rule was broken
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The individual messages
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Consume into the individual messages
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}
