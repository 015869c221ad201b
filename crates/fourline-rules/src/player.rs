//! Player identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a participant (human or scripted).
///
/// Newtype over `u64` so a player id can never be confused with a game id
/// or a raw column index in a signature. Identity is assigned once by the
/// storage collaborator and survives reconnects.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`,
/// which is what appears in board cells and wire messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}
