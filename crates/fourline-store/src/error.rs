//! Error types for the collaborator layer.

use fourline_rules::PlayerId;

/// Errors that a storage or analytics collaborator can return.
///
/// The engine never propagates these into the protocol path — they are
/// logged and the in-memory outcome stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No durable record exists for the given player.
    #[error("no player record for {0}")]
    UnknownPlayer(PlayerId),

    /// The backing service could not be reached or rejected the call.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
