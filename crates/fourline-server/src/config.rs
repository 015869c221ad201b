//! Engine configuration.

use std::time::Duration;

/// Timings and identity settings for the session engine.
///
/// Every wait in the engine is bounded by one of these durations; there is
/// no unbounded blocking anywhere in the protocol path.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a lone participant holds the pending match slot before the
    /// engine pairs them with the scripted opponent instead.
    pub match_timeout: Duration,

    /// Simulated thinking time before a scripted move is applied. Exists
    /// both for feel and to give the re-entrancy guard a deterministic
    /// window to close.
    pub bot_delay: Duration,

    /// How long a disconnected participant may take to reconnect before
    /// the game is forfeited to their opponent.
    pub reconnect_grace: Duration,

    /// Display name under which the scripted opponent is registered with
    /// the storage collaborator.
    pub bot_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_timeout: Duration::from_secs(10),
            bot_delay: Duration::from_millis(1200),
            reconnect_grace: Duration::from_secs(30),
            bot_name: "HouseBot".to_string(),
        }
    }
}
