//! The analytics collaborator: an append-only sink of typed game events.
//!
//! Publishing is fire-and-forget. The engine dispatches events without
//! awaiting delivery, and a sink failure is logged — never surfaced into
//! the protocol path.

use std::future::Future;

use fourline_protocol::GameId;
use fourline_rules::PlayerId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::StoreError;

/// A typed analytics event.
///
/// On the wire each event is `{ "type": "...", "payload": { ... } }` with
/// a SCREAMING_SNAKE type tag — the shape the downstream metrics consumer
/// groups by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    /// Two participants were paired and a game began.
    #[serde(rename_all = "camelCase")]
    GameStarted {
        game_id: GameId,
        players: [PlayerId; 2],
    },

    /// A piece was placed (human or scripted).
    #[serde(rename_all = "camelCase")]
    MovePlayed {
        game_id: GameId,
        player_id: PlayerId,
        column: usize,
        row: usize,
    },

    /// A game reached its terminal state.
    #[serde(rename_all = "camelCase")]
    GameFinished {
        game_id: GameId,
        winner_id: Option<PlayerId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// An append-only event sink.
pub trait EventSink: Send + Sync + 'static {
    /// Publishes one event. Failures are the caller's to log and swallow.
    fn publish(&self, event: GameEvent) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// An [`EventSink`] that records events in memory. Test double.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<GameEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub async fn recorded(&self) -> Vec<GameEvent> {
        self.events.lock().await.clone()
    }
}

impl EventSink for MemorySink {
    async fn publish(&self, event: GameEvent) -> Result<(), StoreError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// An [`EventSink`] that emits events to the log. Used by the demo binary
/// where no real analytics pipeline is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    async fn publish(&self, event: GameEvent) -> Result<(), StoreError> {
        tracing::info!(event = ?event, "analytics event");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
