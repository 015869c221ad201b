//! Wire message types.
//!
//! Every message is one JSON object with a `type` discriminator in
//! `snake_case` and `camelCase` field names — the exact shapes the client
//! SDK parses, pinned by the tests at the bottom of this module.

use std::fmt;

use fourline_rules::{Board, PlayerId};
use serde::{Deserialize, Serialize};

/// A unique identifier for a game session.
///
/// Same newtype pattern as [`PlayerId`]: a plain number on the wire, a
/// distinct type in signatures. Game ids are unique per server run and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking under a display name.
    JoinGame { username: String },

    /// Drop a piece into a column of the caller's current game.
    MakeMove { column: usize },

    /// Resume a seat after a dropped connection.
    #[serde(rename_all = "camelCase")]
    Reconnect {
        game_id: GameId,
        participant_id: PlayerId,
    },
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// No opponent yet; the caller holds the pending match slot.
    Waiting,

    /// A game has been created and the recipient is seated in it.
    #[serde(rename_all = "camelCase")]
    GameStart {
        game_id: GameId,
        /// The recipient's own identity — needed later for `reconnect`.
        participant_id: PlayerId,
        opponent_name: String,
        your_turn: bool,
    },

    /// The board changed; `can_move` is personalized per recipient.
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        board: Board,
        current_turn: PlayerId,
        can_move: bool,
    },

    /// The game finished. `winner` is `null` on a draw; `reason` is only
    /// present for abnormal endings ("forfeit").
    GameOver {
        winner: Option<PlayerId>,
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A rejected request (bad column, out-of-turn move). State unchanged.
    Error { message: String },

    /// The recipient's opponent dropped; the grace clock is running.
    OpponentDisconnected { message: String },

    /// The recipient's opponent returned within the grace period.
    OpponentReconnected,

    /// Snapshot sent to a participant who just reconnected.
    #[serde(rename_all = "camelCase")]
    Reconnected {
        board: Board,
        current_turn: PlayerId,
    },
}

// =========================================================================
// Tests
// =========================================================================
