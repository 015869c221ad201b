//! Record types that cross the storage interface.

use fourline_protocol::GameId;
use fourline_rules::{Board, PlayerId};
use serde::{Deserialize, Serialize};

/// Whether a durable player record belongs to a human or the scripted
/// opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerKind {
    Human,
    Bot,
}

/// A durable player record. Identity is assigned on first registration and
/// reused on every later join or reconnect; `wins` outlives sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    pub wins: u64,
}

/// The result of a finished game, written exactly once per game by
/// `finalize`. `winner` is `None` for a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedGame {
    pub game_id: GameId,
    /// Both seats in seat order.
    pub players: [PlayerId; 2],
    pub winner: Option<PlayerId>,
    pub board: Board,
}

/// One row of the leaderboard read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: u64,
}
