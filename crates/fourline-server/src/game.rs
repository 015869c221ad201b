//! Live game entities: participants, seats, and the per-game state
//! machine.

use std::fmt;

use fourline_protocol::{GameId, ServerMessage};
use fourline_rules::{Board, PlayerId};
use tokio::sync::mpsc;

/// Channel over which the transport delivers outbound messages to one
/// client connection.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Opaque identifier for a client connection.
///
/// Distinct from [`PlayerId`]: a participant keeps their identity across
/// reconnects while the connection id changes with every socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A participant's live connection binding: which socket they are on and
/// the channel that reaches it.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub conn: ConnectionId,
    pub sender: ClientSender,
}

/// One of the two seats in a game: a human or the scripted opponent.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Durable identity, assigned by storage, stable across reconnects.
    pub id: PlayerId,
    pub name: String,
    /// Current connection, if any. `None` for the scripted opponent and
    /// for humans who have dropped.
    pub connection: Option<ClientHandle>,
    pub is_bot: bool,
    pub disconnected: bool,
}

impl Participant {
    /// Creates a connected human participant.
    pub fn human(id: PlayerId, name: String, connection: ClientHandle) -> Self {
        Self {
            id,
            name,
            connection: Some(connection),
            is_bot: false,
            disconnected: false,
        }
    }

    /// Creates the scripted opponent. Never has a connection.
    pub fn bot(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            connection: None,
            is_bot: true,
            disconnected: false,
        }
    }

    /// Sends a message to this participant's connection, if one is bound.
    /// Silently drops otherwise (scripted opponent, or receiver gone).
    pub fn send(&self, msg: ServerMessage) {
        if let Some(handle) = &self.connection {
            let _ = handle.sender.send(msg);
        }
    }
}

/// The per-game state machine.
///
/// ```text
/// Active ──(scripted seat on turn)──→ AwaitingBotMove ──→ Active
///    │                                      │
///    └──────────────→ Finished ←────────────┘
/// ```
///
/// `AwaitingBotMove` doubles as the re-entrancy guard for the scripted
/// move's thinking delay: a `BotMove` command only applies while the game
/// is in this state, so an overlapping or stale timer firing is a no-op.
/// `Finished` is terminal; a finished game leaves the live set in the same
/// step, which is what makes finalization idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Waiting for the participant on turn to move.
    Active,
    /// A scripted move is scheduled and not yet applied.
    AwaitingBotMove,
    /// Terminal.
    Finished,
}

/// A live game: two seats, a board, and whose turn it is.
#[derive(Debug)]
pub struct Game {
    pub id: GameId,
    /// Both participants in seat order (arrival order at pairing).
    pub players: [Participant; 2],
    pub board: Board,
    /// Always one of the two seated identities while the game is live.
    pub current_turn: PlayerId,
    pub status: GameStatus,
}

impl Game {
    /// Creates a game between `first` and `second`; `first` moves first.
    pub fn new(id: GameId, first: Participant, second: Participant) -> Self {
        let current_turn = first.id;
        Self {
            id,
            players: [first, second],
            board: Board::new(),
            current_turn,
            status: GameStatus::Active,
        }
    }

    /// The seated participant with the given identity, if any.
    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mutable access to the seated participant with the given identity.
    pub fn participant_mut(&mut self, id: PlayerId) -> Option<&mut Participant> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The other seat relative to `id`, if `id` is seated at all.
    pub fn opponent_of(&self, id: PlayerId) -> Option<&Participant> {
        if self.participant(id).is_none() {
            return None;
        }
        self.players.iter().find(|p| p.id != id)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn human(id: u64, name: &str) -> Participant {
        let (tx, _rx) = mpsc::unbounded_channel();
        Participant::human(
            PlayerId(id),
            name.to_string(),
            ClientHandle {
                conn: ConnectionId::new(id),
                sender: tx,
            },
        )
    }

    #[test]
    fn test_new_game_first_seat_moves_first() {
        let game = Game::new(GameId(1), human(1, "alice"), human(2, "bob"));

        assert_eq!(game.current_turn, PlayerId(1));
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.players[0].id, PlayerId(1));
        assert_eq!(game.players[1].id, PlayerId(2));
    }

    #[test]
    fn test_opponent_of_returns_other_seat() {
        let game = Game::new(GameId(1), human(1, "alice"), human(2, "bob"));

        assert_eq!(game.opponent_of(PlayerId(1)).map(|p| p.id), Some(PlayerId(2)));
        assert_eq!(game.opponent_of(PlayerId(2)).map(|p| p.id), Some(PlayerId(1)));
    }

    #[test]
    fn test_opponent_of_unseated_identity_returns_none() {
        let game = Game::new(GameId(1), human(1, "alice"), human(2, "bob"));

        assert!(game.opponent_of(PlayerId(99)).is_none());
    }

    #[test]
    fn test_bot_participant_has_no_connection() {
        let bot = Participant::bot(PlayerId(3), "HouseBot".to_string());

        assert!(bot.is_bot);
        assert!(bot.connection.is_none());
        // Sending to a connectionless seat is a silent no-op.
        bot.send(ServerMessage::Waiting);
    }

    #[test]
    fn test_connection_id_display_and_inner() {
        let conn = ConnectionId::new(7);
        assert_eq!(conn.to_string(), "conn-7");
        assert_eq!(conn.into_inner(), 7);
    }
}
