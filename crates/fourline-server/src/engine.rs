//! The session engine: one actor task that owns every live game.
//!
//! All mutation of live state — boards, turns, the pending match slot, the
//! connection→seat index — happens inside [`Engine::run`], which drains a
//! single command channel. Client messages, socket closures, and every
//! deferred timer (match timeout, scripted-move delay, disconnect grace)
//! arrive as commands, so two events for the same game can never apply
//! concurrently.
//!
//! Deferred tasks re-validate state when their command drains: the match
//! timeout checks the slot still holds its identity, the scripted move
//! checks the `AwaitingBotMove` guard, and grace expiry checks the
//! participant is still gone. Cancellation races are expected, and a stale
//! firing is always a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fourline_protocol::{ClientMessage, GameId, ServerMessage};
use fourline_rules::{PlayerId, select_move};
use fourline_store::{EventSink, FinishedGame, GameEvent, PlayerKind, Storage};
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::game::{ClientHandle, ClientSender, ConnectionId, Game, GameStatus, Participant};
use crate::matchmaker::{JoinOutcome, Matchmaker};
use crate::monitor::DisconnectMonitor;

/// Counter for generating unique game ids. Ids are never reused within a
/// server run.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// A connection's seat in a live game.
#[derive(Debug, Clone, Copy)]
struct Seat {
    game: GameId,
    player: PlayerId,
}

/// Events processed by the engine actor.
#[derive(Debug)]
pub(crate) enum Command {
    /// A transport connection opened; `sender` delivers outbound messages.
    Register {
        conn: ConnectionId,
        sender: ClientSender,
    },
    /// A decoded client message.
    Inbound {
        conn: ConnectionId,
        msg: ClientMessage,
    },
    /// The connection closed.
    Closed { conn: ConnectionId },
    /// The pending match slot's grace timer fired.
    MatchTimeout { player: PlayerId },
    /// The scripted opponent's thinking delay elapsed.
    BotMove { game: GameId },
    /// A disconnected participant's grace period elapsed.
    GraceExpired { game: GameId, player: PlayerId },
}

/// Handle for feeding a running engine. Cheap to clone; the transport
/// holds one per server.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    /// Registers a connection's outbound channel with the engine.
    pub fn register(&self, conn: ConnectionId, sender: ClientSender) {
        let _ = self.tx.send(Command::Register { conn, sender });
    }

    /// Routes a decoded client message to the engine.
    pub fn inbound(&self, conn: ConnectionId, msg: ClientMessage) {
        let _ = self.tx.send(Command::Inbound { conn, msg });
    }

    /// Notifies the engine that a connection closed.
    pub fn closed(&self, conn: ConnectionId) {
        let _ = self.tx.send(Command::Closed { conn });
    }
}

/// Spawns the engine actor task and returns a handle to feed it.
pub fn spawn_engine<S, E>(config: EngineConfig, store: Arc<S>, events: Arc<E>) -> EngineHandle
where
    S: Storage,
    E: EventSink,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = Engine {
        monitor: DisconnectMonitor::new(config.reconnect_grace),
        config,
        store,
        events,
        games: HashMap::new(),
        connections: HashMap::new(),
        seats: HashMap::new(),
        matchmaker: Matchmaker::new(),
        tx: tx.clone(),
        rx,
    };
    tokio::spawn(engine.run());
    EngineHandle { tx }
}

/// The actor state. Owned by a single task; never shared.
struct Engine<S, E> {
    config: EngineConfig,
    store: Arc<S>,
    events: Arc<E>,
    /// Live games only — a finished game leaves this map in the same step
    /// that finalizes it.
    games: HashMap<GameId, Game>,
    /// Every registered connection's outbound channel.
    connections: HashMap<ConnectionId, ClientSender>,
    /// Which live game (and seat) each connection is bound to.
    seats: HashMap<ConnectionId, Seat>,
    matchmaker: Matchmaker,
    monitor: DisconnectMonitor,
    /// Clone handed to every deferred task so its firing re-enters the
    /// actor as a command.
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl<S: Storage, E: EventSink> Engine<S, E> {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("session engine started");
        while let Some(cmd) = self.rx.recv().await {
            self.handle(cmd).await;
        }
        tracing::info!("session engine stopped");
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Register { conn, sender } => {
                self.connections.insert(conn, sender);
                tracing::debug!(%conn, "connection registered");
            }
            Command::Inbound { conn, msg } => match msg {
                ClientMessage::JoinGame { username } => self.handle_join(conn, username).await,
                ClientMessage::MakeMove { column } => self.handle_move(conn, column).await,
                ClientMessage::Reconnect {
                    game_id,
                    participant_id,
                } => self.handle_reconnect(conn, game_id, participant_id).await,
            },
            Command::Closed { conn } => self.handle_closed(conn).await,
            Command::MatchTimeout { player } => self.handle_match_timeout(player).await,
            Command::BotMove { game } => self.handle_bot_move(game).await,
            Command::GraceExpired { game, player } => {
                self.handle_grace_expired(game, player).await;
            }
        }
    }

    // -- join ------------------------------------------------------------

    async fn handle_join(&mut self, conn: ConnectionId, username: String) {
        if self.seats.contains_key(&conn) {
            tracing::debug!(%conn, "join from a connection already seated, ignoring");
            return;
        }
        let Some(sender) = self.connections.get(&conn).cloned() else {
            return;
        };

        let record = match self
            .store
            .find_or_create_player(&username, PlayerKind::Human)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%username, error = %e, "player lookup failed");
                let _ = sender.send(ServerMessage::Error {
                    message: "matchmaking unavailable".to_string(),
                });
                return;
            }
        };
        let player = record.id;

        // An identity already seated in a live game cannot enter
        // matchmaking again; the stray join changes nothing.
        if self.games.values().any(|g| g.participant(player).is_some()) {
            tracing::debug!(player_id = %player, "join for identity already in a live game, ignoring");
            return;
        }
        // The same identity joining twice keeps its slot.
        if self.matchmaker.waiting_id() == Some(player) {
            let _ = sender.send(ServerMessage::Waiting);
            return;
        }

        let participant = Participant::human(
            player,
            record.name,
            ClientHandle {
                conn,
                sender: sender.clone(),
            },
        );
        let timer_tx = self.tx.clone();
        let timeout = self.config.match_timeout;
        let outcome = self.matchmaker.join(participant, move || {
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let _ = timer_tx.send(Command::MatchTimeout { player });
            })
        });

        match outcome {
            JoinOutcome::Waiting => {
                tracing::info!(player_id = %player, "waiting for an opponent");
                let _ = sender.send(ServerMessage::Waiting);
            }
            JoinOutcome::Paired { first, second } => self.start_game(first, second),
        }
    }

    async fn handle_match_timeout(&mut self, player: PlayerId) {
        // Fire-time validation: a pairing may have claimed the slot while
        // this command was queued.
        let Some(waiting) = self.matchmaker.take_expired(player) else {
            return;
        };

        let record = match self
            .store
            .find_or_create_player(&self.config.bot_name, PlayerKind::Bot)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "scripted opponent lookup failed");
                waiting.send(ServerMessage::Error {
                    message: "no opponent available".to_string(),
                });
                return;
            }
        };

        tracing::info!(player_id = %player, "match timeout, starting scripted-opponent game");
        let bot = Participant::bot(record.id, record.name);
        self.start_game(waiting, bot);
    }

    /// Creates a game with `first` on turn, seats both connections, and
    /// announces the start.
    fn start_game(&mut self, first: Participant, second: Participant) {
        let game_id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        let game = Game::new(game_id, first, second);

        for p in &game.players {
            if let Some(handle) = &p.connection {
                self.seats.insert(
                    handle.conn,
                    Seat {
                        game: game_id,
                        player: p.id,
                    },
                );
            }
        }
        for p in &game.players {
            let Some(opponent) = game.opponent_of(p.id) else {
                continue;
            };
            p.send(ServerMessage::GameStart {
                game_id,
                participant_id: p.id,
                opponent_name: opponent.name.clone(),
                your_turn: game.current_turn == p.id,
            });
        }

        tracing::info!(
            %game_id,
            first = %game.players[0].id,
            second = %game.players[1].id,
            "game started"
        );
        self.publish(GameEvent::GameStarted {
            game_id,
            players: [game.players[0].id, game.players[1].id],
        });
        self.games.insert(game_id, game);
    }

    // -- moves -----------------------------------------------------------

    async fn handle_move(&mut self, conn: ConnectionId, column: usize) {
        // Stale or forged references are ignored without reply: a finished
        // game has already left the live set and its seats.
        let Some(&Seat {
            game: game_id,
            player,
        }) = self.seats.get(&conn)
        else {
            return;
        };
        let Some(game) = self.games.get_mut(&game_id) else {
            return;
        };

        if game.current_turn != player {
            if let Some(p) = game.participant(player) {
                p.send(ServerMessage::Error {
                    message: "Not your turn".to_string(),
                });
            }
            return;
        }

        let (row, _) = match game.board.drop_piece(column, player) {
            Ok(spot) => spot,
            Err(e) => {
                if let Some(p) = game.participant(player) {
                    p.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
                return;
            }
        };

        let Some((next_player, next_is_bot)) =
            game.opponent_of(player).map(|o| (o.id, o.is_bot))
        else {
            return;
        };
        let won = game.board.check_win(player);
        let drawn = !won && game.board.check_draw();
        if !won && !drawn {
            game.current_turn = next_player;
            if next_is_bot {
                // Enter the guard before the delay is armed, so the move
                // request that triggered it can never double-schedule.
                game.status = GameStatus::AwaitingBotMove;
            }
        }

        self.publish(GameEvent::MovePlayed {
            game_id,
            player_id: player,
            column,
            row,
        });

        if won {
            self.finalize(game_id, Some(player), None).await;
            return;
        }
        if drawn {
            self.finalize(game_id, None, None).await;
            return;
        }

        self.broadcast_update(game_id);
        if next_is_bot {
            self.schedule_bot_move(game_id);
        }
    }

    /// Arms the scripted opponent's thinking delay.
    fn schedule_bot_move(&self, game_id: GameId) {
        let tx = self.tx.clone();
        let delay = self.config.bot_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Command::BotMove { game: game_id });
        });
    }

    async fn handle_bot_move(&mut self, game_id: GameId) {
        let Some(game) = self.games.get_mut(&game_id) else {
            return;
        };
        // The re-entrancy guard: only an armed game accepts a scripted
        // move. A stale or duplicate timer finds the guard cleared.
        if game.status != GameStatus::AwaitingBotMove {
            return;
        }

        let bot = game.current_turn;
        if game.participant(bot).is_none_or(|p| !p.is_bot) {
            game.status = GameStatus::Active;
            return;
        }
        let Some(human) = game.opponent_of(bot).map(|p| p.id) else {
            game.status = GameStatus::Active;
            return;
        };

        let Some(column) = select_move(&game.board, bot, human) else {
            // No playable column: the board filled up, so the game
            // resolves as a draw.
            self.finalize(game_id, None, None).await;
            return;
        };

        let (row, _) = match game.board.drop_piece(column, bot) {
            Ok(spot) => spot,
            Err(e) => {
                // The heuristic only offers playable columns; if a drop
                // still fails, clear the guard and hand the turn back
                // rather than wedging the game.
                tracing::error!(%game_id, error = %e, "scripted move failed");
                game.status = GameStatus::Active;
                game.current_turn = human;
                self.broadcast_update(game_id);
                return;
            }
        };

        let won = game.board.check_win(bot);
        let drawn = !won && game.board.check_draw();
        if !won && !drawn {
            game.status = GameStatus::Active;
            game.current_turn = human;
        }

        self.publish(GameEvent::MovePlayed {
            game_id,
            player_id: bot,
            column,
            row,
        });

        if won {
            self.finalize(game_id, Some(bot), None).await;
            return;
        }
        if drawn {
            self.finalize(game_id, None, None).await;
            return;
        }
        self.broadcast_update(game_id);
    }

    /// Sends a personalized `game_update` to both seats.
    fn broadcast_update(&self, game_id: GameId) {
        let Some(game) = self.games.get(&game_id) else {
            return;
        };
        for p in &game.players {
            p.send(ServerMessage::GameUpdate {
                board: game.board,
                current_turn: game.current_turn,
                can_move: game.current_turn == p.id,
            });
        }
    }

    // -- disconnect / reconnect ------------------------------------------

    async fn handle_closed(&mut self, conn: ConnectionId) {
        self.connections.remove(&conn);

        // A participant still waiting for a match just leaves the queue;
        // their timeout must not later start a game for a dead socket.
        if let Some(waiting) = self.matchmaker.abandon(conn) {
            tracing::info!(player_id = %waiting.id, "waiting participant left the queue");
            return;
        }

        let Some(Seat {
            game: game_id,
            player,
        }) = self.seats.remove(&conn)
        else {
            return;
        };
        let Some(game) = self.games.get_mut(&game_id) else {
            return;
        };
        let Some(p) = game.participant_mut(player) else {
            return;
        };
        // A reconnect may already have bound a newer socket; the close of
        // the stale one must not mark the participant disconnected again.
        if p.connection.as_ref().map(|h| h.conn) != Some(conn) {
            return;
        }
        p.connection = None;
        p.disconnected = true;

        let grace_secs = self.config.reconnect_grace.as_secs();
        if let Some(opponent) = game.opponent_of(player) {
            opponent.send(ServerMessage::OpponentDisconnected {
                message: format!(
                    "Opponent disconnected. Waiting {grace_secs}s for them to return."
                ),
            });
        }
        tracing::info!(%game_id, player_id = %player, "participant disconnected, grace period started");

        let tx = self.tx.clone();
        self.monitor
            .mark_disconnected(player, move || {
                let _ = tx.send(Command::GraceExpired {
                    game: game_id,
                    player,
                });
            })
            .await;
    }

    async fn handle_reconnect(
        &mut self,
        conn: ConnectionId,
        game_id: GameId,
        player: PlayerId,
    ) {
        let Some(sender) = self.connections.get(&conn).cloned() else {
            return;
        };
        // Unknown game or unseated identity: stale references are ignored.
        let Some(game) = self.games.get_mut(&game_id) else {
            return;
        };
        let Some(p) = game.participant_mut(player) else {
            return;
        };

        // Drop any previous binding; its socket may still close later and
        // must not be mistaken for a fresh disconnect.
        if let Some(old) = p.connection.take() {
            self.seats.remove(&old.conn);
        }
        p.connection = Some(ClientHandle {
            conn,
            sender: sender.clone(),
        });
        p.disconnected = false;

        let board = game.board;
        let current_turn = game.current_turn;
        if let Some(opponent) = game.opponent_of(player) {
            opponent.send(ServerMessage::OpponentReconnected);
        }

        self.seats.insert(
            conn,
            Seat {
                game: game_id,
                player,
            },
        );
        self.monitor.reconnected(player).await;

        let _ = sender.send(ServerMessage::Reconnected {
            board,
            current_turn,
        });
        tracing::info!(%game_id, player_id = %player, "participant reconnected");
    }

    async fn handle_grace_expired(&mut self, game_id: GameId, player: PlayerId) {
        // Fire-time validation: the game may have finished or the
        // participant may have returned while this command was queued.
        let Some(game) = self.games.get(&game_id) else {
            return;
        };
        let Some(p) = game.participant(player) else {
            return;
        };
        if !p.disconnected {
            return;
        }

        let winner = game.opponent_of(player).map(|o| o.id);
        tracing::info!(%game_id, player_id = %player, "grace period expired, forfeiting");
        self.finalize(game_id, winner, Some("forfeit")).await;
    }

    // -- finalize --------------------------------------------------------

    /// The single terminal transition of a game.
    ///
    /// Idempotent: the game is removed from the live set up front, so a
    /// second call for the same id finds nothing and changes nothing —
    /// exactly one persistence write, at most one win increment, one
    /// finish event, one `game_over` broadcast pair.
    ///
    /// Collaborator failures are logged and never block the broadcast; the
    /// in-memory outcome is authoritative for the live protocol.
    async fn finalize(&mut self, game_id: GameId, winner: Option<PlayerId>, reason: Option<&str>) {
        let Some(mut game) = self.games.remove(&game_id) else {
            return;
        };
        game.status = GameStatus::Finished;
        self.seats.retain(|_, seat| seat.game != game_id);

        let result = FinishedGame {
            game_id,
            players: [game.players[0].id, game.players[1].id],
            winner,
            board: game.board,
        };
        if let Err(e) = self.store.save_result(&result).await {
            tracing::warn!(%game_id, error = %e, "failed to persist finished game");
        }
        if let Some(winner_id) = winner {
            if let Err(e) = self.store.increment_wins(winner_id).await {
                tracing::warn!(player_id = %winner_id, error = %e, "failed to record win");
            }
        }
        self.publish(GameEvent::GameFinished {
            game_id,
            winner_id: winner,
            reason: reason.map(str::to_string),
        });

        for p in &game.players {
            p.send(ServerMessage::GameOver {
                winner,
                board: game.board,
                reason: reason.map(str::to_string),
            });
            // Any grace timer still running for a seat of this game is
            // moot now.
            self.monitor.reconnected(p.id).await;
        }
        tracing::info!(%game_id, winner = ?winner, reason = ?reason, "game finished");
    }

    /// Dispatches an analytics event without awaiting delivery.
    fn publish(&self, event: GameEvent) {
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            if let Err(e) = events.publish(event).await {
                tracing::warn!(error = %e, "analytics publish failed");
            }
        });
    }
}
