//! The storage collaborator: durable players, finished games, leaderboard.

use std::collections::HashMap;
use std::future::Future;

use fourline_protocol::GameId;
use fourline_rules::PlayerId;
use tokio::sync::Mutex;

use crate::{FinishedGame, LeaderboardEntry, PlayerKind, PlayerRecord, StoreError};

/// Durable storage as the engine sees it.
///
/// Implementations back this with whatever they like (a relational store,
/// a key-value store, a test double); the engine only relies on the
/// contract documented per method.
pub trait Storage: Send + Sync + 'static {
    /// Resolves a display name to its durable record, creating one with a
    /// fresh identity on first registration. Must return the same identity
    /// for the same name on every later call.
    fn find_or_create_player(
        &self,
        name: &str,
        kind: PlayerKind,
    ) -> impl Future<Output = Result<PlayerRecord, StoreError>> + Send;

    /// Increments the win counter of an existing player.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownPlayer`] if no record exists.
    fn increment_wins(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persists a finished game. Idempotent per game id: a second write
    /// for the same game is a no-op, so a retried `finalize` can never
    /// duplicate a result row.
    fn save_result(
        &self,
        game: &FinishedGame,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns up to `limit` players ordered by wins, descending.
    fn leaderboard(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, StoreError>> + Send;
}

/// In-memory [`Storage`] used by tests and the demo binary.
///
/// Two maps kept in sync: records by id, plus a name index so
/// `find_or_create_player` resolves without scanning.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    players: HashMap<PlayerId, PlayerRecord>,
    names: HashMap<String, PlayerId>,
    games: HashMap<GameId, FinishedGame>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the persisted result for a game, if any. Test hook.
    pub async fn finished_game(&self, game_id: GameId) -> Option<FinishedGame> {
        self.inner.lock().await.games.get(&game_id).cloned()
    }

    /// Number of persisted game results. Test hook.
    pub async fn finished_count(&self) -> usize {
        self.inner.lock().await.games.len()
    }
}

impl Storage for MemoryStore {
    async fn find_or_create_player(
        &self,
        name: &str,
        kind: PlayerKind,
    ) -> Result<PlayerRecord, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(id) = inner.names.get(name).copied() {
            if let Some(record) = inner.players.get(&id) {
                return Ok(record.clone());
            }
        }

        inner.next_id += 1;
        let record = PlayerRecord {
            id: PlayerId(inner.next_id),
            name: name.to_string(),
            kind,
            wins: 0,
        };
        inner.names.insert(record.name.clone(), record.id);
        inner.players.insert(record.id, record.clone());

        tracing::debug!(player_id = %record.id, name, "player record created");
        Ok(record)
    }

    async fn increment_wins(&self, player: PlayerId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .players
            .get_mut(&player)
            .ok_or(StoreError::UnknownPlayer(player))?;
        record.wins += 1;
        Ok(())
    }

    async fn save_result(&self, game: &FinishedGame) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.games.entry(game.game_id).or_insert_with(|| game.clone());
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let inner = self.inner.lock().await;
        let mut entries: Vec<LeaderboardEntry> = inner
            .players
            .values()
            .map(|record| LeaderboardEntry {
                name: record.name.clone(),
                wins: record.wins,
            })
            .collect();
        // Ties broken by name so the ordering is stable.
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
        entries.truncate(limit);
        Ok(entries)
    }
}

// =========================================================================
// Tests
// =========================================================================
