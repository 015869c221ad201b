//! Disconnect grace timers, one per participant identity.
//!
//! The monitor guarantees per disconnect episode: `on_expire` fires at
//! most once, and never after a [`reconnected`](DisconnectMonitor::reconnected)
//! call that beat the deadline. The timer table is shared with the timer
//! tasks themselves so a firing task can deregister before invoking its
//! callback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fourline_rules::PlayerId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Per-participant grace-period timers.
pub struct DisconnectMonitor {
    grace: Duration,
    timers: Arc<Mutex<HashMap<PlayerId, JoinHandle<()>>>>,
}

impl DisconnectMonitor {
    /// Creates a monitor with the given grace period.
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The configured grace period.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Arms a grace timer for `player` that invokes `on_expire` when the
    /// period elapses. No-op if a timer is already running for this
    /// identity — one disconnect episode, one timer.
    pub async fn mark_disconnected<F>(&self, player: PlayerId, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut timers = self.timers.lock().await;
        if timers.contains_key(&player) {
            return;
        }

        let grace = self.grace;
        let table = Arc::clone(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            // Deregister before firing: once the entry is gone, a late
            // `reconnected` finds nothing to abort and the callback runs
            // to completion exactly once.
            let armed = table.lock().await.remove(&player).is_some();
            if armed {
                tracing::debug!(player_id = %player, "disconnect grace expired");
                on_expire();
            }
        });
        timers.insert(player, handle);
        tracing::debug!(player_id = %player, ?grace, "disconnect grace timer armed");
    }

    /// Cancels and removes any running timer for `player`. No-op if none
    /// exists (the timer already fired, or was never armed).
    pub async fn reconnected(&self, player: PlayerId) {
        if let Some(handle) = self.timers.lock().await.remove(&player) {
            handle.abort();
            tracing::debug!(player_id = %player, "disconnect grace timer cancelled");
        }
    }

    /// Whether a grace timer is currently armed for `player`.
    pub async fn is_armed(&self, player: PlayerId) -> bool {
        self.timers.lock().await.contains_key(&player)
    }
}

// =========================================================================
// Tests
// =========================================================================
