//! Matchmaking: a single pending slot, paired on arrival or timed out
//! into a scripted-opponent game.
//!
//! The matchmaker is owned by the engine actor, so `join` and the timeout
//! command can never interleave — slot-clear and timer-cancel are atomic
//! by single-writer discipline, not by locking. The timeout task itself
//! only *announces* expiry; [`Matchmaker::take_expired`] is the fire-time
//! check that makes a stale announcement a no-op.

use fourline_rules::PlayerId;
use tokio::task::JoinHandle;

use crate::game::{ConnectionId, Participant};

/// The result of a join attempt.
#[derive(Debug)]
pub enum JoinOutcome {
    /// No opponent available; the caller now holds the pending slot.
    Waiting,
    /// The caller was paired with the waiting participant. Seat order is
    /// arrival order: `first` was already waiting.
    Paired {
        first: Participant,
        second: Participant,
    },
}

#[derive(Debug)]
struct PendingMatch {
    participant: Participant,
    timer: JoinHandle<()>,
}

/// Holds at most one waiting participant plus their expiry timer.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: Option<PendingMatch>,
}

impl Matchmaker {
    /// Creates an empty matchmaker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant to matchmaking.
    ///
    /// With an empty slot the participant is stored and `arm_timer` is
    /// invoked to start the expiry task. With an occupied slot the waiting
    /// participant's timer is aborted and both are returned as a pair.
    pub fn join(
        &mut self,
        participant: Participant,
        arm_timer: impl FnOnce() -> JoinHandle<()>,
    ) -> JoinOutcome {
        match self.waiting.take() {
            None => {
                self.waiting = Some(PendingMatch {
                    participant,
                    timer: arm_timer(),
                });
                JoinOutcome::Waiting
            }
            Some(pending) => {
                pending.timer.abort();
                JoinOutcome::Paired {
                    first: pending.participant,
                    second: participant,
                }
            }
        }
    }

    /// Claims the pending participant on timer expiry.
    ///
    /// Returns `None` unless the slot still holds exactly the identity the
    /// timer was armed for — a pairing may have claimed it while the expiry
    /// command was in flight, and that stale firing must change nothing.
    pub fn take_expired(&mut self, player: PlayerId) -> Option<Participant> {
        if self
            .waiting
            .as_ref()
            .is_some_and(|pending| pending.participant.id == player)
        {
            self.waiting.take().map(|pending| pending.participant)
        } else {
            None
        }
    }

    /// Clears the slot if the waiting participant is bound to `conn`.
    ///
    /// Called when a connection closes before a match was found, so the
    /// timer can't later start a scripted-opponent game for a dead socket.
    pub fn abandon(&mut self, conn: ConnectionId) -> Option<Participant> {
        let waiting_on_conn = self.waiting.as_ref().is_some_and(|pending| {
            pending
                .participant
                .connection
                .as_ref()
                .is_some_and(|handle| handle.conn == conn)
        });
        if !waiting_on_conn {
            return None;
        }
        self.waiting.take().map(|pending| {
            pending.timer.abort();
            pending.participant
        })
    }

    /// Identity of the waiting participant, if the slot is occupied.
    pub fn waiting_id(&self) -> Option<PlayerId> {
        self.waiting.as_ref().map(|pending| pending.participant.id)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::game::ClientHandle;

    fn participant(id: u64) -> Participant {
        let (tx, _rx) = mpsc::unbounded_channel();
        Participant::human(
            PlayerId(id),
            format!("player-{id}"),
            ClientHandle {
                conn: ConnectionId::new(id),
                sender: tx,
            },
        )
    }

    /// Arms a timer that flips `fired` after `delay`.
    fn flag_timer(fired: Arc<AtomicBool>, delay: Duration) -> impl FnOnce() -> JoinHandle<()> {
        move || {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                fired.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_empty_slot_returns_waiting_and_holds_slot() {
        let mut mm = Matchmaker::new();
        let fired = Arc::new(AtomicBool::new(false));

        let outcome = mm.join(
            participant(1),
            flag_timer(Arc::clone(&fired), Duration::from_secs(5)),
        );

        assert!(matches!(outcome, JoinOutcome::Waiting));
        assert_eq!(mm.waiting_id(), Some(PlayerId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_join_pairs_in_arrival_order_and_clears_slot() {
        let mut mm = Matchmaker::new();
        let fired = Arc::new(AtomicBool::new(false));
        mm.join(
            participant(1),
            flag_timer(Arc::clone(&fired), Duration::from_secs(5)),
        );

        let outcome = mm.join(participant(2), || tokio::spawn(async {}));

        match outcome {
            JoinOutcome::Paired { first, second } => {
                assert_eq!(first.id, PlayerId(1));
                assert_eq!(second.id, PlayerId(2));
            }
            other => panic!("expected Paired, got {other:?}"),
        }
        assert_eq!(mm.waiting_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_aborts_the_pending_timer() {
        let mut mm = Matchmaker::new();
        let fired = Arc::new(AtomicBool::new(false));
        mm.join(
            participant(1),
            flag_timer(Arc::clone(&fired), Duration::from_secs(5)),
        );

        mm.join(participant(2), || tokio::spawn(async {}));

        // Well past the timer deadline: an aborted task must never fire.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_expired_yields_waiting_participant_once() {
        let mut mm = Matchmaker::new();
        mm.join(participant(1), || tokio::spawn(async {}));

        let taken = mm.take_expired(PlayerId(1));

        assert_eq!(taken.map(|p| p.id), Some(PlayerId(1)));
        assert_eq!(mm.waiting_id(), None);
        assert!(mm.take_expired(PlayerId(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_expired_for_stale_identity_is_noop() {
        // The slot has been recycled to a different participant since the
        // timer was armed; the stale expiry must not claim it.
        let mut mm = Matchmaker::new();
        mm.join(participant(1), || tokio::spawn(async {}));
        mm.join(participant(2), || tokio::spawn(async {}));
        mm.join(participant(3), || tokio::spawn(async {}));

        assert!(mm.take_expired(PlayerId(1)).is_none());
        assert_eq!(mm.waiting_id(), Some(PlayerId(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_clears_slot_and_aborts_timer_for_matching_conn() {
        let mut mm = Matchmaker::new();
        let fired = Arc::new(AtomicBool::new(false));
        mm.join(
            participant(1),
            flag_timer(Arc::clone(&fired), Duration::from_secs(5)),
        );

        let abandoned = mm.abandon(ConnectionId::new(1));

        assert_eq!(abandoned.map(|p| p.id), Some(PlayerId(1)));
        assert_eq!(mm.waiting_id(), None);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_other_conn_keeps_slot() {
        let mut mm = Matchmaker::new();
        mm.join(participant(1), || tokio::spawn(async {}));

        assert!(mm.abandon(ConnectionId::new(42)).is_none());
        assert_eq!(mm.waiting_id(), Some(PlayerId(1)));
    }
}
