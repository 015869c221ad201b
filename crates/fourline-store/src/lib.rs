//! Collaborator interfaces for Fourline's session engine.
//!
//! The engine treats durable storage and the analytics sink as external
//! collaborators: it calls them through the [`Storage`] and [`EventSink`]
//! traits and never depends on how they are backed. This crate defines
//! those traits, the record and event types that cross them, and in-memory
//! implementations ([`MemoryStore`], [`MemorySink`]) used by the tests and
//! the demo binary.
//!
//! Both collaborators are best-effort from the engine's perspective: a
//! failed write is logged and the live protocol carries on.

#![allow(async_fn_in_trait)]

mod error;
mod events;
mod records;
mod storage;

pub use error::StoreError;
pub use events::{EventSink, GameEvent, LogSink, MemorySink};
pub use records::{FinishedGame, LeaderboardEntry, PlayerKind, PlayerRecord};
pub use storage::{MemoryStore, Storage};
