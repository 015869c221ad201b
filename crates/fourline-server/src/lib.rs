//! Session engine and WebSocket front-end for Fourline.
//!
//! This crate owns everything live: matchmaking, the per-game turn state
//! machine, disconnect grace handling, and the bridge between sockets and
//! the engine. Durable storage and analytics are reached through the
//! collaborator traits in `fourline-store`; board legality lives in
//! `fourline-rules`.
//!
//! # Key types
//!
//! - [`spawn_engine`] / [`EngineHandle`] — the actor task that serializes
//!   every game mutation
//! - [`Matchmaker`] — the single pending-match slot and its timeout
//! - [`DisconnectMonitor`] — per-participant grace timers
//! - [`Game`], [`Participant`], [`GameStatus`] — the live entities
//! - [`Server`] — the WebSocket accept loop
//! - [`EngineConfig`] — timings and the scripted opponent's name

mod config;
mod engine;
mod error;
mod game;
mod matchmaker;
mod monitor;
mod server;

pub use config::EngineConfig;
pub use engine::{EngineHandle, spawn_engine};
pub use error::ServerError;
pub use game::{ClientHandle, ClientSender, ConnectionId, Game, GameStatus, Participant};
pub use matchmaker::{JoinOutcome, Matchmaker};
pub use monitor::DisconnectMonitor;
pub use server::Server;
