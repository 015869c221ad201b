//! Board rules for Fourline.
//!
//! This crate is the pure core of the game: the board, the legal-move and
//! win/draw checks, and the scripted-opponent heuristic. It performs no I/O
//! and holds no state beyond the board passed in, which is what lets the
//! session layer simulate moves freely on copies.
//!
//! # Key types
//!
//! - [`Board`] — the 6×7 grid with gravity-aware piece drops
//! - [`PlayerId`] — identity of a piece owner
//! - [`RulesError`] — rejected moves (`InvalidColumn`, `ColumnFull`)
//! - [`select_move`] — the scripted opponent's column choice

mod board;
mod bot;
mod error;
mod player;

pub use board::{Board, COLS, ROWS};
pub use bot::select_move;
pub use error::RulesError;
pub use player::PlayerId;
