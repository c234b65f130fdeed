//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and simulation logic.
//! It has no dependencies on rendering, input devices, clocks or I/O, making it:
//!
//! - **Deterministic**: Same seed and intents produce identical games
//! - **Testable**: Independent sessions can run side by side
//! - **Portable**: Can run in any environment (terminal, GUI, headless)
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with cell locking and line clearing
//! - [`pieces`]: shape catalog for the seven tetrominoes and the wall-kick table
//! - [`piece`]: the falling piece and its absolute cells
//! - [`resolver`]: collision checks and wall kicks for every proposed move
//! - [`game`]: the game loop state machine (gravity, intents, locking, scoring)
//! - [`rng`]: 7-bag piece source behind a swappable trait
//! - [`scoring`]: line-clear points, levels and gravity speed
//! - [`snapshot`]: read-only state for renderers
//!
//! # Example
//!
//! ```
//! use blockfall_core::GameState;
//! use blockfall_types::Intent;
//!
//! let mut game = GameState::new(12345);
//!
//! game.advance(1, &[Intent::MoveRight, Intent::RotateCw, Intent::HardDrop]);
//!
//! let snap = game.snapshot();
//! assert_eq!(snap.board.iter().flatten().filter(|&&c| c != 0).count(), 4);
//! assert_eq!(snap.score, 0);
//! ```
//!
//! # Timing
//!
//! The caller owns the clock. Each [`GameState::advance`](game::GameState::advance)
//! call carries a tick count and an ordered batch of intents; gravity takes
//! one step whenever its per-level tick interval runs out.

pub mod board;
pub mod game;
pub mod piece;
pub mod pieces;
pub mod resolver;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use game::{AdvanceReport, GameConfig, GameState, Phase, Step};
pub use piece::{occupied_cells, ActivePiece};
pub use pieces::{cells_for, get_shape, KICK_OFFSETS};
pub use resolver::{try_apply, Rejected};
pub use rng::{BagRandomizer, FixedSequence, PieceSource, SimpleRng};
pub use scoring::{calculate_line_score, gravity_interval_ticks};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
