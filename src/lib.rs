#![warn(missing_docs)]

//! # `circuitry`
//!
//! Board model, connectivity check and solver for circuit puzzles in which the player turns pieces on a grid
//! until power flows from every source to every target.
//! Begin by building a board with a [`BoardBuilder`] or generating one with [`generator::generate`],
//! then [`rotate`](Board::rotate) pieces and ask for its [`connectivity`](Board::connectivity).
//! [`GameSession`] wraps a board with levels, scoring, achievements and persistence.
//!
//! # Pieces
//! A [`Straight`](PieceKind::Straight) is open on two opposite sides, a [`Corner`](PieceKind::Corner) on two adjacent ones.
//! [`Cross`](PieceKind::Cross)es, [`Source`](PieceKind::Source)s and [`Target`](PieceKind::Target)s are open on all four sides,
//! [`Blocker`](PieceKind::Blocker)s and empty cells on none.
//! Sources and targets never turn.
//!
//! # Internals
//! Two adjacent cells are linked when each is open towards the other, and the board's links form an undirected graph.
//! Power is whatever a breadth first search seeded with every source at once can reach; the board is solved when that includes every target.
//!
//! Whether *some* way of turning the pieces solves a board is a harder question.
//! [`RotationSolver`] expresses it as a Boolean satisfiability problem: a variable per orientation of each turnable piece,
//! a variable per possible link, and layered reachability variables stating that power arrives at a cell within a given number of steps
//! only if it had already arrived there or at a linked neighbour one step earlier.
//! Targets must be reached by the last layer.

pub use board::Board;
pub use builder::{BoardBuilder, BuilderInvalidReason};
pub use cell::{Cell, PieceKind};
pub use connectivity::Connectivity;
pub use error::{ConfigurationError, ImportFormatError, InvalidOperation, PersistenceError};
pub use level::{Difficulty, LevelParams, MAX_LEVEL};
pub use location::{Dimension, Location};
pub use progress::{Achievement, AchievementEntry, Achievements, GameStats, Settings};
pub use session::{GameSession, LevelReport, RotateOutcome};
pub use shape::{Direction, Rotation};
pub use solver::{RotationSolver, Solution, SolverFailure};
pub use transfer::SaveBundle;

pub(crate) mod board;
mod tests;
pub(crate) mod builder;
pub(crate) mod cell;
pub mod connectivity;
pub(crate) mod error;
pub mod generator;
pub(crate) mod level;
pub(crate) mod location;
pub(crate) mod logic;
pub(crate) mod progress;
pub(crate) mod session;
pub(crate) mod shape;
pub(crate) mod solver;
pub mod storage;
pub(crate) mod transfer;
#[cfg(feature = "wasm")]
pub mod wasm;
