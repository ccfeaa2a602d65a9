//! Ordered activation puzzle: the Mars antennas and their gate.
//!
//! A [`Sequencer`] owns a fixed list of [`Station`]s and the order in which
//! they must be switched on. It tracks which station the player is closest
//! to, accepts or rejects activation attempts, and opens the gate once the
//! last station in the order is active. It never touches the engine: every
//! visible consequence is emitted as a [`PuzzleEvent`] for the owning scene
//! to apply.

mod events;
mod sequencer;
mod station;

pub use events::{Hint, OrderViolation, PuzzleEvent};
pub use sequencer::{GateState, Proximity, PuzzleError, Sequencer};
pub use station::{Station, StationId, StationStatus};
