//! Sequencer output: events, hints and rejection reasons.

use crate::station::StationId;

/// Why an activation attempt was refused.
///
/// This is player feedback, not a program error: the sequencer's state is
/// unchanged after a refusal.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OrderViolation {
    /// Another station must be activated first.
    #[error("station {got} activated out of order, station {expected} is next")]
    WrongOrder {
        /// Station the order requires now.
        expected: StationId,
        /// Station the player tried.
        got: StationId,
    },

    /// The right station, but the player is too far away.
    #[error("station {station} is out of range")]
    OutOfRange {
        /// Station the player tried.
        station: StationId,
        /// Last measured distance, `None` when the station has no geometry.
        distance: Option<f32>,
    },

    /// The station is already on.
    #[error("station {0} is already active")]
    AlreadyActivated(StationId),

    /// No station with that index.
    #[error("no station {0}")]
    UnknownStation(StationId),
}

impl OrderViolation {
    /// Whether this refusal shows the timed "wrong order" message.
    pub fn shows_message(&self) -> bool {
        matches!(
            self,
            OrderViolation::WrongOrder { .. } | OrderViolation::OutOfRange { .. }
        )
    }
}

/// Something the owning scene should reflect in the world.
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleEvent {
    /// The closest station came within the proximity threshold.
    EnteredRange(StationId),
    /// The player walked away from the station that was in range.
    LeftRange(StationId),
    /// A station activated; show its beam.
    BeamRevealed(StationId),
    /// An attempt was refused with a visible message.
    WrongOrder(OrderViolation),
    /// The wrong-order message timed out.
    MessageCleared,
    /// Every station is active.
    GateOpened,
    /// Light intensities to apply now that the gate is open.
    LightsBoosted {
        /// Ambient light intensity.
        ambient: f32,
        /// Directional light intensity.
        directional: f32,
    },
    /// The player stepped through the open gate.
    GateUsed,
}

/// What the HUD hint line should show this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hint {
    /// Nothing in range.
    None,
    /// A station is within the proximity threshold.
    InRange {
        /// The closest station.
        station: StationId,
    },
    /// A wrong-order message is on screen and suppresses the range hint.
    WrongOrder {
        /// Seconds until the message clears.
        remaining_secs: f64,
    },
}
