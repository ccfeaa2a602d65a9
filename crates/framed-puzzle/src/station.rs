//! Puzzle stations (antennas).

use glam::Vec3;

/// Index of a station in the sequencer's station list.
pub type StationId = usize;

/// Where a station stands relative to the required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationStatus {
    /// Not its turn yet.
    Locked,
    /// Next in the required order.
    Eligible,
    /// Switched on. Terminal.
    Activated,
}

/// One activatable target with its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Scene object name, e.g. `antenna_3`.
    pub name: String,
    /// World-space positions of the station's sub-meshes.
    pub meshes: Vec<Vec3>,
    pub(crate) activated: bool,
}

impl Station {
    /// Creates an inactive station.
    pub fn new(name: impl Into<String>, meshes: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            meshes,
            activated: false,
        }
    }

    /// Whether the station has been switched on.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Name of the beam effect revealed when this station activates.
    pub fn beam_name(&self) -> String {
        format!("{}_beam", self.name)
    }

    /// Shortest distance from `point` to any sub-mesh, or `None` when the
    /// station has no geometry.
    pub fn distance_to(&self, point: Vec3) -> Option<f32> {
        self.meshes
            .iter()
            .map(|mesh| mesh.distance(point))
            .fold(None, |best, d| match best {
                Some(b) if b <= d => Some(b),
                _ => Some(d),
            })
    }
}
