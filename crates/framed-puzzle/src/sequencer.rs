//! The ordered activation state machine.

use framed_config::PuzzleConfig;
use glam::Vec3;
use tracing::{debug, info};

use crate::events::{Hint, OrderViolation, PuzzleEvent};
use crate::station::{Station, StationId, StationStatus};

/// The gate at the end of the puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// Hidden and unusable.
    #[default]
    Locked,
    /// Visible and usable. Never reverts.
    Opened,
}

/// The station the player is currently closest to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Closest station with geometry.
    pub station: StationId,
    /// Distance to its nearest sub-mesh.
    pub distance: f32,
}

/// Errors constructing a [`Sequencer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    /// The required order is not a permutation of the station indices.
    #[error("required order {order:?} is not a permutation of {station_count} stations")]
    InvalidOrder {
        /// The rejected order.
        order: Vec<StationId>,
        /// Number of stations available.
        station_count: usize,
    },
}

/// Enforces the activation order over a fixed set of stations.
///
/// Invariants:
/// - only `order[required_index]` can go from inactive to active;
/// - `order[..required_index]` are all active, `order[required_index..]` are not;
/// - the gate opens when `required_index == order.len()` and stays open.
#[derive(Debug)]
pub struct Sequencer {
    stations: Vec<Station>,
    order: Vec<StationId>,
    required_index: usize,
    gate: GateState,
    /// Last measured distance per station.
    distances: Vec<Option<f32>>,
    closest: Option<Proximity>,
    /// Station whose range hint is currently shown.
    in_range: Option<StationId>,
    /// Remaining seconds of the wrong-order message.
    message_timer: Option<f64>,
    threshold: f32,
    message_secs: f64,
    ambient_boost: f32,
    directional_boost: f32,
    events: Vec<PuzzleEvent>,
}

impl Sequencer {
    /// Builds a sequencer over `stations` using the order and tuning in `config`.
    pub fn new(stations: Vec<Station>, config: &PuzzleConfig) -> Result<Self, PuzzleError> {
        let order = config.required_order.clone();
        if !is_permutation(&order, stations.len()) {
            return Err(PuzzleError::InvalidOrder {
                order,
                station_count: stations.len(),
            });
        }

        let distances = vec![None; stations.len()];
        let mut sequencer = Self {
            stations,
            order,
            required_index: 0,
            gate: GateState::Locked,
            distances,
            closest: None,
            in_range: None,
            message_timer: None,
            threshold: config.proximity_threshold,
            message_secs: config.wrong_order_message_ms as f64 / 1000.0,
            ambient_boost: config.ambient_boost,
            directional_boost: config.directional_boost,
            events: Vec::new(),
        };
        // Nothing to activate.
        if sequencer.order.is_empty() {
            sequencer.open_gate();
        }
        Ok(sequencer)
    }

    /// Number of stations.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// All stations, in index order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Position in the required order that must be activated next.
    pub fn required_index(&self) -> usize {
        self.required_index
    }

    /// The station that must be activated next, or `None` once complete.
    pub fn next_required(&self) -> Option<StationId> {
        self.order.get(self.required_index).copied()
    }

    /// Current gate state.
    pub fn gate(&self) -> GateState {
        self.gate
    }

    /// Whether every station is active.
    pub fn is_complete(&self) -> bool {
        self.gate == GateState::Opened
    }

    /// Closest station from the last [`update_proximity`](Self::update_proximity).
    pub fn closest(&self) -> Option<Proximity> {
        self.closest
    }

    /// Status of one station.
    pub fn status(&self, station: StationId) -> Option<StationStatus> {
        let s = self.stations.get(station)?;
        Some(if s.activated {
            StationStatus::Activated
        } else if self.next_required() == Some(station) {
            StationStatus::Eligible
        } else {
            StationStatus::Locked
        })
    }

    /// Recompute distances from the player to every station.
    ///
    /// Stations without geometry never count as closest. On equal distances
    /// the earlier station wins.
    pub fn update_proximity(&mut self, player: Vec3) {
        let mut closest: Option<Proximity> = None;
        for (id, station) in self.stations.iter().enumerate() {
            let distance = station.distance_to(player);
            self.distances[id] = distance;
            if let Some(d) = distance
                && closest.is_none_or(|c| d < c.distance)
            {
                closest = Some(Proximity {
                    station: id,
                    distance: d,
                });
            }
        }
        self.closest = closest;

        let now_in_range = closest
            .filter(|c| c.distance < self.threshold)
            .map(|c| c.station);
        if now_in_range != self.in_range {
            if let Some(old) = self.in_range {
                self.events.push(PuzzleEvent::LeftRange(old));
            }
            if let Some(new) = now_in_range {
                self.events.push(PuzzleEvent::EnteredRange(new));
            }
            self.in_range = now_in_range;
        }
    }

    /// Try to switch `station` on.
    ///
    /// Succeeds only for the next station in the required order, when the
    /// player was within the threshold of it at the last proximity update.
    /// Returns `Ok(true)` when this activation opened the gate.
    pub fn attempt_activate(&mut self, station: StationId) -> Result<bool, OrderViolation> {
        let result = self.check_activation(station);
        match result {
            Ok(()) => {
                self.stations[station].activated = true;
                self.required_index += 1;
                self.events.push(PuzzleEvent::BeamRevealed(station));
                info!(
                    "Station {} ({}) activated, {}/{}",
                    station,
                    self.stations[station].name,
                    self.required_index,
                    self.order.len()
                );

                if self.required_index == self.order.len() {
                    self.open_gate();
                    return Ok(true);
                }
                Ok(false)
            }
            Err(violation) => {
                debug!("Activation refused: {violation}");
                if violation.shows_message() {
                    self.message_timer = Some(self.message_secs);
                    self.events.push(PuzzleEvent::WrongOrder(violation));
                }
                Err(violation)
            }
        }
    }

    fn check_activation(&self, station: StationId) -> Result<(), OrderViolation> {
        let Some(target) = self.stations.get(station) else {
            return Err(OrderViolation::UnknownStation(station));
        };
        if target.activated {
            return Err(OrderViolation::AlreadyActivated(station));
        }
        // Not activated implies the puzzle is incomplete, so there is a next.
        let expected = self.order[self.required_index];
        if station != expected {
            return Err(OrderViolation::WrongOrder {
                expected,
                got: station,
            });
        }
        match self.distances[station] {
            Some(d) if d < self.threshold => Ok(()),
            distance => Err(OrderViolation::OutOfRange { station, distance }),
        }
    }

    /// Activate every remaining station and open the gate, bypassing the
    /// order and range checks. Used when a revisit skips the puzzle.
    pub fn force_complete(&mut self) {
        if self.is_complete() {
            return;
        }
        while let Some(station) = self.next_required() {
            self.stations[station].activated = true;
            self.required_index += 1;
            self.events.push(PuzzleEvent::BeamRevealed(station));
        }
        self.open_gate();
    }

    fn open_gate(&mut self) {
        if self.gate == GateState::Opened {
            return;
        }
        self.gate = GateState::Opened;
        self.events.push(PuzzleEvent::GateOpened);
        self.events.push(PuzzleEvent::LightsBoosted {
            ambient: self.ambient_boost,
            directional: self.directional_boost,
        });
        info!("All {} stations active, gate opened", self.order.len());
    }

    /// Step through the gate. Only works once it is open.
    pub fn attempt_use_gate(&mut self) -> bool {
        if self.gate != GateState::Opened {
            debug!("Gate used while locked");
            return false;
        }
        self.events.push(PuzzleEvent::GateUsed);
        true
    }

    /// Advance timers by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        if let Some(remaining) = self.message_timer.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.message_timer = None;
                self.events.push(PuzzleEvent::MessageCleared);
            }
        }
    }

    /// What the hint line should show.
    pub fn hint(&self) -> Hint {
        if let Some(remaining_secs) = self.message_timer {
            return Hint::WrongOrder { remaining_secs };
        }
        match self.in_range {
            Some(station) => Hint::InRange { station },
            None => Hint::None,
        }
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }
}

fn is_permutation(order: &[StationId], station_count: usize) -> bool {
    if order.len() != station_count {
        return false;
    }
    let mut seen = vec![false; station_count];
    order.iter().all(|&s| match seen.get_mut(s) {
        Some(slot) if !*slot => {
            *slot = true;
            true
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXACT_DT: f64 = 1.0 / 64.0;

    /// Five antennas one unit apart along X, ten units from each other.
    fn antennas() -> Vec<Station> {
        (0..5)
            .map(|i| Station::new(format!("antenna_{i}"), vec![Vec3::new(i as f32 * 10.0, 0.0, 0.0)]))
            .collect()
    }

    fn at_station(i: usize) -> Vec3 {
        Vec3::new(i as f32 * 10.0, 0.0, 1.0)
    }

    fn sequencer() -> Sequencer {
        Sequencer::new(antennas(), &PuzzleConfig::default()).unwrap()
    }

    fn activate_near(seq: &mut Sequencer, i: usize) -> Result<bool, OrderViolation> {
        seq.update_proximity(at_station(i));
        seq.attempt_activate(i)
    }

    #[test]
    fn test_rejects_order_that_is_not_a_permutation() {
        let mut config = PuzzleConfig::default();
        config.required_order = vec![0, 1, 2, 3];
        assert!(matches!(
            Sequencer::new(antennas(), &config),
            Err(PuzzleError::InvalidOrder { station_count: 5, .. })
        ));
        config.required_order = vec![0, 1, 2, 3, 3];
        assert!(Sequencer::new(antennas(), &config).is_err());
    }

    #[test]
    fn test_empty_order_starts_with_gate_open() {
        let mut config = PuzzleConfig::default();
        config.required_order = vec![];
        let mut seq = Sequencer::new(vec![], &config).unwrap();
        assert_eq!(seq.required_index(), 0);
        assert_eq!(seq.next_required(), None);
        assert_eq!(seq.gate(), GateState::Opened);
        assert_eq!(
            seq.drain_events(),
            vec![
                PuzzleEvent::GateOpened,
                PuzzleEvent::LightsBoosted {
                    ambient: config.ambient_boost,
                    directional: config.directional_boost,
                },
            ]
        );
        assert!(seq.attempt_use_gate());
    }

    #[test]
    fn test_closest_station_and_distance() {
        let mut seq = sequencer();
        seq.update_proximity(Vec3::new(21.0, 0.0, 0.0));
        let closest = seq.closest().unwrap();
        assert_eq!(closest.station, 2);
        assert!((closest.distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_equidistant_tie_goes_to_first_station() {
        let mut seq = sequencer();
        seq.update_proximity(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(seq.closest().unwrap().station, 0);
    }

    #[test]
    fn test_station_without_geometry_is_never_closest() {
        let mut stations = antennas();
        stations[0].meshes.clear();
        let mut seq = Sequencer::new(stations, &PuzzleConfig::default()).unwrap();
        seq.update_proximity(Vec3::ZERO);
        assert_eq!(seq.closest().unwrap().station, 1);

        // And it cannot be activated, so the puzzle stalls on it.
        assert!(matches!(
            seq.attempt_activate(0),
            Err(OrderViolation::OutOfRange {
                station: 0,
                distance: None
            })
        ));
    }

    #[test]
    fn test_no_stations_with_geometry_means_no_closest() {
        let stations = vec![Station::new("antenna_0", vec![])];
        let mut config = PuzzleConfig::default();
        config.required_order = vec![0];
        let mut seq = Sequencer::new(stations, &config).unwrap();
        seq.update_proximity(Vec3::ZERO);
        assert_eq!(seq.closest(), None);
        assert_eq!(seq.hint(), Hint::None);
    }

    #[test]
    fn test_range_events_fire_on_change_only() {
        let mut seq = sequencer();
        seq.update_proximity(at_station(0));
        seq.update_proximity(at_station(0));
        seq.update_proximity(at_station(1));
        seq.update_proximity(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(
            seq.drain_events(),
            vec![
                PuzzleEvent::EnteredRange(0),
                PuzzleEvent::LeftRange(0),
                PuzzleEvent::EnteredRange(1),
                PuzzleEvent::LeftRange(1),
            ]
        );
    }

    #[test]
    fn test_wrong_station_rejected_and_message_clears_after_three_seconds() {
        let mut seq = sequencer();
        let err = activate_near(&mut seq, 2).unwrap_err();
        assert_eq!(err, OrderViolation::WrongOrder { expected: 0, got: 2 });
        assert_eq!(seq.required_index(), 0);
        assert!(!seq.stations()[2].is_activated());
        assert!(matches!(seq.hint(), Hint::WrongOrder { .. }));

        // 1/64 s steps sum exactly: 191 ticks leave one step, the 192nd clears.
        for _ in 0..191 {
            seq.tick(EXACT_DT);
        }
        assert_eq!(
            seq.hint(),
            Hint::WrongOrder {
                remaining_secs: EXACT_DT
            }
        );

        seq.tick(EXACT_DT);
        assert_eq!(seq.hint(), Hint::InRange { station: 2 });
        let events = seq.drain_events();
        assert_eq!(events.last(), Some(&PuzzleEvent::MessageCleared));

        assert_eq!(activate_near(&mut seq, 0), Ok(false));
        assert_eq!(seq.required_index(), 1);
    }

    #[test]
    fn test_required_station_out_of_range_rejected() {
        let mut seq = sequencer();
        seq.update_proximity(Vec3::new(0.0, 0.0, 1.6));
        let err = seq.attempt_activate(0).unwrap_err();
        assert!(matches!(err, OrderViolation::OutOfRange { station: 0, .. }));
        assert_eq!(seq.required_index(), 0);
        assert!(matches!(seq.hint(), Hint::WrongOrder { .. }));
    }

    #[test]
    fn test_out_of_order_click_rejected_even_when_required_also_in_range() {
        let mut stations = antennas();
        stations[1].meshes = vec![Vec3::new(1.0, 0.0, 0.0)];
        let mut seq = Sequencer::new(stations, &PuzzleConfig::default()).unwrap();
        seq.update_proximity(Vec3::new(0.5, 0.0, 0.0));

        assert!(matches!(
            seq.attempt_activate(1),
            Err(OrderViolation::WrongOrder { expected: 0, got: 1 })
        ));
        assert_eq!(seq.attempt_activate(0), Ok(false));
        assert_eq!(seq.attempt_activate(1), Ok(false));
    }

    #[test]
    fn test_reactivation_is_refused_without_message() {
        let mut seq = sequencer();
        activate_near(&mut seq, 0).unwrap();
        seq.drain_events();
        assert_eq!(
            seq.attempt_activate(0),
            Err(OrderViolation::AlreadyActivated(0))
        );
        assert_eq!(seq.hint(), Hint::InRange { station: 0 });
        assert!(seq.drain_events().is_empty());
        assert_eq!(seq.required_index(), 1);
    }

    #[test]
    fn test_unknown_station() {
        let mut seq = sequencer();
        assert_eq!(
            seq.attempt_activate(9),
            Err(OrderViolation::UnknownStation(9))
        );
    }

    #[test]
    fn test_gate_opens_exactly_after_last_activation() {
        let mut seq = sequencer();
        for i in 0..4 {
            assert_eq!(activate_near(&mut seq, i), Ok(false));
            assert_eq!(seq.gate(), GateState::Locked);
            assert!(!seq.attempt_use_gate());
        }
        assert_eq!(activate_near(&mut seq, 4), Ok(true));
        assert_eq!(seq.gate(), GateState::Opened);
        assert_eq!(seq.next_required(), None);

        let events = seq.drain_events();
        let opened = events
            .iter()
            .filter(|e| **e == PuzzleEvent::GateOpened)
            .count();
        assert_eq!(opened, 1);
        assert!(events.contains(&PuzzleEvent::LightsBoosted {
            ambient: 1.0,
            directional: 2.0
        }));

        // Further clicks never close it again.
        let _ = activate_near(&mut seq, 2);
        assert_eq!(seq.gate(), GateState::Opened);
    }

    #[test]
    fn test_custom_order() {
        let mut config = PuzzleConfig::default();
        config.required_order = vec![4, 2, 0, 1, 3];
        let mut seq = Sequencer::new(antennas(), &config).unwrap();

        assert_eq!(seq.status(4), Some(StationStatus::Eligible));
        assert_eq!(seq.status(0), Some(StationStatus::Locked));
        assert!(activate_near(&mut seq, 0).is_err());
        for i in [4, 2, 0, 1] {
            assert_eq!(activate_near(&mut seq, i), Ok(false));
        }
        assert_eq!(seq.status(4), Some(StationStatus::Activated));
        assert_eq!(activate_near(&mut seq, 3), Ok(true));
    }

    #[test]
    fn test_every_refusal_leaves_order_state_untouched() {
        // Try every station at every step; only the required one may move the index.
        let mut seq = sequencer();
        for step in 0..5 {
            for i in 0..5 {
                if i == step {
                    continue;
                }
                let before: Vec<bool> = seq.stations().iter().map(|s| s.is_activated()).collect();
                assert!(activate_near(&mut seq, i).is_err());
                let after: Vec<bool> = seq.stations().iter().map(|s| s.is_activated()).collect();
                assert_eq!(before, after);
                assert_eq!(seq.required_index(), step);
            }
            assert!(activate_near(&mut seq, step).is_ok());
        }
        assert!(seq.is_complete());
    }

    #[test]
    fn test_use_gate_emits_event() {
        let mut seq = sequencer();
        seq.force_complete();
        seq.drain_events();
        assert!(seq.attempt_use_gate());
        assert_eq!(seq.drain_events(), vec![PuzzleEvent::GateUsed]);
    }

    #[test]
    fn test_force_complete_reveals_all_beams_once() {
        let mut seq = sequencer();
        activate_near(&mut seq, 0).unwrap();
        seq.drain_events();
        seq.force_complete();
        seq.force_complete();
        let events = seq.drain_events();
        let beams: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PuzzleEvent::BeamRevealed(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(beams, vec![1, 2, 3, 4]);
        assert!(seq.is_complete());
    }
}
