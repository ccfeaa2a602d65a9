use framed_config::{Config, PuzzleRevisit};
use framed_engine::{Engine, SceneAssets, SceneState, SoundOptions};
use framed_flow::{GameScene, Input, SceneError, SceneInit, SceneRequest};
use framed_puzzle::{GateState, Hint, OrderViolation, PuzzleEvent, Sequencer, Station};
use tracing::{debug, info, warn};

use super::require;
use crate::content::{
    AMBIENT_LIGHT, ANTENNA_PREFIX, GATE, SUN_LIGHT, antenna_index, antenna_name,
};

pub const ARRIVAL_MESSAGE: &str = "A red horizon. The antennas stand silent.";
pub const WRONG_ORDER_MESSAGE: &str = "The antenna stays silent. Another one must sing first.";
pub const OUT_OF_RANGE_MESSAGE: &str = "You are too far away to reach it.";
pub const GATE_OPEN_MESSAGE: &str = "The gate is open.";

const WIND: &str = "mars_wind";
const HUM: &str = "antenna_hum";
const ANTENNA_ON: &str = "antenna_on";
const ERROR_BUZZ: &str = "error_buzz";
const GATE_OPENING: &str = "gate_open";

const AMBIENT_BASE: f32 = 0.3;
const SUN_BASE: f32 = 0.6;

/// Hint line for a station in range.
pub fn station_hint(station: usize, activated: bool) -> String {
    if activated {
        format!("Antenna {} hums with energy.", station + 1)
    } else {
        format!("Click to activate antenna {}.", station + 1)
    }
}

/// The Mars level: the antenna puzzle and the gate home.
pub struct MarsScene {
    sequencer: Sequencer,
    music_volume: f32,
    sfx_volume: f32,
    last_violation: Option<OrderViolation>,
    shown: Option<String>,
    requests: Vec<SceneRequest>,
}

impl MarsScene {
    /// Build the level and its sequencer from the loaded assets.
    ///
    /// Antennas are matched to stations by their index suffix. A missing
    /// antenna becomes a station with no geometry, which can never be
    /// reached.
    pub fn build(
        assets: &SceneAssets,
        init: SceneInit,
        config: &Config,
    ) -> Result<Self, SceneError> {
        let scene = SceneState::MarsScene;
        let strict = config.debug.strict_world_objects;
        let station_count = config.puzzle.required_order.len();

        let mut stations = Vec::with_capacity(station_count);
        for index in 0..station_count {
            let name = antenna_name(index);
            let meshes = require(assets, scene, &name, strict)?
                .map(|antenna| antenna.meshes.clone())
                .unwrap_or_default();
            if meshes.is_empty() {
                warn!("Antenna {name} has no meshes and can never be reached");
            }
            stations.push(Station::new(name, meshes));
        }
        for extra in assets.objects_with_prefix(ANTENNA_PREFIX) {
            if antenna_index(&extra.name).is_none_or(|i| i >= station_count) {
                warn!("Ignoring unexpected antenna `{}`", extra.name);
            }
        }
        require(assets, scene, GATE, strict)?;

        let mut sequencer =
            Sequencer::new(stations, &config.puzzle).map_err(|e| SceneError::Invalid {
                scene,
                reason: e.to_string(),
            })?;

        if init.mars_entries > 0 && config.puzzle.revisit == PuzzleRevisit::Skip {
            info!("Returning to Mars, the antennas are already singing");
            sequencer.force_complete();
        }

        let audio = &config.audio;
        Ok(Self {
            sequencer,
            music_volume: audio.master_volume * audio.music_volume,
            sfx_volume: audio.master_volume * audio.sfx_volume,
            last_violation: None,
            shown: None,
            requests: Vec::new(),
        })
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    fn apply_events(&mut self, engine: &mut dyn Engine) {
        for event in self.sequencer.drain_events() {
            match event {
                PuzzleEvent::EnteredRange(station) => {
                    debug!("In range of antenna {station}");
                    engine.play_sound(HUM, SoundOptions::looped(self.sfx_volume));
                }
                PuzzleEvent::LeftRange(_) => engine.stop_sound(HUM),
                PuzzleEvent::BeamRevealed(station) => {
                    let beam = self.sequencer.stations()[station].beam_name();
                    engine.set_visible(&beam, true);
                    engine.play_sound(ANTENNA_ON, SoundOptions::once(self.sfx_volume));
                }
                PuzzleEvent::WrongOrder(violation) => {
                    self.last_violation = Some(violation);
                    engine.play_sound(ERROR_BUZZ, SoundOptions::once(self.sfx_volume));
                }
                PuzzleEvent::MessageCleared => self.last_violation = None,
                PuzzleEvent::GateOpened => {
                    engine.set_visible(GATE, true);
                    engine.play_sound(GATE_OPENING, SoundOptions::once(self.sfx_volume));
                }
                PuzzleEvent::LightsBoosted {
                    ambient,
                    directional,
                } => {
                    engine.set_light_intensity(AMBIENT_LIGHT, ambient);
                    engine.set_light_intensity(SUN_LIGHT, directional);
                }
                PuzzleEvent::GateUsed => {
                    info!("Stepping through the gate");
                    self.requests.push(SceneRequest::Goto(SceneState::MainScene));
                }
            }
        }
    }

    fn hint_text(&self) -> Option<String> {
        match self.sequencer.hint() {
            Hint::WrongOrder { .. } => Some(
                match self.last_violation {
                    Some(OrderViolation::OutOfRange { .. }) => OUT_OF_RANGE_MESSAGE,
                    _ => WRONG_ORDER_MESSAGE,
                }
                .to_string(),
            ),
            Hint::InRange { station } => {
                let activated = self.sequencer.stations()[station].is_activated();
                Some(station_hint(station, activated))
            }
            Hint::None if self.sequencer.gate() == GateState::Opened => {
                Some(GATE_OPEN_MESSAGE.to_string())
            }
            Hint::None => None,
        }
    }

    /// Push the hint line to the HUD when it changes.
    fn render_hint(&mut self, engine: &mut dyn Engine) {
        let wanted = self.hint_text();
        if wanted == self.shown {
            return;
        }
        match &wanted {
            Some(text) => engine.display_message(text),
            None => engine.clear_message(),
        }
        self.shown = wanted;
    }
}

impl GameScene for MarsScene {
    fn id(&self) -> SceneState {
        SceneState::MarsScene
    }

    fn enter(&mut self, engine: &mut dyn Engine) {
        engine.play_sound(WIND, SoundOptions::looped(self.music_volume));
        engine.set_visible(GATE, false);
        for station in self.sequencer.stations() {
            engine.set_visible(&station.beam_name(), false);
        }
        engine.set_light_intensity(AMBIENT_LIGHT, AMBIENT_BASE);
        engine.set_light_intensity(SUN_LIGHT, SUN_BASE);
        engine.display_message(ARRIVAL_MESSAGE);

        // A skipped puzzle has its beams and gate waiting already.
        self.apply_events(engine);
    }

    fn tick(&mut self, dt: f64, engine: &mut dyn Engine) {
        self.sequencer.update_proximity(engine.player_position());
        self.sequencer.tick(dt);
        self.apply_events(engine);
        self.render_hint(engine);
    }

    fn handle_input(&mut self, input: &Input, engine: &mut dyn Engine) {
        let Input::Interact(object) = input else {
            return;
        };
        if object == GATE {
            self.sequencer.attempt_use_gate();
        } else if let Some(station) = antenna_index(object) {
            match self.sequencer.attempt_activate(station) {
                Ok(true) => info!("Last antenna activated"),
                Ok(false) => {}
                Err(violation) => debug!("Antenna {station} refused: {violation}"),
            }
        } else {
            return;
        }
        self.apply_events(engine);
        self.render_hint(engine);
    }

    fn drain_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.requests)
    }

    fn dispose(&mut self, engine: &mut dyn Engine) {
        engine.stop_sound(HUM);
        engine.stop_sound(WIND);
    }
}
