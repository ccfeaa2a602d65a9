use std::collections::BTreeMap;

use framed_config::Config;
use framed_engine::{Engine, SceneAssets, SceneState, SoundOptions, Vec3};
use framed_flow::{GameScene, Input, SceneError, SceneInit, SceneRequest};
use tracing::{debug, info, warn};

use super::require;
use crate::content::{
    BOOK, DOOR_PREFIX, GLASSES, LIGHT_PREFIX, PAINTING, SPAWN_BEDROOM, SPAWN_PAINTING,
    SWITCH_PREFIX,
};

pub const WAKE_MESSAGE: &str = "You wake up in your bedroom. Your head still hums.";
pub const RETURN_MESSAGE: &str = "You are back home. Something new lies on the desk.";
pub const GLASSES_MESSAGE: &str = "You put on the old glasses. The painting looks... different.";
pub const PAINTING_PLAIN: &str = "Just an old painting of a red desert.";
pub const PAINTING_PULL: &str = "The red desert pulls you in...";
pub const PAINTING_AFTER: &str = "Only paint and canvas now. But you remember the wind.";
pub const JOURNAL_TEXT: &str =
    "Journal: \"Five towers. I heard them sing, one after another, and the gate let me go.\"";

const AMBIENCE: &str = "house_ambience";
const DOOR_OPEN: &str = "door_open";
const DOOR_CLOSE: &str = "door_close";
const SWITCH_CLICK: &str = "switch_click";
const PICKUP: &str = "pickup";

const LIGHT_ON: f32 = 1.0;
const LIGHT_OFF: f32 = 0.0;

const DEFAULT_BEDROOM: Vec3 = Vec3::new(0.0, 1.7, 1.0);
const DEFAULT_PAINTING_SPOT: Vec3 = Vec3::new(8.0, 1.7, 2.0);

struct LightSwitch {
    light: String,
    on: bool,
}

/// The house. Doors, light switches, the glasses, the painting that leads
/// to Mars and the journal that appears after coming back.
pub struct HouseScene {
    init: SceneInit,
    doors: BTreeMap<String, bool>,
    switches: BTreeMap<String, LightSwitch>,
    camera: (Vec3, Vec3),
    has_glasses_object: bool,
    has_painting: bool,
    has_book: bool,
    wearing_glasses: bool,
    book_taken: bool,
    book_fade_secs: f64,
    shortcut_key: String,
    sfx_volume: f32,
    music_volume: f32,
    requests: Vec<SceneRequest>,
}

impl HouseScene {
    /// Build the house from its loaded assets.
    pub fn build(
        assets: &SceneAssets,
        init: SceneInit,
        config: &Config,
    ) -> Result<Self, SceneError> {
        let scene = SceneState::MainScene;
        let strict = config.debug.strict_world_objects;

        let has_painting = require(assets, scene, PAINTING, strict)?.is_some();
        let has_glasses_object = require(assets, scene, GLASSES, strict)?.is_some();
        let has_book = require(assets, scene, BOOK, strict)?.is_some();

        let doors: BTreeMap<String, bool> = assets
            .objects_with_prefix(DOOR_PREFIX)
            .map(|door| (door.name.clone(), false))
            .collect();
        if doors.is_empty() {
            warn!("House has no doors");
        }

        let mut switches = BTreeMap::new();
        for switch in assets.objects_with_prefix(SWITCH_PREFIX) {
            let Some(room) = switch.name.strip_prefix(SWITCH_PREFIX) else {
                continue;
            };
            let light = format!("{LIGHT_PREFIX}{room}");
            if require(assets, scene, &light, strict)?.is_none() {
                continue;
            }
            switches.insert(switch.name.clone(), LightSwitch { light, on: true });
        }

        let spawn_name = if init.mars_visited {
            SPAWN_PAINTING
        } else {
            SPAWN_BEDROOM
        };
        let fallback = if init.mars_visited {
            DEFAULT_PAINTING_SPOT
        } else {
            DEFAULT_BEDROOM
        };
        let position = match assets.object(spawn_name).and_then(|o| o.meshes.first()) {
            Some(&p) => p,
            None => {
                debug!("No `{spawn_name}` marker, using the default spawn point");
                fallback
            }
        };
        let look_at = assets
            .object(PAINTING)
            .and_then(|o| o.meshes.first().copied())
            .filter(|_| init.mars_visited)
            .unwrap_or(position + Vec3::new(0.0, 0.0, -1.0));

        let audio = &config.audio;
        Ok(Self {
            init,
            doors,
            switches,
            camera: (position, look_at),
            has_glasses_object,
            has_painting,
            has_book,
            // The glasses came back from Mars on the player's nose.
            wearing_glasses: init.mars_visited,
            book_taken: false,
            book_fade_secs: config.house.book_fade_ms as f64 / 1000.0,
            shortcut_key: config.house.mars_shortcut_key.clone(),
            sfx_volume: audio.master_volume * audio.sfx_volume,
            music_volume: audio.master_volume * audio.music_volume,
            requests: Vec::new(),
        })
    }

    /// Whether the player has put the glasses on.
    pub fn is_wearing_glasses(&self) -> bool {
        self.wearing_glasses
    }

    /// Whether door `name` is open.
    pub fn is_door_open(&self, name: &str) -> Option<bool> {
        self.doors.get(name).copied()
    }

    fn toggle_door(&mut self, name: &str, engine: &mut dyn Engine) -> bool {
        let Some(open) = self.doors.get_mut(name) else {
            return false;
        };
        *open = !*open;
        let clip = if *open { DOOR_OPEN } else { DOOR_CLOSE };
        engine.play_sound(clip, SoundOptions::once(self.sfx_volume));
        debug!("Door {name} {}", if *open { "opened" } else { "closed" });
        true
    }

    fn toggle_switch(&mut self, name: &str, engine: &mut dyn Engine) -> bool {
        let Some(switch) = self.switches.get_mut(name) else {
            return false;
        };
        switch.on = !switch.on;
        let intensity = if switch.on { LIGHT_ON } else { LIGHT_OFF };
        engine.set_light_intensity(&switch.light, intensity);
        engine.play_sound(SWITCH_CLICK, SoundOptions::once(self.sfx_volume));
        true
    }

    fn pick_up_glasses(&mut self, engine: &mut dyn Engine) {
        if self.wearing_glasses || !self.has_glasses_object {
            return;
        }
        self.wearing_glasses = true;
        engine.set_visible(GLASSES, false);
        engine.play_sound(PICKUP, SoundOptions::once(self.sfx_volume));
        engine.display_message(GLASSES_MESSAGE);
        info!("Glasses picked up");
    }

    fn look_at_painting(&mut self, engine: &mut dyn Engine) {
        if !self.has_painting {
            return;
        }
        if self.init.mars_visited {
            engine.display_message(PAINTING_AFTER);
        } else if self.wearing_glasses {
            engine.display_message(PAINTING_PULL);
            self.requests.push(SceneRequest::Goto(SceneState::MarsScene));
        } else {
            engine.display_message(PAINTING_PLAIN);
        }
    }

    fn pick_up_book(&mut self, engine: &mut dyn Engine) {
        if !self.has_book || !self.init.mars_visited || self.book_taken {
            return;
        }
        self.book_taken = true;
        engine.set_visible(BOOK, false);
        engine.play_sound(PICKUP, SoundOptions::once(self.sfx_volume));
        engine.display_message(JOURNAL_TEXT);
        info!("Journal picked up");
    }
}

impl GameScene for HouseScene {
    fn id(&self) -> SceneState {
        SceneState::MainScene
    }

    fn enter(&mut self, engine: &mut dyn Engine) {
        let (position, target) = self.camera;
        engine.set_camera(position, target);
        engine.play_sound(AMBIENCE, SoundOptions::looped(self.music_volume));

        for switch in self.switches.values() {
            engine.set_light_intensity(&switch.light, LIGHT_ON);
        }
        if self.has_glasses_object {
            engine.set_visible(GLASSES, !self.wearing_glasses);
        }
        if self.has_book {
            engine.set_visible(BOOK, false);
            if self.init.mars_visited {
                engine.fade_in(BOOK, self.book_fade_secs);
            }
        }

        engine.display_message(if self.init.mars_visited {
            RETURN_MESSAGE
        } else {
            WAKE_MESSAGE
        });
    }

    fn tick(&mut self, _dt: f64, _engine: &mut dyn Engine) {}

    fn handle_input(&mut self, input: &Input, engine: &mut dyn Engine) {
        match input {
            Input::Key(code) if *code == self.shortcut_key => {
                debug!("Mars shortcut pressed");
                self.requests.push(SceneRequest::Goto(SceneState::MarsScene));
            }
            Input::Key(_) => {}
            Input::Interact(object) => match object.as_str() {
                GLASSES => self.pick_up_glasses(engine),
                PAINTING => self.look_at_painting(engine),
                BOOK => self.pick_up_book(engine),
                other => {
                    if !self.toggle_door(other, engine) && !self.toggle_switch(other, engine) {
                        debug!("Nothing to do with `{other}` in the house");
                    }
                }
            },
        }
    }

    fn drain_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.requests)
    }

    fn dispose(&mut self, engine: &mut dyn Engine) {
        engine.stop_sound(AMBIENCE);
    }
}
