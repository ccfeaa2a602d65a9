use framed_config::Config;
use framed_engine::{Engine, SceneState, SoundOptions};
use framed_flow::{GameScene, Input, SceneRequest};
use tracing::debug;

use crate::content::{NEXT_BUTTON, WAKE_UP_BUTTON};

/// Lines of the opening dream, shown one at a time.
pub const DIALOGUE: [&str; 4] = [
    "You are drifting through a red sky.",
    "Five silent towers stand on the horizon below you.",
    "Somewhere, a gate waits for them to sing in the right order.",
    "A familiar ceiling fades in through the dust...",
];

pub const WAKE_UP_PROMPT: &str = "Wake up.";

const MUSIC: &str = "dream_theme";

/// The opening dream. `next` walks through the dialogue; `wake_up` is only
/// honored once the last line has been read.
pub struct CutScene {
    line: usize,
    music_volume: f32,
    woke: bool,
    requests: Vec<SceneRequest>,
}

impl CutScene {
    pub fn new(config: &Config) -> Self {
        Self {
            line: 0,
            music_volume: config.audio.master_volume * config.audio.music_volume,
            woke: false,
            requests: Vec::new(),
        }
    }

    /// Whether every line has been shown.
    pub fn is_finished(&self) -> bool {
        self.line >= DIALOGUE.len()
    }

    fn show_current(&self, engine: &mut dyn Engine) {
        match DIALOGUE.get(self.line) {
            Some(text) => engine.display_message(text),
            None => engine.display_message(WAKE_UP_PROMPT),
        }
    }
}

impl GameScene for CutScene {
    fn id(&self) -> SceneState {
        SceneState::CutScene
    }

    fn enter(&mut self, engine: &mut dyn Engine) {
        engine.play_sound(MUSIC, SoundOptions::looped(self.music_volume));
        self.show_current(engine);
    }

    fn tick(&mut self, _dt: f64, _engine: &mut dyn Engine) {}

    fn handle_input(&mut self, input: &Input, engine: &mut dyn Engine) {
        let Input::Interact(object) = input else {
            return;
        };
        match object.as_str() {
            NEXT_BUTTON if !self.is_finished() => {
                self.line += 1;
                self.show_current(engine);
            }
            WAKE_UP_BUTTON if self.is_finished() && !self.woke => {
                self.woke = true;
                self.requests.push(SceneRequest::Goto(SceneState::MainScene));
            }
            other => debug!("Cutscene ignores `{other}` at line {}", self.line),
        }
    }

    fn drain_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.requests)
    }

    fn dispose(&mut self, engine: &mut dyn Engine) {
        engine.stop_sound(MUSIC);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framed_engine::HeadlessEngine;

    #[test]
    fn test_wake_up_needs_the_whole_dialogue() {
        let mut engine = HeadlessEngine::new();
        let mut scene = CutScene::new(&Config::default());
        scene.enter(&mut engine);
        assert_eq!(engine.message(), Some(DIALOGUE[0]));
        assert!(engine.is_playing(MUSIC));

        scene.handle_input(&Input::interact(WAKE_UP_BUTTON), &mut engine);
        assert!(scene.drain_requests().is_empty());

        for _ in 0..DIALOGUE.len() {
            scene.handle_input(&Input::interact(NEXT_BUTTON), &mut engine);
        }
        assert!(scene.is_finished());
        assert_eq!(engine.message(), Some(WAKE_UP_PROMPT));

        // Extra clicks past the end change nothing.
        scene.handle_input(&Input::interact(NEXT_BUTTON), &mut engine);
        assert_eq!(engine.message(), Some(WAKE_UP_PROMPT));

        scene.handle_input(&Input::interact(WAKE_UP_BUTTON), &mut engine);
        scene.handle_input(&Input::interact(WAKE_UP_BUTTON), &mut engine);
        assert_eq!(
            scene.drain_requests(),
            vec![SceneRequest::Goto(SceneState::MainScene)]
        );

        scene.dispose(&mut engine);
        assert!(!engine.is_playing(MUSIC));
    }
}
