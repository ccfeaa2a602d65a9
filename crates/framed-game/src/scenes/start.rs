use framed_engine::{Engine, SceneState};
use framed_flow::{GameScene, Input, SceneRequest};

use crate::content::PLAY_BUTTON;

pub const TITLE: &str = "Framed Dreams";

/// Title screen. The play button starts the dream.
#[derive(Debug, Default)]
pub struct StartScene {
    requests: Vec<SceneRequest>,
    started: bool,
}

impl StartScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameScene for StartScene {
    fn id(&self) -> SceneState {
        SceneState::Start
    }

    fn enter(&mut self, engine: &mut dyn Engine) {
        engine.display_message(TITLE);
    }

    fn tick(&mut self, _dt: f64, _engine: &mut dyn Engine) {}

    fn handle_input(&mut self, input: &Input, engine: &mut dyn Engine) {
        if let Input::Interact(object) = input
            && object == PLAY_BUTTON
            && !self.started
        {
            self.started = true;
            engine.clear_message();
            self.requests.push(SceneRequest::Goto(SceneState::CutScene));
        }
    }

    fn drain_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.requests)
    }
}
