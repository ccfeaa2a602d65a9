//! Scripted player for the headless build.
//!
//! Walks the player through the whole story: title, dream, house, the
//! antenna puzzle and back home to the journal.

use std::collections::VecDeque;

use framed_engine::{HeadlessEngine, PlayerView, SceneState, Vec3};
use framed_flow::{Input, LoadBackend, SceneFactory, SceneFlow};
use tracing::{debug, info};

use crate::content::{
    BOOK, GATE, GLASSES, NEXT_BUTTON, PAINTING, PLAY_BUTTON, WAKE_UP_BUTTON, antenna_base,
    antenna_name, approach, gate_position,
};
use crate::scenes::DIALOGUE;

/// Walking speed in units per second.
pub const WALK_SPEED: f32 = 6.0;

/// One scripted step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Wait until `scene` is current and no transition is running.
    Await(SceneState),
    /// Send input, retrying while the controller drops it.
    Send(Input),
    /// Walk the player to a point.
    WalkTo(Vec3),
    /// Do nothing for a while.
    Pause(f64),
}

/// Plays the game from a fixed script.
#[derive(Debug)]
pub struct Autopilot {
    steps: VecDeque<Step>,
    pause_left: f64,
}

impl Autopilot {
    /// The full story. Antennas are visited in `order`.
    pub fn full_story(order: &[usize]) -> Self {
        let mut steps = vec![
            Step::Await(SceneState::Start),
            Step::Send(Input::interact(PLAY_BUTTON)),
            Step::Await(SceneState::CutScene),
        ];
        for _ in 0..DIALOGUE.len() {
            steps.push(Step::Send(Input::interact(NEXT_BUTTON)));
        }
        steps.extend([
            Step::Send(Input::interact(WAKE_UP_BUTTON)),
            Step::Await(SceneState::MainScene),
            Step::Pause(0.5),
            Step::Send(Input::interact(GLASSES)),
            Step::Send(Input::interact(PAINTING)),
            Step::Await(SceneState::MarsScene),
        ]);
        for &station in order {
            steps.push(Step::WalkTo(approach(antenna_base(station))));
            steps.push(Step::Pause(0.2));
            steps.push(Step::Send(Input::interact(antenna_name(station))));
        }
        steps.extend([
            Step::WalkTo(approach(gate_position())),
            Step::Send(Input::interact(GATE)),
            Step::Await(SceneState::MainScene),
            Step::Pause(2.0),
            Step::Send(Input::interact(BOOK)),
        ]);
        Self::new(steps)
    }

    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            pause_left: 0.0,
        }
    }

    /// Whether every step has run.
    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps not yet run.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Run the script for one tick of `dt` seconds.
    pub fn drive<B, F>(&mut self, flow: &mut SceneFlow<HeadlessEngine, B, F>, dt: f64)
    where
        B: LoadBackend,
        F: SceneFactory,
    {
        let Some(step) = self.steps.front() else {
            return;
        };
        let finished = match step {
            Step::Await(scene) => flow.current_state() == *scene && !flow.is_transitioning(),
            Step::Send(input) => flow.handle_input(input),
            Step::WalkTo(target) => {
                let engine = flow.engine_mut();
                let position = engine.player_position();
                let to_go = *target - position;
                let stride = WALK_SPEED * dt as f32;
                if to_go.length() <= stride {
                    engine.set_player_position(*target);
                    true
                } else {
                    engine.set_player_position(position + to_go.normalize() * stride);
                    false
                }
            }
            Step::Pause(secs) => {
                if self.pause_left <= 0.0 {
                    self.pause_left = *secs;
                }
                self.pause_left -= dt;
                self.pause_left <= 0.0
            }
        };
        if finished && let Some(step) = self.steps.pop_front() {
            debug!("Autopilot finished {:?}", step);
            if self.steps.is_empty() {
                info!("Autopilot script complete");
            }
        }
    }
}
