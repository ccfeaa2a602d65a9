//! Scene flow for Framed Dreams.
//!
//! [`SceneFlow`] owns the single current scene and moves the player through
//! `Start -> CutScene -> MainScene <-> MarsScene`, loading the next scene
//! through a [`LoadBackend`] before disposing the current one. Scenes plug in
//! through the [`GameScene`] and [`SceneFactory`] traits and talk back only
//! through [`SceneRequest`]s.

mod controller;
pub mod game_loop;
mod pipeline;
mod scene;

pub use controller::{
    DEGRADED_MESSAGE, FlowEvent, LOAD_FAILED_MESSAGE, Phase, SceneFlow, TransitionError,
};
pub use game_loop::{FIXED_DT, GameLoop};
pub use pipeline::{
    InlineBackend, LoadBackend, LoadPipeline, LoadRequest, LoadResult, ManualBackend,
};
pub use scene::{GameScene, Input, SceneError, SceneFactory, SceneInit, SceneRequest};

pub use framed_engine::SceneState;
