//! The capability interface every scene implements, and how scenes are built.

use framed_engine::{Engine, SceneAssets, SceneState};

/// Player input routed to the current scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// The player clicked or activated the named world object.
    Interact(String),
    /// A key was pressed, by its code name (e.g. `KeyM`).
    Key(String),
}

impl Input {
    /// Shorthand for [`Input::Interact`].
    pub fn interact(object: impl Into<String>) -> Self {
        Input::Interact(object.into())
    }

    /// Shorthand for [`Input::Key`].
    pub fn key(code: impl Into<String>) -> Self {
        Input::Key(code.into())
    }
}

/// Something a scene asks of the flow controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    /// Move to another scene.
    Goto(SceneState),
}

/// Cross-scene facts a scene is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneInit {
    /// Whether the player has come back from Mars before.
    pub mars_visited: bool,
    /// How many times Mars has been entered before this build.
    pub mars_entries: u32,
}

/// A loaded, running scene.
///
/// The controller calls [`enter`](Self::enter) once after building,
/// [`tick`](Self::tick) every frame while current, and
/// [`dispose`](Self::dispose) once before dropping it. Requests are
/// collected after every tick and input.
pub trait GameScene {
    /// Which scene this is.
    fn id(&self) -> SceneState;

    /// Set up the world: visibility, camera, ambience, first message.
    fn enter(&mut self, engine: &mut dyn Engine);

    /// Advance by `dt` seconds.
    fn tick(&mut self, dt: f64, engine: &mut dyn Engine);

    /// React to player input.
    fn handle_input(&mut self, input: &Input, engine: &mut dyn Engine);

    /// Take the requests raised since the last call.
    fn drain_requests(&mut self) -> Vec<SceneRequest>;

    /// Scene-level cleanup such as stopping looped audio. Engine resources
    /// are released by the controller afterwards.
    fn dispose(&mut self, _engine: &mut dyn Engine) {}
}

/// Errors building a scene from its loaded assets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A named object the scene depends on is not in the assets.
    #[error("{scene} scene is missing world object `{name}`")]
    MissingWorldObject {
        /// Scene being built.
        scene: SceneState,
        /// Name of the absent object.
        name: String,
    },

    /// The assets are present but unusable.
    #[error("{scene} scene cannot be built: {reason}")]
    Invalid {
        /// Scene being built.
        scene: SceneState,
        /// Explanation.
        reason: String,
    },
}

/// Turns loaded assets into a running scene.
pub trait SceneFactory {
    /// Build `scene` from `assets`.
    fn build(
        &mut self,
        scene: SceneState,
        assets: &SceneAssets,
        init: SceneInit,
    ) -> Result<Box<dyn GameScene>, SceneError>;
}
