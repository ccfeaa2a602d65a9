//! The four scenes of the game and the factory that builds them.

pub mod cutscene;
pub mod house;
pub mod mars;
pub mod start;

pub use cutscene::{CutScene, DIALOGUE, WAKE_UP_PROMPT};
pub use house::HouseScene;
pub use mars::MarsScene;
pub use start::StartScene;

use framed_config::Config;
use framed_engine::{SceneAssets, SceneState, WorldObject};
use framed_flow::{GameScene, SceneError, SceneFactory, SceneInit};
use tracing::warn;

/// Builds the game's scenes from loaded assets.
pub struct GameScenes {
    config: Config,
}

impl GameScenes {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl SceneFactory for GameScenes {
    fn build(
        &mut self,
        scene: SceneState,
        assets: &SceneAssets,
        init: SceneInit,
    ) -> Result<Box<dyn GameScene>, SceneError> {
        let built: Box<dyn GameScene> = match scene {
            SceneState::Start => Box::new(StartScene::new()),
            SceneState::CutScene => Box::new(CutScene::new(&self.config)),
            SceneState::MainScene => Box::new(HouseScene::build(assets, init, &self.config)?),
            SceneState::MarsScene => Box::new(MarsScene::build(assets, init, &self.config)?),
        };
        Ok(built)
    }
}

/// Look up a world object the scene depends on.
///
/// A missing object is an error in strict mode. Otherwise it is logged and
/// the scene carries on without it.
fn require<'a>(
    assets: &'a SceneAssets,
    scene: SceneState,
    name: &str,
    strict: bool,
) -> Result<Option<&'a WorldObject>, SceneError> {
    match assets.object(name) {
        Some(object) => Ok(Some(object)),
        None if strict => Err(SceneError::MissingWorldObject {
            scene,
            name: name.to_string(),
        }),
        None => {
            warn!("{scene} scene has no `{name}` object, its interactions are disabled");
            Ok(None)
        }
    }
}
