//! Asset bundles produced by the engine's loader.

use glam::Vec3;

use crate::ids::{LoadStage, SceneState};

/// Opaque engine handle for the resources of one load stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneHandle(pub u64);

/// A named object in the loaded world.
///
/// `meshes` holds the world-space position of each sub-mesh. Parent nodes
/// such as an antenna group can have several; a marker with no geometry has
/// none.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldObject {
    /// Scene graph name, e.g. `antenna_2` or `door_bedroom`.
    pub name: String,
    /// World-space positions of the object's sub-meshes.
    pub meshes: Vec<Vec3>,
}

impl WorldObject {
    /// Object with a single mesh at `position`.
    pub fn at(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            meshes: vec![position],
        }
    }

    /// Object with no geometry.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }
}

/// Everything one load stage produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBundle {
    /// Handle the engine uses to release this bundle.
    pub handle: Option<SceneHandle>,
    /// Named world objects.
    pub objects: Vec<WorldObject>,
    /// Animation clip names.
    pub animations: Vec<String>,
}

/// The merged result of all stages of one scene load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneAssets {
    /// Handles of every stage that produced resources.
    pub handles: Vec<SceneHandle>,
    /// All world objects, in stage order.
    pub objects: Vec<WorldObject>,
    /// All animation clips, in stage order.
    pub animations: Vec<String>,
    /// Stages that failed and were replaced by empty bundles.
    pub failed_stages: Vec<LoadStage>,
}

impl SceneAssets {
    /// Fold a successful stage bundle into the scene.
    pub fn merge(&mut self, bundle: AssetBundle) {
        self.handles.extend(bundle.handle);
        self.objects.extend(bundle.objects);
        self.animations.extend(bundle.animations);
    }

    /// Record a failed stage. The scene continues with whatever else loaded.
    pub fn mark_failed(&mut self, stage: LoadStage) {
        if !self.failed_stages.contains(&stage) {
            self.failed_stages.push(stage);
        }
    }

    /// Look up a world object by exact name.
    pub fn object(&self, name: &str) -> Option<&WorldObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// All objects whose name starts with `prefix`, in load order.
    pub fn objects_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a WorldObject> + 'a {
        self.objects.iter().filter(move |o| o.name.starts_with(prefix))
    }

    /// `true` when at least one stage failed.
    pub fn is_degraded(&self) -> bool {
        !self.failed_stages.is_empty()
    }
}

/// Errors raised while loading a stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// The engine could not produce the stage's assets.
    #[error("failed to load {stage} assets for {scene}: {reason}")]
    AssetLoadFailure {
        /// Scene being loaded.
        scene: SceneState,
        /// Stage that failed.
        stage: LoadStage,
        /// Engine-provided explanation.
        reason: String,
    },

    /// The stage did not answer in time.
    #[error("loading {stage} assets for {scene} timed out")]
    Timeout {
        /// Scene being loaded.
        scene: SceneState,
        /// Stage that timed out.
        stage: LoadStage,
    },

    /// The loader went away before answering.
    #[error("asset loader disconnected")]
    Disconnected,
}

/// The engine's `loadSceneAssets` entry point.
///
/// Called from loader worker threads, so implementations must be `Send + Sync`
/// and may block.
pub trait AssetLoader: Send + Sync {
    /// Load one stage of a scene.
    fn load(&self, scene: SceneState, stage: LoadStage) -> Result<AssetBundle, LoadError>;
}

/// Blanket implementation for closures.
impl<F> AssetLoader for F
where
    F: Fn(SceneState, LoadStage) -> Result<AssetBundle, LoadError> + Send + Sync,
{
    fn load(&self, scene: SceneState, stage: LoadStage) -> Result<AssetBundle, LoadError> {
        self(scene, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_stage_order() {
        let mut assets = SceneAssets::default();
        assets.merge(AssetBundle {
            handle: Some(SceneHandle(1)),
            objects: vec![WorldObject::at("gate", Vec3::ZERO)],
            animations: vec![],
        });
        assets.merge(AssetBundle {
            handle: Some(SceneHandle(2)),
            objects: vec![WorldObject::at("player", Vec3::X)],
            animations: vec!["walk".to_string()],
        });
        assert_eq!(assets.handles, vec![SceneHandle(1), SceneHandle(2)]);
        assert_eq!(assets.objects[1].name, "player");
        assert!(!assets.is_degraded());
    }

    #[test]
    fn test_mark_failed_is_deduplicated() {
        let mut assets = SceneAssets::default();
        assets.mark_failed(LoadStage::Environment);
        assets.mark_failed(LoadStage::Environment);
        assert_eq!(assets.failed_stages, vec![LoadStage::Environment]);
        assert!(assets.is_degraded());
    }

    #[test]
    fn test_prefix_lookup() {
        let mut assets = SceneAssets::default();
        assets.merge(AssetBundle {
            handle: None,
            objects: vec![
                WorldObject::empty("antenna_0"),
                WorldObject::empty("gate"),
                WorldObject::empty("antenna_1"),
            ],
            animations: vec![],
        });
        let names: Vec<_> = assets
            .objects_with_prefix("antenna_")
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["antenna_0", "antenna_1"]);
        assert!(assets.object("gate").is_some());
        assert!(assets.object("painting").is_none());
    }

    #[test]
    fn test_closure_loader() {
        let loader = |scene: SceneState, stage: LoadStage| -> Result<AssetBundle, LoadError> {
            Err(LoadError::AssetLoadFailure {
                scene,
                stage,
                reason: "missing mesh".to_string(),
            })
        };
        let err = loader
            .load(SceneState::MarsScene, LoadStage::Environment)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to load environment assets for mars: missing mesh"
        );
    }
}
