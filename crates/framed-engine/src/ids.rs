//! Scene and load-stage identifiers shared by the loader and the flow controller.

use std::fmt;

/// The four gameplay scenes. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneState {
    /// Title screen with the play button.
    Start,
    /// Intro dialogue before the player wakes up.
    CutScene,
    /// The house.
    MainScene,
    /// The Mars puzzle area.
    MarsScene,
}

impl SceneState {
    /// All scenes in playthrough order.
    pub const ALL: [SceneState; 4] = [
        SceneState::Start,
        SceneState::CutScene,
        SceneState::MainScene,
        SceneState::MarsScene,
    ];

    /// Load stages for this scene, in the order they must complete.
    ///
    /// Character assets depend on the environment (spawn points, collision
    /// meshes), so they always come second.
    pub fn stages(self) -> &'static [LoadStage] {
        match self {
            SceneState::Start | SceneState::CutScene => &[LoadStage::Environment],
            SceneState::MainScene | SceneState::MarsScene => {
                &[LoadStage::Environment, LoadStage::Characters]
            }
        }
    }

    /// Whether `self -> to` is part of the scene graph.
    pub fn can_transition_to(self, to: SceneState) -> bool {
        matches!(
            (self, to),
            (SceneState::Start, SceneState::CutScene)
                | (SceneState::CutScene, SceneState::MainScene)
                | (SceneState::MainScene, SceneState::MarsScene)
                | (SceneState::MarsScene, SceneState::MainScene)
        )
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SceneState::Start => "start",
            SceneState::CutScene => "cutscene",
            SceneState::MainScene => "house",
            SceneState::MarsScene => "mars",
        };
        f.write_str(name)
    }
}

/// One sequential phase of a scene load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoadStage {
    /// Level geometry, props, lights and world objects.
    Environment,
    /// Player and character meshes plus their animation clips.
    Characters,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Environment => f.write_str("environment"),
            LoadStage::Characters => f.write_str("characters"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_graph_edges() {
        let legal: Vec<_> = SceneState::ALL
            .iter()
            .flat_map(|&from| SceneState::ALL.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| from.can_transition_to(to))
            .collect();
        assert_eq!(
            legal,
            vec![
                (SceneState::Start, SceneState::CutScene),
                (SceneState::CutScene, SceneState::MainScene),
                (SceneState::MainScene, SceneState::MarsScene),
                (SceneState::MarsScene, SceneState::MainScene),
            ]
        );
    }

    #[test]
    fn test_no_self_transitions() {
        for scene in SceneState::ALL {
            assert!(!scene.can_transition_to(scene));
        }
    }

    #[test]
    fn test_gameplay_scenes_load_characters_last() {
        assert_eq!(
            SceneState::MarsScene.stages().last(),
            Some(&LoadStage::Characters)
        );
        assert_eq!(SceneState::Start.stages(), &[LoadStage::Environment]);
    }
}
