//! World content: object names shared by the scenes and the headless catalog.
//!
//! A real engine supplies these objects from the level files. The headless
//! build serves the same layout from [`catalog`].

use framed_engine::{AssetBundle, HeadlessLoader, LoadStage, SceneState, WorldObject};
use glam::Vec3;

pub const PLAY_BUTTON: &str = "play";
pub const NEXT_BUTTON: &str = "next";
pub const WAKE_UP_BUTTON: &str = "wake_up";

pub const GLASSES: &str = "glasses";
pub const PAINTING: &str = "painting";
pub const BOOK: &str = "book";
pub const DOOR_PREFIX: &str = "door_";
pub const SWITCH_PREFIX: &str = "switch_";
pub const LIGHT_PREFIX: &str = "light_";
pub const SPAWN_BEDROOM: &str = "spawn_bedroom";
pub const SPAWN_PAINTING: &str = "spawn_painting";

pub const ANTENNA_PREFIX: &str = "antenna_";
pub const GATE: &str = "gate";
pub const AMBIENT_LIGHT: &str = "ambient";
pub const SUN_LIGHT: &str = "sun";

pub const PLAYER: &str = "player";

/// Number of antennas in the Mars level.
pub const ANTENNA_COUNT: usize = 5;

/// Scene object name of antenna `index`.
pub fn antenna_name(index: usize) -> String {
    format!("{ANTENNA_PREFIX}{index}")
}

/// Parse `antenna_3` into `3`.
pub fn antenna_index(name: &str) -> Option<usize> {
    name.strip_prefix(ANTENNA_PREFIX)?.parse().ok()
}

/// Ground position of antenna `index` in the Mars level.
///
/// Antennas stand on an arc so that no two are within reach of each other.
pub fn antenna_base(index: usize) -> Vec3 {
    let angle = index as f32 * 0.6 - 1.2;
    Vec3::new(angle.sin() * 20.0, 0.0, -angle.cos() * 20.0)
}

/// Where the Mars gate stands.
pub fn gate_position() -> Vec3 {
    Vec3::new(0.0, 0.0, -30.0)
}

/// A spot the player can stand on to reach `target`.
pub fn approach(target: Vec3) -> Vec3 {
    target + Vec3::new(0.0, 0.0, 1.0)
}

fn bundle(objects: Vec<WorldObject>, animations: &[&str]) -> AssetBundle {
    AssetBundle {
        handle: None,
        objects,
        animations: animations.iter().map(|a| a.to_string()).collect(),
    }
}

fn house_environment() -> AssetBundle {
    bundle(
        vec![
            WorldObject::at("door_bedroom", Vec3::new(2.0, 0.0, 0.0)),
            WorldObject::at("door_hall", Vec3::new(6.0, 0.0, 0.0)),
            WorldObject::at("switch_bedroom", Vec3::new(1.5, 1.2, 0.2)),
            WorldObject::at("light_bedroom", Vec3::new(0.0, 2.5, 0.0)),
            WorldObject::at("switch_hall", Vec3::new(5.5, 1.2, 0.2)),
            WorldObject::at("light_hall", Vec3::new(6.0, 2.5, 3.0)),
            WorldObject::at(GLASSES, Vec3::new(-1.0, 0.8, 1.0)),
            WorldObject::at(PAINTING, Vec3::new(8.0, 1.6, 4.0)),
            WorldObject::at(BOOK, Vec3::new(-1.5, 0.8, 2.0)),
            WorldObject::at(SPAWN_BEDROOM, Vec3::new(0.0, 1.7, 1.0)),
            WorldObject::at(SPAWN_PAINTING, Vec3::new(8.0, 1.7, 2.0)),
        ],
        &[],
    )
}

fn mars_environment() -> AssetBundle {
    let mut objects: Vec<WorldObject> = (0..ANTENNA_COUNT)
        .map(|i| {
            let base = antenna_base(i);
            WorldObject {
                name: antenna_name(i),
                // Mast and dish.
                meshes: vec![base, base + Vec3::new(0.0, 3.0, 0.0)],
            }
        })
        .collect();
    objects.push(WorldObject::at(GATE, gate_position()));
    bundle(objects, &["dish_spin"])
}

fn characters() -> AssetBundle {
    bundle(
        vec![WorldObject::empty(PLAYER)],
        &["idle", "walk", "interact"],
    )
}

/// Headless loader serving the full game layout.
pub fn catalog() -> HeadlessLoader {
    HeadlessLoader::new()
        .with_bundle(
            SceneState::Start,
            LoadStage::Environment,
            bundle(vec![WorldObject::empty(PLAY_BUTTON)], &[]),
        )
        .with_bundle(
            SceneState::CutScene,
            LoadStage::Environment,
            bundle(
                vec![
                    WorldObject::empty(NEXT_BUTTON),
                    WorldObject::empty(WAKE_UP_BUTTON),
                ],
                &["dream_drift"],
            ),
        )
        .with_bundle(
            SceneState::MainScene,
            LoadStage::Environment,
            house_environment(),
        )
        .with_bundle(SceneState::MainScene, LoadStage::Characters, characters())
        .with_bundle(
            SceneState::MarsScene,
            LoadStage::Environment,
            mars_environment(),
        )
        .with_bundle(SceneState::MarsScene, LoadStage::Characters, characters())
}

#[cfg(test)]
mod tests {
    use super::*;
    use framed_engine::AssetLoader;

    #[test]
    fn test_antenna_names_round_trip() {
        assert_eq!(antenna_index(&antenna_name(3)), Some(3));
        assert_eq!(antenna_index("antenna_x"), None);
        assert_eq!(antenna_index(GATE), None);
    }

    #[test]
    fn test_antennas_are_out_of_reach_of_each_other() {
        for a in 0..ANTENNA_COUNT {
            for b in (a + 1)..ANTENNA_COUNT {
                assert!(antenna_base(a).distance(antenna_base(b)) > 5.0);
            }
            assert!(approach(antenna_base(a)).distance(antenna_base(a)) < 1.5);
        }
    }

    #[test]
    fn test_catalog_has_every_antenna() {
        let bundle = catalog()
            .load(SceneState::MarsScene, LoadStage::Environment)
            .unwrap();
        for i in 0..ANTENNA_COUNT {
            let name = antenna_name(i);
            let antenna = bundle.objects.iter().find(|o| o.name == name).unwrap();
            assert_eq!(antenna.meshes.len(), 2);
        }
        assert!(bundle.objects.iter().any(|o| o.name == GATE));
    }
}
