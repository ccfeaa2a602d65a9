//! Engine facade for Framed Dreams.
//!
//! The game logic never talks to a renderer directly. Everything it needs
//! from the hosting engine (asset loading, scene disposal, HUD text, audio,
//! object visibility, lights, camera, player position) goes through the
//! small traits in this crate. [`HeadlessEngine`] and [`HeadlessLoader`]
//! implement them without a GPU and record every call for inspection.

mod assets;
mod headless;
mod host;
mod ids;

pub use assets::{AssetBundle, AssetLoader, LoadError, SceneAssets, SceneHandle, WorldObject};
pub use headless::{EngineCall, HeadlessEngine, HeadlessLoader};
pub use host::{Audio, Engine, Hud, PlayerView, SceneHost, SoundOptions, WorldView};
pub use ids::{LoadStage, SceneState};

pub use glam::Vec3;
