//! Framed Dreams game content.
//!
//! The four scenes, the world layout they expect, and a scripted player for
//! running the whole story without a renderer.

pub mod autopilot;
pub mod content;
pub mod scenes;


pub use autopilot::{Autopilot, Step};
pub use scenes::GameScenes;
