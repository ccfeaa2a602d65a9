//! Narrow interfaces to the hosting engine.

use glam::Vec3;

use crate::assets::SceneHandle;

/// Scene resource lifetime.
pub trait SceneHost {
    /// Release all engine resources behind `handle`.
    ///
    /// Must be idempotent: disposing an already-disposed handle is a no-op.
    fn dispose_scene(&mut self, handle: SceneHandle);
}

/// Loading indicator and narrative text channel.
pub trait Hud {
    /// Show the loading overlay.
    fn show_loading_indicator(&mut self);
    /// Hide the loading overlay.
    fn hide_loading_indicator(&mut self);
    /// Replace the on-screen message (dialogue, hints, errors).
    fn display_message(&mut self, text: &str);
    /// Remove the on-screen message.
    fn clear_message(&mut self);
}

/// Playback parameters for [`Audio::play_sound`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundOptions {
    /// Linear volume (0.0 - 1.0).
    pub volume: f32,
    /// Restart the clip when it ends.
    pub looping: bool,
}

impl SoundOptions {
    /// A single playback at `volume`.
    pub fn once(volume: f32) -> Self {
        Self {
            volume,
            looping: false,
        }
    }

    /// Looping playback at `volume`.
    pub fn looped(volume: f32) -> Self {
        Self {
            volume,
            looping: true,
        }
    }
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self::once(1.0)
    }
}

/// Sound effects and ambience.
pub trait Audio {
    /// Start playing `clip`.
    fn play_sound(&mut self, clip: &str, options: SoundOptions);
    /// Stop `clip` if it is playing.
    fn stop_sound(&mut self, clip: &str);
}

/// Mutations of the visible world that scenes are allowed to make.
pub trait WorldView {
    /// Show or hide a named object.
    fn set_visible(&mut self, object: &str, visible: bool);
    /// Make a hidden object visible over `duration_secs`.
    fn fade_in(&mut self, object: &str, duration_secs: f64);
    /// Set a named light's intensity.
    fn set_light_intensity(&mut self, light: &str, intensity: f32);
    /// Place the camera.
    fn set_camera(&mut self, position: Vec3, target: Vec3);
}

/// Read access to the player's transform.
pub trait PlayerView {
    /// Current world-space player position.
    fn player_position(&self) -> Vec3;
}

/// Everything the game needs from the engine, as one object-safe bundle.
pub trait Engine: SceneHost + Hud + Audio + WorldView + PlayerView {}

impl<T> Engine for T where T: SceneHost + Hud + Audio + WorldView + PlayerView {}
