//! GPU-free engine implementation that records every call.
//!
//! Used by the test suite and by the headless runner binary.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use glam::Vec3;
use tracing::{debug, info};

use crate::assets::{AssetBundle, AssetLoader, LoadError, SceneHandle};
use crate::host::{Audio, Hud, PlayerView, SceneHost, SoundOptions, WorldView};
use crate::ids::{LoadStage, SceneState};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    DisposeScene(SceneHandle),
    ShowLoading,
    HideLoading,
    DisplayMessage(String),
    ClearMessage,
    PlaySound { clip: String, options: SoundOptions },
    StopSound(String),
    SetVisible { object: String, visible: bool },
    FadeIn { object: String, duration_secs: f64 },
    SetLight { light: String, intensity: f32 },
    SetCamera { position: Vec3, target: Vec3 },
}

/// Engine stand-in that tracks the observable world state.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    calls: Vec<EngineCall>,
    disposed: HashSet<SceneHandle>,
    loading_visible: bool,
    message: Option<String>,
    visibility: HashMap<String, bool>,
    lights: HashMap<String, f32>,
    playing: HashSet<String>,
    camera: Option<(Vec3, Vec3)>,
    player_position: Vec3,
}

impl HeadlessEngine {
    /// Creates an engine with the player at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Forget the call journal. World state is kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Whether the loading overlay is currently shown.
    pub fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    /// The current on-screen message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Last visibility set for `object`, if any.
    pub fn is_visible(&self, object: &str) -> Option<bool> {
        self.visibility.get(object).copied()
    }

    /// Last intensity set for `light`, if any.
    pub fn light_intensity(&self, light: &str) -> Option<f32> {
        self.lights.get(light).copied()
    }

    /// Whether `clip` was started and not stopped since.
    pub fn is_playing(&self, clip: &str) -> bool {
        self.playing.contains(clip)
    }

    /// Last camera placement as `(position, target)`.
    pub fn camera(&self) -> Option<(Vec3, Vec3)> {
        self.camera
    }

    /// Whether `handle` has been released.
    pub fn is_disposed(&self, handle: SceneHandle) -> bool {
        self.disposed.contains(&handle)
    }

    /// Move the player. Read back through [`PlayerView`].
    pub fn set_player_position(&mut self, position: Vec3) {
        self.player_position = position;
    }
}

impl SceneHost for HeadlessEngine {
    fn dispose_scene(&mut self, handle: SceneHandle) {
        self.calls.push(EngineCall::DisposeScene(handle));
        if self.disposed.insert(handle) {
            debug!("Released scene resources {:?}", handle);
        }
    }
}

impl Hud for HeadlessEngine {
    fn show_loading_indicator(&mut self) {
        self.calls.push(EngineCall::ShowLoading);
        self.loading_visible = true;
    }

    fn hide_loading_indicator(&mut self) {
        self.calls.push(EngineCall::HideLoading);
        self.loading_visible = false;
    }

    fn display_message(&mut self, text: &str) {
        self.calls.push(EngineCall::DisplayMessage(text.to_string()));
        if self.message.as_deref() != Some(text) {
            info!(target: "framed_engine::hud", "{text}");
        }
        self.message = Some(text.to_string());
    }

    fn clear_message(&mut self) {
        self.calls.push(EngineCall::ClearMessage);
        self.message = None;
    }
}

impl Audio for HeadlessEngine {
    fn play_sound(&mut self, clip: &str, options: SoundOptions) {
        self.calls.push(EngineCall::PlaySound {
            clip: clip.to_string(),
            options,
        });
        if options.looping {
            self.playing.insert(clip.to_string());
        }
    }

    fn stop_sound(&mut self, clip: &str) {
        self.calls.push(EngineCall::StopSound(clip.to_string()));
        self.playing.remove(clip);
    }
}

impl WorldView for HeadlessEngine {
    fn set_visible(&mut self, object: &str, visible: bool) {
        self.calls.push(EngineCall::SetVisible {
            object: object.to_string(),
            visible,
        });
        self.visibility.insert(object.to_string(), visible);
    }

    fn fade_in(&mut self, object: &str, duration_secs: f64) {
        self.calls.push(EngineCall::FadeIn {
            object: object.to_string(),
            duration_secs,
        });
        self.visibility.insert(object.to_string(), true);
    }

    fn set_light_intensity(&mut self, light: &str, intensity: f32) {
        self.calls.push(EngineCall::SetLight {
            light: light.to_string(),
            intensity,
        });
        self.lights.insert(light.to_string(), intensity);
    }

    fn set_camera(&mut self, position: Vec3, target: Vec3) {
        self.calls.push(EngineCall::SetCamera { position, target });
        self.camera = Some((position, target));
    }
}

impl PlayerView for HeadlessEngine {
    fn player_position(&self) -> Vec3 {
        self.player_position
    }
}

/// Loader that serves bundles from an in-memory catalog.
///
/// Stages missing from the catalog load as empty bundles. Stages marked with
/// [`fail`](Self::fail) return [`LoadError::AssetLoadFailure`]. Each
/// successful load gets a fresh [`SceneHandle`].
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    catalog: HashMap<(SceneState, LoadStage), AssetBundle>,
    failing: HashSet<(SceneState, LoadStage)>,
    latency: Duration,
    next_handle: AtomicU64,
}

impl HeadlessLoader {
    /// Creates a loader with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bundle served for `scene`/`stage`.
    pub fn with_bundle(mut self, scene: SceneState, stage: LoadStage, bundle: AssetBundle) -> Self {
        self.catalog.insert((scene, stage), bundle);
        self
    }

    /// Make `scene`/`stage` fail on every load.
    pub fn fail(mut self, scene: SceneState, stage: LoadStage) -> Self {
        self.failing.insert((scene, stage));
        self
    }

    /// Sleep this long inside every load, to mimic disk and GPU upload time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl AssetLoader for HeadlessLoader {
    fn load(&self, scene: SceneState, stage: LoadStage) -> Result<AssetBundle, LoadError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        if self.failing.contains(&(scene, stage)) {
            return Err(LoadError::AssetLoadFailure {
                scene,
                stage,
                reason: "asset not found".to_string(),
            });
        }

        let mut bundle = self.catalog.get(&(scene, stage)).cloned().unwrap_or_default();
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        bundle.handle = Some(SceneHandle(id));
        Ok(bundle)
    }
}
