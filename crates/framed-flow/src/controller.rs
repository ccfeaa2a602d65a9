//! The scene flow controller.
//!
//! [`SceneFlow`] owns the current scene and moves the player through the
//! scene graph `Start -> CutScene -> MainScene <-> MarsScene`. A transition
//! runs in three steps:
//!
//! 1. show the loading indicator and submit the target's first load stage;
//! 2. submit each later stage once the previous one answered, while the
//!    current scene keeps ticking behind the indicator;
//! 3. once every stage answered (and the settle delay, if any, elapsed),
//!    build the new scene, dispose the old one, enter the new one and hide
//!    the indicator.
//!
//! Only one transition can be in flight. Stage failures degrade the scene;
//! a stage that never answers, or a scene that cannot be built, ends in
//! [`Phase::LoadFailed`] with the previous scene still current.

use framed_config::FlowConfig;
use framed_engine::{Engine, LoadError, LoadStage, SceneAssets, SceneHandle, SceneState};
use tracing::{debug, error, info, warn};

use crate::pipeline::{LoadBackend, LoadRequest, LoadResult};
use crate::scene::{GameScene, Input, SceneFactory, SceneInit, SceneRequest};

/// Shown when a transition is abandoned.
pub const LOAD_FAILED_MESSAGE: &str = "This place could not be loaded. Try again.";

/// Shown after entering a scene that loaded with missing stages.
pub const DEGRADED_MESSAGE: &str = "Parts of this place failed to load.";

/// Where the controller is in its transition protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No transition in flight.
    #[default]
    Idle,
    /// Waiting for load stages.
    Loading,
    /// Everything loaded; waiting out the settle delay.
    Settling,
    /// The last transition was abandoned. Behaves like `Idle`.
    LoadFailed,
}

/// Why a transition request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// `start()` has not produced a scene yet.
    #[error("scene flow has not started")]
    NotStarted,

    /// `start()` was called twice.
    #[error("scene flow already started")]
    AlreadyStarted,

    /// Another transition is still loading.
    #[error("a transition is already in flight")]
    InFlight,

    /// The scene graph has no such edge.
    #[error("cannot go from {from} to {to}")]
    Illegal {
        /// Current scene.
        from: SceneState,
        /// Requested scene.
        to: SceneState,
    },

    /// Mars was already visited and revisits are disabled.
    #[error("mars has already been visited")]
    MarsAlreadyVisited,
}

/// Observable record of what the controller did.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// A transition began; `from` is `None` for the initial start.
    TransitionStarted {
        from: Option<SceneState>,
        to: SceneState,
    },
    /// A background load began.
    PreloadStarted(SceneState),
    /// A stage failed; the scene will be built without it.
    StageFailed {
        scene: SceneState,
        stage: LoadStage,
        error: LoadError,
    },
    /// The old scene was released.
    SceneDisposed(SceneState),
    /// The new scene is current.
    SceneEntered { scene: SceneState, degraded: bool },
    /// `marsVisited` flipped to true.
    MarsVisited,
    /// A transition was abandoned.
    TransitionFailed { to: SceneState, reason: String },
    /// A request was refused before starting.
    TransitionRejected {
        to: SceneState,
        error: TransitionError,
    },
}

/// A scene and the engine resources it was built from.
struct ActiveScene {
    scene: Box<dyn GameScene>,
    handles: Vec<SceneHandle>,
    disposed: bool,
}

impl ActiveScene {
    /// Release the scene. Returns `false` if it was already released.
    fn dispose(&mut self, engine: &mut dyn Engine) -> bool {
        if self.disposed {
            return false;
        }
        self.scene.dispose(engine);
        for &handle in &self.handles {
            engine.dispose_scene(handle);
        }
        self.disposed = true;
        true
    }
}

/// Sequential stage loading for one scene.
struct StageLoad {
    scene: SceneState,
    init: SceneInit,
    stage_index: usize,
    ticket: Option<u64>,
    assets: SceneAssets,
}

impl StageLoad {
    fn new(scene: SceneState, init: SceneInit) -> Self {
        Self {
            scene,
            init,
            stage_index: 0,
            ticket: None,
            assets: SceneAssets::default(),
        }
    }

    fn current_stage(&self) -> Option<LoadStage> {
        self.scene.stages().get(self.stage_index).copied()
    }
}

struct Transition {
    from: Option<SceneState>,
    load: StageLoad,
    /// Seconds the current stage has been outstanding.
    waited: f64,
    settle_remaining: f64,
}

/// Drives the scene graph.
///
/// Generic over the engine, the load backend and the scene factory so tests
/// can substitute each one.
pub struct SceneFlow<E, B, F> {
    engine: E,
    backend: B,
    factory: F,
    config: FlowConfig,
    state: SceneState,
    phase: Phase,
    current: Option<ActiveScene>,
    pending: Option<Transition>,
    preload: Option<StageLoad>,
    mars_visited: bool,
    mars_entries: u32,
    next_ticket: u64,
    events: Vec<FlowEvent>,
}

impl<E, B, F> SceneFlow<E, B, F>
where
    E: Engine,
    B: LoadBackend,
    F: SceneFactory,
{
    /// Creates an unstarted controller. Call [`start`](Self::start) next.
    pub fn new(engine: E, backend: B, factory: F, config: &FlowConfig) -> Self {
        Self {
            engine,
            backend,
            factory,
            config: config.clone(),
            state: SceneState::Start,
            phase: Phase::Idle,
            current: None,
            pending: None,
            preload: None,
            mars_visited: false,
            mars_entries: 0,
            next_ticket: 0,
            events: Vec::new(),
        }
    }

    // --- Accessors ---

    /// The current scene.
    pub fn current_state(&self) -> SceneState {
        self.state
    }

    /// Whether the player has returned from Mars at least once.
    pub fn is_mars_visited(&self) -> bool {
        self.mars_visited
    }

    /// How many times Mars has been entered.
    pub fn mars_entries(&self) -> u32 {
        self.mars_entries
    }

    /// Whether a transition is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Transition protocol phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a scene is built and receiving ticks.
    pub fn has_active_scene(&self) -> bool {
        self.current.is_some()
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access, e.g. to move the player in tests.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The load backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Transitions ---

    /// Load and enter the start scene.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.pending.is_some() {
            return Err(TransitionError::InFlight);
        }
        if self.current.is_some() {
            return Err(TransitionError::AlreadyStarted);
        }
        info!("Starting scene flow");
        self.state = SceneState::Start;
        self.begin_transition(None, SceneState::Start);
        Ok(())
    }

    /// Ask to move to `target`.
    ///
    /// Refusals are logged and recorded as [`FlowEvent::TransitionRejected`];
    /// the controller is left untouched.
    pub fn request_transition(&mut self, target: SceneState) -> Result<(), TransitionError> {
        if let Err(error) = self.check_transition(target) {
            warn!("Rejected transition {} -> {}: {}", self.state, target, error);
            self.events.push(FlowEvent::TransitionRejected {
                to: target,
                error: error.clone(),
            });
            return Err(error);
        }
        self.begin_transition(Some(self.state), target);
        Ok(())
    }

    fn check_transition(&self, target: SceneState) -> Result<(), TransitionError> {
        if self.pending.is_some() {
            return Err(TransitionError::InFlight);
        }
        if self.current.is_none() {
            return Err(TransitionError::NotStarted);
        }
        if !self.state.can_transition_to(target) {
            return Err(TransitionError::Illegal {
                from: self.state,
                to: target,
            });
        }
        if target == SceneState::MarsScene && self.mars_visited && !self.config.allow_mars_revisit
        {
            return Err(TransitionError::MarsAlreadyVisited);
        }
        Ok(())
    }

    fn begin_transition(&mut self, from: Option<SceneState>, target: SceneState) {
        let init = SceneInit {
            mars_visited: self.mars_visited
                || (from == Some(SceneState::MarsScene) && target == SceneState::MainScene),
            mars_entries: self.mars_entries,
        };
        let settle_remaining =
            if from == Some(SceneState::CutScene) && target == SceneState::MainScene {
                self.config.settle_delay_ms as f64 / 1000.0
            } else {
                0.0
            };

        let load = match self.preload.take() {
            Some(preload) if preload.scene == target && preload.init == init => {
                debug!("Reusing preloaded {} assets", target);
                preload
            }
            Some(stale) => {
                debug!("Discarding preloaded {} assets", stale.scene);
                self.release_handles(&stale.assets.handles);
                StageLoad::new(target, init)
            }
            None => StageLoad::new(target, init),
        };

        info!(
            "Transition {} -> {}",
            from.map_or("(none)".to_string(), |s| s.to_string()),
            target
        );
        self.engine.show_loading_indicator();
        self.phase = Phase::Loading;
        self.events.push(FlowEvent::TransitionStarted { from, to: target });

        let mut transition = Transition {
            from,
            load,
            waited: 0.0,
            settle_remaining,
        };
        if transition.load.ticket.is_none() {
            self.submit_stage(&mut transition.load);
        }
        self.pending = Some(transition);
    }

    fn begin_preload(&mut self, scene: SceneState) {
        let init = SceneInit {
            mars_visited: self.mars_visited,
            mars_entries: self.mars_entries,
        };
        let mut load = StageLoad::new(scene, init);
        debug!("Preloading {} in the background", scene);
        self.events.push(FlowEvent::PreloadStarted(scene));
        self.submit_stage(&mut load);
        self.preload = Some(load);
    }

    /// Submit the load's current stage, skipping stages the backend refuses.
    fn submit_stage(&mut self, load: &mut StageLoad) {
        while let Some(stage) = load.current_stage() {
            self.next_ticket += 1;
            let request = LoadRequest {
                ticket: self.next_ticket,
                scene: load.scene,
                stage,
            };
            if self.backend.submit(request) {
                load.ticket = Some(request.ticket);
                return;
            }
            warn!("Loader refused {} {} request", load.scene, stage);
            self.record_stage_failure(load, stage, LoadError::Disconnected);
        }
        load.ticket = None;
    }

    fn record_stage_failure(&mut self, load: &mut StageLoad, stage: LoadStage, error: LoadError) {
        warn!("Continuing without {} {} assets: {}", load.scene, stage, error);
        load.assets.mark_failed(stage);
        load.stage_index += 1;
        self.events.push(FlowEvent::StageFailed {
            scene: load.scene,
            stage,
            error,
        });
    }

    // --- Per-frame driving ---

    /// One simulation step of `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        for result in self.backend.drain_results() {
            self.route_result(result);
        }

        self.advance_transition(dt);

        if let Some(active) = self.current.as_mut() {
            active.scene.tick(dt, &mut self.engine);
        }
        self.collect_requests();
    }

    /// Forward player input to the current scene.
    ///
    /// Returns `false` when the input was dropped because no scene is
    /// current or a transition is in flight.
    pub fn handle_input(&mut self, input: &Input) -> bool {
        if self.pending.is_some() {
            debug!("Ignoring {:?} during transition", input);
            return false;
        }
        let Some(active) = self.current.as_mut() else {
            return false;
        };
        active.scene.handle_input(input, &mut self.engine);
        self.collect_requests();
        true
    }

    fn collect_requests(&mut self) {
        let requests = match self.current.as_mut() {
            Some(active) => active.scene.drain_requests(),
            None => return,
        };
        for request in requests {
            match request {
                SceneRequest::Goto(target) => {
                    let _ = self.request_transition(target);
                }
            }
        }
    }

    fn route_result(&mut self, result: LoadResult) {
        if let Some(mut transition) = self.pending.take() {
            if transition.load.ticket == Some(result.ticket) {
                self.apply_result(&mut transition.load, result);
                transition.waited = 0.0;
                self.pending = Some(transition);
                return;
            }
            self.pending = Some(transition);
        }

        if let Some(mut preload) = self.preload.take() {
            if preload.ticket == Some(result.ticket) {
                self.apply_result(&mut preload, result);
                self.preload = Some(preload);
                return;
            }
            self.preload = Some(preload);
        }

        // Answer to an abandoned or discarded load.
        debug!(
            "Dropping stale {} {} result (ticket {})",
            result.scene, result.stage, result.ticket
        );
        if let Ok(bundle) = result.outcome
            && let Some(handle) = bundle.handle
        {
            self.engine.dispose_scene(handle);
        }
    }

    fn apply_result(&mut self, load: &mut StageLoad, result: LoadResult) {
        load.ticket = None;
        match result.outcome {
            Ok(bundle) => {
                debug!(
                    "Loaded {} {} ({} objects)",
                    result.scene,
                    result.stage,
                    bundle.objects.len()
                );
                load.assets.merge(bundle);
                load.stage_index += 1;
            }
            Err(error) => self.record_stage_failure(load, result.stage, error),
        }
        self.submit_stage(load);
    }

    fn advance_transition(&mut self, dt: f64) {
        let Some(transition) = self.pending.as_mut() else {
            return;
        };
        transition.settle_remaining = (transition.settle_remaining - dt).max(0.0);

        if let Some(stage) = transition.load.current_stage() {
            transition.waited += dt;
            let timeout = self.config.load_timeout_ms as f64 / 1000.0;
            if transition.waited >= timeout {
                let error = LoadError::Timeout {
                    scene: transition.load.scene,
                    stage,
                };
                self.fail_transition(error.to_string());
            }
            return;
        }

        if transition.settle_remaining > 0.0 {
            self.phase = Phase::Settling;
            return;
        }

        self.finish_transition();
    }

    fn finish_transition(&mut self) {
        let Some(transition) = self.pending.take() else {
            return;
        };
        let target = transition.load.scene;
        let assets = transition.load.assets;

        let scene = match self.factory.build(target, &assets, transition.load.init) {
            Ok(scene) => scene,
            Err(e) => {
                self.release_handles(&assets.handles);
                self.abandon(target, e.to_string());
                return;
            }
        };

        if let Some(mut old) = self.current.take() {
            let old_id = old.scene.id();
            if old.dispose(&mut self.engine) {
                self.events.push(FlowEvent::SceneDisposed(old_id));
            }
        }

        self.state = target;
        if target == SceneState::MarsScene {
            self.mars_entries += 1;
        }
        if transition.from == Some(SceneState::MarsScene)
            && target == SceneState::MainScene
            && !self.mars_visited
        {
            self.mars_visited = true;
            info!("Mars visited");
            self.events.push(FlowEvent::MarsVisited);
        }

        let mut active = ActiveScene {
            scene,
            handles: assets.handles.clone(),
            disposed: false,
        };
        active.scene.enter(&mut self.engine);
        let degraded = assets.is_degraded();
        if degraded {
            self.engine.display_message(DEGRADED_MESSAGE);
        }
        self.current = Some(active);
        self.phase = Phase::Idle;
        self.engine.hide_loading_indicator();
        info!("Entered {}{}", target, if degraded { " (degraded)" } else { "" });
        self.events.push(FlowEvent::SceneEntered {
            scene: target,
            degraded,
        });

        if target == SceneState::CutScene && self.config.preload_main_scene {
            self.begin_preload(SceneState::MainScene);
        }
    }

    fn fail_transition(&mut self, reason: String) {
        let Some(transition) = self.pending.take() else {
            return;
        };
        self.release_handles(&transition.load.assets.handles);
        self.abandon(transition.load.scene, reason);
    }

    fn abandon(&mut self, target: SceneState, reason: String) {
        error!("Transition to {} failed: {}", target, reason);
        self.phase = Phase::LoadFailed;
        self.engine.hide_loading_indicator();
        self.engine.display_message(LOAD_FAILED_MESSAGE);
        self.events.push(FlowEvent::TransitionFailed { to: target, reason });
    }

    fn release_handles(&mut self, handles: &[SceneHandle]) {
        for &handle in handles {
            self.engine.dispose_scene(handle);
        }
    }

    /// Dispose the current scene and any loaded-but-unused assets.
    pub fn shutdown(&mut self) {
        if let Some(mut active) = self.current.take()
            && active.dispose(&mut self.engine)
        {
            self.events.push(FlowEvent::SceneDisposed(active.scene.id()));
        }
        if let Some(transition) = self.pending.take() {
            self.release_handles(&transition.load.assets.handles);
        }
        if let Some(preload) = self.preload.take() {
            self.release_handles(&preload.assets.handles);
        }
        self.phase = Phase::Idle;
    }
}
