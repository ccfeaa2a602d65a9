//! Asset loading backends.
//!
//! The controller never blocks on a load. It submits [`LoadRequest`]s and
//! drains [`LoadResult`]s once per tick. [`LoadPipeline`] runs the engine's
//! [`AssetLoader`] on worker threads; [`InlineBackend`] runs it during
//! `submit`; [`ManualBackend`] lets a test decide when and how each request
//! completes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use framed_engine::{AssetBundle, AssetLoader, LoadError, LoadStage, SceneState};
use tracing::{debug, error};

/// One stage load to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    /// Identifies the request; echoed back in the result.
    pub ticket: u64,
    /// Scene being loaded.
    pub scene: SceneState,
    /// Stage of that scene.
    pub stage: LoadStage,
}

/// The answer to a [`LoadRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    /// Ticket of the originating request.
    pub ticket: u64,
    /// Scene that was loaded.
    pub scene: SceneState,
    /// Stage that was loaded.
    pub stage: LoadStage,
    /// The bundle, or why it could not be produced.
    pub outcome: Result<AssetBundle, LoadError>,
}

impl LoadResult {
    fn for_request(request: LoadRequest, outcome: Result<AssetBundle, LoadError>) -> Self {
        Self {
            ticket: request.ticket,
            scene: request.scene,
            stage: request.stage,
            outcome,
        }
    }
}

/// Where the controller sends load work.
pub trait LoadBackend {
    /// Queue a request. Returns `false` if the backend cannot accept it.
    fn submit(&mut self, request: LoadRequest) -> bool;

    /// Take every result that has completed since the last call.
    fn drain_results(&mut self) -> Vec<LoadResult>;
}

// ---------------------------------------------------------------------------
// LoadPipeline
// ---------------------------------------------------------------------------

/// Threaded loading pipeline.
///
/// Worker threads pull requests from a channel, call the loader, and push
/// results back. The main thread collects them with
/// [`drain_results`](LoadBackend::drain_results) each tick.
pub struct LoadPipeline {
    request_sender: Option<crossbeam_channel::Sender<LoadRequest>>,
    result_receiver: crossbeam_channel::Receiver<LoadResult>,
    worker_handles: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl LoadPipeline {
    /// Spawn `worker_count` loader threads sharing `loader`.
    pub fn new(worker_count: usize, loader: Arc<dyn AssetLoader>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<LoadRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count.max(1) {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            let loader = Arc::clone(&loader);
            let flight = Arc::clone(&in_flight);

            let spawned = std::thread::Builder::new()
                .name(format!("framed-loader-{index}"))
                .spawn(move || {
                    while let Ok(request) = rx.recv() {
                        debug!("Loading {} {}", request.scene, request.stage);
                        let outcome = loader.load(request.scene, request.stage);
                        flight.fetch_sub(1, Ordering::Relaxed);
                        let _ = tx.send(LoadResult::for_request(request, outcome));
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => error!("Failed to spawn loader thread {index}: {e}"),
            }
        }

        let request_sender = if handles.is_empty() {
            None
        } else {
            Some(request_tx)
        };

        Self {
            request_sender,
            result_receiver: result_rx,
            worker_handles: handles,
            in_flight,
        }
    }

    /// Number of requests queued or being loaded.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Stop accepting work and join the workers.
    pub fn shutdown(&mut self) {
        self.request_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl LoadBackend for LoadPipeline {
    fn submit(&mut self, request: LoadRequest) -> bool {
        let Some(sender) = &self.request_sender else {
            return false;
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(request).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn drain_results(&mut self) -> Vec<LoadResult> {
        self.result_receiver.try_iter().collect()
    }
}

impl Drop for LoadPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// InlineBackend
// ---------------------------------------------------------------------------

/// Runs the loader synchronously inside `submit`.
///
/// Results still only become visible on the next drain, so the controller
/// sees the same one-tick-later delivery as with [`LoadPipeline`].
pub struct InlineBackend<L> {
    loader: L,
    ready: Vec<LoadResult>,
}

impl<L: AssetLoader> InlineBackend<L> {
    /// Wraps `loader`.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            ready: Vec::new(),
        }
    }
}

impl<L: AssetLoader> LoadBackend for InlineBackend<L> {
    fn submit(&mut self, request: LoadRequest) -> bool {
        let outcome = self.loader.load(request.scene, request.stage);
        self.ready.push(LoadResult::for_request(request, outcome));
        true
    }

    fn drain_results(&mut self) -> Vec<LoadResult> {
        std::mem::take(&mut self.ready)
    }
}

// ---------------------------------------------------------------------------
// ManualBackend
// ---------------------------------------------------------------------------

/// Backend whose requests complete only when told to.
#[derive(Debug, Default)]
pub struct ManualBackend {
    pending: VecDeque<LoadRequest>,
    ready: Vec<LoadResult>,
    refuse: bool,
    next_handle: u64,
}

impl ManualBackend {
    /// Creates an empty backend that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `submit` fail.
    pub fn refuse_requests(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// Requests submitted and not yet completed, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &LoadRequest> {
        self.pending.iter()
    }

    /// Number of outstanding requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Complete the request with `ticket`. Returns `false` if there is none.
    pub fn complete(&mut self, ticket: u64, outcome: Result<AssetBundle, LoadError>) -> bool {
        let Some(pos) = self.pending.iter().position(|r| r.ticket == ticket) else {
            return false;
        };
        if let Some(request) = self.pending.remove(pos) {
            self.ready.push(LoadResult::for_request(request, outcome));
        }
        true
    }

    /// Complete the oldest request with `bundle`, assigning a fresh handle
    /// when the bundle has none. Returns the completed request.
    pub fn complete_next(&mut self, mut bundle: AssetBundle) -> Option<LoadRequest> {
        let request = self.pending.pop_front()?;
        if bundle.handle.is_none() {
            self.next_handle += 1;
            bundle.handle = Some(framed_engine::SceneHandle(self.next_handle));
        }
        self.ready.push(LoadResult::for_request(request, Ok(bundle)));
        Some(request)
    }

    /// Fail the oldest request with an asset load failure.
    pub fn fail_next(&mut self, reason: &str) -> Option<LoadRequest> {
        let request = self.pending.pop_front()?;
        let error = LoadError::AssetLoadFailure {
            scene: request.scene,
            stage: request.stage,
            reason: reason.to_string(),
        };
        self.ready.push(LoadResult::for_request(request, Err(error)));
        Some(request)
    }

    /// Complete every outstanding request with an empty bundle.
    pub fn complete_all(&mut self) -> usize {
        let mut count = 0;
        while self.complete_next(AssetBundle::default()).is_some() {
            count += 1;
        }
        count
    }
}

impl LoadBackend for ManualBackend {
    fn submit(&mut self, request: LoadRequest) -> bool {
        if self.refuse {
            return false;
        }
        self.pending.push_back(request);
        true
    }

    fn drain_results(&mut self) -> Vec<LoadResult> {
        std::mem::take(&mut self.ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framed_engine::{HeadlessLoader, WorldObject};
    use std::time::{Duration, Instant};

    fn request(ticket: u64, scene: SceneState, stage: LoadStage) -> LoadRequest {
        LoadRequest {
            ticket,
            scene,
            stage,
        }
    }

    #[test]
    fn test_pipeline_delivers_results() {
        let loader = HeadlessLoader::new()
            .with_bundle(
                SceneState::MarsScene,
                LoadStage::Environment,
                AssetBundle {
                    handle: None,
                    objects: vec![WorldObject::empty("gate")],
                    animations: vec![],
                },
            )
            .fail(SceneState::MarsScene, LoadStage::Characters);
        let mut pipeline = LoadPipeline::new(2, Arc::new(loader));

        assert!(pipeline.submit(request(1, SceneState::MarsScene, LoadStage::Environment)));
        assert!(pipeline.submit(request(2, SceneState::MarsScene, LoadStage::Characters)));

        let start = Instant::now();
        let mut results = Vec::new();
        while results.len() < 2 {
            results.extend(pipeline.drain_results());
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "pipeline did not answer within 5s"
            );
            std::thread::yield_now();
        }
        results.sort_by_key(|r| r.ticket);

        assert_eq!(results[0].outcome.as_ref().unwrap().objects.len(), 1);
        assert!(results[1].outcome.is_err());
        assert_eq!(pipeline.in_flight_count(), 0);
    }

    #[test]
    fn test_pipeline_refuses_after_shutdown() {
        let mut pipeline = LoadPipeline::new(1, Arc::new(HeadlessLoader::new()));
        pipeline.shutdown();
        assert!(!pipeline.submit(request(1, SceneState::Start, LoadStage::Environment)));
        assert_eq!(pipeline.in_flight_count(), 0);
    }

    #[test]
    fn test_inline_backend_answers_on_next_drain() {
        let mut backend = InlineBackend::new(HeadlessLoader::new());
        assert!(backend.submit(request(7, SceneState::Start, LoadStage::Environment)));
        let results = backend.drain_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ticket, 7);
        assert!(backend.drain_results().is_empty());
    }

    #[test]
    fn test_manual_backend_completes_in_order() {
        let mut backend = ManualBackend::new();
        backend.submit(request(1, SceneState::MainScene, LoadStage::Environment));
        backend.submit(request(2, SceneState::MainScene, LoadStage::Characters));
        assert!(backend.drain_results().is_empty());

        let done = backend.complete_next(AssetBundle::default()).unwrap();
        assert_eq!(done.ticket, 1);
        let results = backend.drain_results();
        assert!(results[0].outcome.as_ref().unwrap().handle.is_some());
        assert_eq!(backend.pending_count(), 1);

        assert!(backend.complete(2, Err(LoadError::Disconnected)));
        assert!(!backend.complete(2, Err(LoadError::Disconnected)));
    }

    #[test]
    fn test_manual_backend_refusal() {
        let mut backend = ManualBackend::new();
        backend.refuse_requests(true);
        assert!(!backend.submit(request(1, SceneState::Start, LoadStage::Environment)));
        assert_eq!(backend.pending_count(), 0);
    }
}
