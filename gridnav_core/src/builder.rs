// Background graph builds with atomic publication.
//
// `NavGridBuilder` owns the graph currently published for queries, as an
// `Arc<AdjacencyGraph>` behind an `RwLock`. A rebuild samples into a fresh
// graph on a worker thread and, only if sampling succeeds, swaps the new
// `Arc` in under the write lock. Readers take a snapshot (`Arc` clone) and
// keep querying it for as long as they like; a swap never mutates a graph
// anyone can see.
//
// At most one build is in flight. `rebuild` first joins the previous worker,
// so builds for the same builder never overlap. There is no cooperative
// cancellation: a build runs to completion, and a failed build publishes
// nothing.
//
// See also: `sampler.rs` for the work done on the worker thread,
// `navigator.rs` for queries against a snapshot.

use crate::config::{PathConfig, SamplerConfig};
use crate::error::BuildError;
use crate::graph::AdjacencyGraph;
use crate::navigator::Navigator;
use crate::oracle::GeometryOracle;
use crate::sampler::TerrainSampler;
use crate::types::WorldBox;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, warn};

/// Called on the worker thread right after a graph is published.
pub type BuildCallback = Arc<dyn Fn(&Arc<AdjacencyGraph>) + Send + Sync>;

/// State shared between the builder and its worker threads.
struct Shared {
    published: RwLock<Arc<AdjacencyGraph>>,
    generation: AtomicU64,
}

impl Shared {
    fn publish(&self, graph: Arc<AdjacencyGraph>) {
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = graph;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds graphs for one region at a time and publishes them.
pub struct NavGridBuilder<O> {
    oracle: Arc<O>,
    sampler: TerrainSampler,
    shared: Arc<Shared>,
    in_flight: Mutex<Option<JoinHandle<Result<(), BuildError>>>>,
    on_publish: Option<BuildCallback>,
}

impl<O> NavGridBuilder<O>
where
    O: GeometryOracle + Send + 'static,
{
    /// A builder with an empty published graph.
    pub fn new(oracle: Arc<O>, config: SamplerConfig) -> Self {
        Self {
            oracle,
            sampler: TerrainSampler::new(config),
            shared: Arc::new(Shared {
                published: RwLock::new(Arc::new(AdjacencyGraph::new())),
                generation: AtomicU64::new(0),
            }),
            in_flight: Mutex::new(None),
            on_publish: None,
        }
    }

    /// Register a callback fired after every successful publish.
    pub fn with_callback(
        mut self,
        callback: impl Fn(&Arc<AdjacencyGraph>) + Send + Sync + 'static,
    ) -> Self {
        self.on_publish = Some(Arc::new(callback));
        self
    }

    /// Start a build of `region` on a worker thread. Waits for any build
    /// still in flight first. That build's result is dropped (its worker has
    /// already logged a failure); `wait` only reports the newest build.
    pub fn rebuild(&self, region: WorldBox) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            if !previous.is_finished() {
                warn!(%region, "rebuild waiting for in-flight build");
            }
            let _ = previous.join();
        }

        let oracle = Arc::clone(&self.oracle);
        let sampler = self.sampler.clone();
        let shared = Arc::clone(&self.shared);
        let on_publish = self.on_publish.clone();
        *slot = Some(thread::spawn(move || {
            let started = Instant::now();
            match sampler.sample_region(oracle.as_ref(), &region) {
                Ok(graph) => {
                    let graph = Arc::new(graph);
                    shared.publish(Arc::clone(&graph));
                    info!(
                        %region,
                        nodes = graph.node_count(),
                        edges = graph.edge_count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "graph published"
                    );
                    if let Some(callback) = on_publish {
                        callback(&graph);
                    }
                    Ok(())
                }
                Err(err) => {
                    error!(%region, %err, "build aborted; keeping previous graph");
                    Err(err)
                }
            }
        }));
    }

    /// Block until the in-flight build (if any) finishes, returning its
    /// result. `Ok` when nothing was in flight.
    pub fn wait(&self) -> Result<(), BuildError> {
        let handle = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => handle.join().unwrap_or(Err(BuildError::WorkerPanicked)),
            None => Ok(()),
        }
    }

    /// `rebuild` followed by `wait`.
    pub fn rebuild_blocking(&self, region: WorldBox) -> Result<(), BuildError> {
        self.rebuild(region);
        self.wait()
    }

    pub fn is_building(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<O> NavGridBuilder<O> {
    /// The currently published graph.
    pub fn snapshot(&self) -> Arc<AdjacencyGraph> {
        Arc::clone(
            &self
                .shared
                .published
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Publish a graph built elsewhere, e.g. decoded from disk.
    pub fn publish(&self, graph: AdjacencyGraph) {
        self.shared.publish(Arc::new(graph));
    }

    /// Number of graphs published so far.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// A navigator over the current snapshot.
    pub fn navigator(&self, config: PathConfig) -> Navigator {
        Navigator::new(self.snapshot(), config)
    }
}

impl<O> Drop for NavGridBuilder<O> {
    fn drop(&mut self) {
        let slot = self
            .in_flight
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            let _ = handle.join();
        }
    }
}
