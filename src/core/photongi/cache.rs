use super::barrier::*;
use super::params::PhotonGICacheParams;
use super::snapshot::CacheSnapshot;
use super::tracer::PhotonTracer;
use crate::core::error::*;
use crate::core::misc::*;
use crate::core::scene::Scene;
use crate::core::stats::*;

use log::*;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, RwLock};
use std::time::Instant;

static CACHE_REBUILDS: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("PhotonGI/Cache rebuilds"));
static CACHE_PHOTONS: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("PhotonGI/Photons traced"));
static PHOTONS_PER_PASS: LazyLock<StatRatio> =
    LazyLock::new(|| StatRatio::new("PhotonGI/Photons per pass"));

/// Photon based global illumination cache shared by every render thread.
///
/// The initial build happens in `preprocess` before any thread starts. When
/// refreshes are enabled, render threads periodically meet on a phase
/// barrier and one of them rebuilds the cache while the others wait.
pub struct PhotonGICache {
    params: PhotonGICacheParams,
    scene: Arc<dyn Scene>,
    tracer: Arc<dyn PhotonTracer>,

    snapshot: RwLock<Arc<CacheSnapshot>>,
    version: AtomicU64,
    pass: AtomicU32,
    last_update_spp: AtomicU64,

    barrier: PhaseBarrier,
    finished: AtomicBool,
    interrupted: AtomicBool,
    error: Mutex<Option<RenderError>>,
}

impl PhotonGICache {
    pub fn new(
        params: &PhotonGICacheParams,
        scene: &Arc<dyn Scene>,
        tracer: &Arc<dyn PhotonTracer>,
    ) -> Self {
        PhotonGICache {
            params: params.clone(),
            scene: scene.clone(),
            tracer: tracer.clone(),
            snapshot: RwLock::new(Arc::new(CacheSnapshot::empty(params.lookup_radius))),
            version: AtomicU64::new(0),
            pass: AtomicU32::new(0),
            last_update_spp: AtomicU64::new(0),
            barrier: PhaseBarrier::new(0),
            finished: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn get_params(&self) -> &PhotonGICacheParams {
        return &self.params;
    }

    fn trace_and_publish(&self, pass: u32, progress: &dyn ProgressCallback) -> Result<(), RenderError> {
        let start = Instant::now();
        let photons = self
            .tracer
            .trace(self.scene.as_ref(), &self.params, pass, progress)?;
        CACHE_PHOTONS.add(photons.len() as u64);
        PHOTONS_PER_PASS.add_num(photons.len() as u64);
        PHOTONS_PER_PASS.add_denom(1);
        let version = self.version.load(Ordering::SeqCst) + 1;
        let count = photons.len();
        let snapshot = Arc::new(CacheSnapshot::new(version, photons, self.params.lookup_radius));
        *self.snapshot.write().unwrap() = snapshot;
        self.version.store(version, Ordering::SeqCst);
        info!(
            "PhotonGI cache pass {}: {} photons in {:.3} secs",
            pass,
            count,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Builds the initial cache. Called once before render threads start.
    pub fn preprocess(&self, progress: &dyn ProgressCallback) -> Result<(), RenderError> {
        if self.get_version() > 0 {
            return Ok(());
        }
        info!("Building the PhotonGI cache");
        let result = self.trace_and_publish(0, progress);
        progress.done();
        return result;
    }

    /// Prepares the barrier for a render run with `thread_count` threads.
    pub fn start_run(&self, thread_count: usize) {
        self.barrier.reset(thread_count);
        self.interrupted.store(false, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
        *self.error.lock().unwrap() = None;
    }

    /// Makes pending and future rebuilds of this run no-ops so that
    /// stopping does not wait for a cache build.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        return self.snapshot.read().unwrap().clone();
    }

    pub fn get_version(&self) -> u64 {
        return self.version.load(Ordering::SeqCst);
    }

    pub fn get_last_update_spp(&self) -> u64 {
        return self.last_update_spp.load(Ordering::SeqCst);
    }

    /// True once a rebuild failed; render threads must exit.
    pub fn is_finished(&self) -> bool {
        return self.finished.load(Ordering::SeqCst);
    }

    pub fn take_error(&self) -> Option<RenderError> {
        return self.error.lock().unwrap().take();
    }

    fn is_update_due(&self, spp: u64) -> bool {
        let update_spp = self.params.update_spp as u64;
        if update_spp == 0 || self.is_finished() || self.interrupted.load(Ordering::SeqCst) {
            return false;
        }
        return spp >= self.last_update_spp.load(Ordering::SeqCst) + update_spp;
    }

    fn rebuild(&self, spp: u64) {
        if self.interrupted.load(Ordering::SeqCst) {
            return;
        }
        let pass = self.pass.fetch_add(1, Ordering::SeqCst) + 1;
        match self.trace_and_publish(pass, &NoProgress) {
            Ok(()) => {
                CACHE_REBUILDS.inc();
            }
            Err(e) => {
                error!("PhotonGI cache rebuild failed: {}", e);
                *self.error.lock().unwrap() = Some(e);
                self.finished.store(true, Ordering::SeqCst);
            }
        }
        self.last_update_spp.store(spp, Ordering::SeqCst);
    }

    /// Called by render thread `thread_index` after each sample with the
    /// current samples per pixel. Blocks on the barrier when a refresh is due.
    /// Returns true when the thread took part in a refresh.
    pub fn update(&self, thread_index: usize, spp: u64) -> bool {
        if !self.is_update_due(spp) {
            return false;
        }
        let role = self.barrier.arrive_and_wait(thread_index, || self.rebuild(spp));
        return role != PhaseRole::Withdrawn;
    }

    /// Withdraws a render thread from future refreshes. Safe to call more
    /// than once and without a pending refresh.
    pub fn finish_update(&self, thread_index: usize) {
        self.barrier.withdraw(thread_index);
    }

    pub fn get_active_thread_count(&self) -> usize {
        return self.barrier.get_active_count();
    }
}
