use super::cancel::CancellationToken;
use super::render_thread::*;
use crate::core::config::*;
use crate::core::error::*;
use crate::core::film::*;
use crate::core::integrator::*;
use crate::core::misc::*;
use crate::core::photongi::*;
use crate::core::sampler::*;
use crate::core::scene::Scene;

use log::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Stopped => "stopped",
            EngineState::Running => "running",
            EngineState::Paused => "paused",
        };
        write!(f, "{}", name)
    }
}

/// Multi-threaded CPU path tracing engine.
///
/// `start` spawns one render thread per configured thread. They sample until
/// the film converges or the engine is stopped. The film and the photon GI
/// cache outlive a run: a stopped engine can be started again and keeps
/// accumulating into the same film.
pub struct RenderEngine {
    config: RenderConfig,
    scene: Arc<dyn Scene>,
    transport: Arc<dyn LightTransport>,
    photon_tracer: Option<Arc<dyn PhotonTracer>>,
    preprocess_progress: Arc<dyn ProgressCallback>,

    film: Arc<Film>,
    photon_gi: Option<Arc<PhotonGICache>>,

    state: EngineState,
    threads: Vec<RenderThread>,
    pause: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl RenderEngine {
    pub fn new(
        config: &RenderConfig,
        scene: &Arc<dyn Scene>,
        transport: &Arc<dyn LightTransport>,
        photon_tracer: Option<Arc<dyn PhotonTracer>>,
    ) -> Self {
        RenderEngine {
            config: config.clone(),
            scene: scene.clone(),
            transport: transport.clone(),
            photon_tracer,
            preprocess_progress: Arc::new(NoProgress),
            film: Arc::new(config.create_film()),
            photon_gi: None,
            state: EngineState::Stopped,
            threads: Vec::new(),
            pause: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    /// Continues rendering into a film restored from disk. Only possible on a
    /// stopped engine and with a film of the configured size.
    pub fn set_film(&mut self, mut film: Film) -> Result<(), RenderError> {
        if self.state != EngineState::Stopped {
            return Err(RenderError::invalid_state("the film can only be replaced when stopped"));
        }
        if film.get_width() != self.config.film_width || film.get_height() != self.config.film_height
        {
            return Err(RenderError::Config(format!(
                "Film size {}x{} does not match the configured {}x{}",
                film.get_width(),
                film.get_height(),
                self.config.film_width,
                self.config.film_height
            )));
        }
        film.set_halt_conditions(&self.config.halt);
        self.film = Arc::new(film);
        return Ok(());
    }

    /// Progress of the photon GI cache build done by `start`.
    pub fn set_preprocess_progress(&mut self, progress: Arc<dyn ProgressCallback>) {
        self.preprocess_progress = progress;
    }

    pub fn get_config(&self) -> &RenderConfig {
        return &self.config;
    }

    pub fn get_state(&self) -> EngineState {
        return self.state;
    }

    pub fn get_film(&self) -> Arc<Film> {
        return self.film.clone();
    }

    pub fn get_photon_gi_cache(&self) -> Option<Arc<PhotonGICache>> {
        return self.photon_gi.clone();
    }

    /// Number of render threads of the current run, 0 when stopped.
    pub fn get_thread_count(&self) -> usize {
        return self.threads.len();
    }

    fn prepare_photon_gi(&mut self) -> Result<Option<Arc<PhotonGICache>>, RenderError> {
        let params = &self.config.photongi;
        if !params.enabled {
            return Ok(None);
        }
        if self.photon_gi.is_none() {
            let tracer = match self.photon_tracer.as_ref() {
                Some(tracer) => tracer,
                None => {
                    return Err(RenderError::config(
                        "path.photongi.enable requires a photon tracer",
                    ));
                }
            };
            self.photon_gi = Some(Arc::new(PhotonGICache::new(params, &self.scene, tracer)));
        }
        let cache = self.photon_gi.clone();
        if let Some(cache) = cache.as_ref() {
            cache.preprocess(self.preprocess_progress.as_ref())?;
        }
        return Ok(cache);
    }

    pub fn start(&mut self) -> Result<(), RenderError> {
        if self.state != EngineState::Stopped {
            return Err(RenderError::InvalidState(format!(
                "start() called on a {} engine",
                self.state
            )));
        }
        self.config.validate()?;

        let thread_count = self.config.get_thread_count();
        let path_tracer = Arc::new(PathTracer::new(
            &self.transport,
            &self.config.get_variance_clamping(),
            self.config.hybrid_back_forward,
            self.config.radiance_group_count,
        ));
        let shared = create_sampler_shared_data(
            self.config.sampler_type,
            &self.film,
            &self.config.sampler_params,
            self.config.seed,
        );
        let run_epoch = self.film.get_total_sample_count();
        let mut states = Vec::with_capacity(thread_count);
        for i in 0..thread_count {
            states.push(create_thread_state(
                i,
                run_epoch,
                &self.config,
                &self.film,
                &shared,
                &path_tracer,
            )?);
        }

        let photon_gi = self.prepare_photon_gi()?;
        if let Some(cache) = photon_gi.as_ref() {
            cache.start_run(thread_count);
        }

        self.cancel = CancellationToken::new();
        self.pause.store(false, Ordering::SeqCst);
        let ctx = Arc::new(RenderThreadContext {
            scene: self.scene.clone(),
            film: self.film.clone(),
            path_tracer,
            photon_gi: photon_gi.clone(),
            pause: self.pause.clone(),
            cancel: self.cancel.clone(),
        });

        info!(
            "Starting {} engine: {} threads, {} sampler, film {}x{}",
            self.config.engine_type,
            thread_count,
            self.config.sampler_type,
            self.film.get_width(),
            self.film.get_height()
        );
        self.film.render_start();
        for (i, state) in states.into_iter().enumerate() {
            match RenderThread::spawn(i, &ctx, state) {
                Ok(thread) => self.threads.push(thread),
                Err(e) => {
                    error!("{}", e);
                    self.abort_start(i + 1, thread_count, photon_gi.as_deref());
                    return Err(e);
                }
            }
        }
        self.state = EngineState::Running;
        return Ok(());
    }

    // Undoes a partial start. The thread that failed to spawn withdrew from
    // the cache barrier when its closure was dropped; threads
    // `spawned..thread_count` were never created and are withdrawn here.
    fn abort_start(
        &mut self,
        spawned: usize,
        thread_count: usize,
        photon_gi: Option<&PhotonGICache>,
    ) {
        self.cancel.cancel();
        if let Some(cache) = photon_gi {
            cache.interrupt();
            for i in spawned..thread_count {
                cache.finish_update(i);
            }
        }
        if let Err(e) = self.join_threads() {
            warn!("While aborting the start: {}", e);
        }
        self.film.render_end();
        self.state = EngineState::Stopped;
    }

    pub fn pause(&mut self) -> Result<(), RenderError> {
        match self.state {
            EngineState::Stopped => {
                return Err(RenderError::invalid_state("pause() called on a stopped engine"));
            }
            EngineState::Paused => {}
            EngineState::Running => {
                self.pause.store(true, Ordering::SeqCst);
                self.film.render_end();
                self.state = EngineState::Paused;
                info!("Engine paused");
            }
        }
        return Ok(());
    }

    pub fn resume(&mut self) -> Result<(), RenderError> {
        match self.state {
            EngineState::Stopped => {
                return Err(RenderError::invalid_state("resume() called on a stopped engine"));
            }
            EngineState::Running => {}
            EngineState::Paused => {
                self.film.render_start();
                self.pause.store(false, Ordering::SeqCst);
                self.state = EngineState::Running;
                info!("Engine resumed");
            }
        }
        return Ok(());
    }

    fn join_threads(&mut self) -> Result<(), RenderError> {
        let mut result = Ok(());
        for thread in self.threads.iter_mut() {
            if let Err(e) = thread.join() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        self.threads.clear();
        return result;
    }

    // Joins every thread and flushes the film. Threads must already be on
    // their way out.
    fn finish(&mut self) -> Result<(), RenderError> {
        let joined = self.join_threads();
        self.pause.store(false, Ordering::SeqCst);
        if self.state == EngineState::Running {
            self.film.render_end();
        }
        let convergence = self.film.update_convergence();
        self.state = EngineState::Stopped;
        info!(
            "Engine stopped: {} samples, {:.2} secs, convergence {}",
            self.film.get_total_sample_count(),
            self.film.get_elapsed_time(),
            convergence
        );
        if let Some(e) = self.photon_gi.as_ref().and_then(|c| c.take_error()) {
            return Err(e);
        }
        return joined;
    }

    /// Cancels and joins every render thread. A no-op on a stopped engine.
    pub fn stop(&mut self) -> Result<(), RenderError> {
        if self.state == EngineState::Stopped {
            return Ok(());
        }
        self.cancel.cancel();
        if let Some(cache) = self.photon_gi.as_ref() {
            cache.interrupt();
        }
        return self.finish();
    }

    /// Blocks until every render thread exited on its own, which happens once
    /// the halt conditions are met, then stops the engine. Without halt
    /// conditions this blocks until another thread cancels the run.
    pub fn wait_for_done(&mut self) -> Result<(), RenderError> {
        if self.state == EngineState::Stopped {
            return Ok(());
        }
        return self.finish();
    }

    /// True once every render thread of the current run has exited.
    pub fn has_done(&self) -> bool {
        return self.threads.iter().all(|t| t.has_done());
    }

    pub fn get_rendering_time(&self) -> f64 {
        return self.film.get_elapsed_time();
    }

    pub fn get_total_samples_per_second(&self) -> f64 {
        let time = self.get_rendering_time();
        if time <= 0.0 {
            return 0.0;
        }
        return self.film.get_total_sample_count() as f64 / time;
    }

    /// A token that stops the sampling of the current run when cancelled.
    /// `stop` still has to be called to join the threads.
    pub fn get_cancellation_token(&self) -> CancellationToken {
        return self.cancel.clone();
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Error while stopping the engine: {}", e);
        }
    }
}
