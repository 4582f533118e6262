use super::cancel::CancellationToken;
use crate::core::base::*;
use crate::core::config::*;
use crate::core::error::*;
use crate::core::film::*;
use crate::core::integrator::*;
use crate::core::misc::*;
use crate::core::photongi::*;
use crate::core::rng::*;
use crate::core::sampler::*;
use crate::core::scene::Scene;
use crate::samplers::create_sampler;

use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Everything the render threads of one engine run share.
pub struct RenderThreadContext {
    pub scene: Arc<dyn Scene>,
    pub film: Arc<Film>,
    pub path_tracer: Arc<PathTracer>,
    pub photon_gi: Option<Arc<PhotonGICache>>,
    pub pause: Arc<AtomicBool>,
    pub cancel: CancellationToken,
}

/// Builds the samplers of render thread `index`. Their seeds are drawn from a
/// per-thread RNG seeded with `seed_base + 1 + index`, then mixed with
/// `run_epoch`, the number of samples the film already holds. A fresh film
/// has epoch 0; a restarted or resumed run gets new sample streams.
pub fn create_thread_state(
    index: usize,
    run_epoch: u64,
    config: &RenderConfig,
    film: &Arc<Film>,
    shared: &SamplerSharedData,
    path_tracer: &PathTracer,
) -> Result<PathTracerThreadState, RenderError> {
    let mut rng = RNG::new_sequence(config.seed as u64 + 1 + index as u64);
    let epoch = mix_bits(run_epoch);
    let eye_seed = rng.uniform_uint32() as u64 ^ epoch;
    let light_seed = rng.uniform_uint32() as u64 ^ epoch;

    let eye_sampler = create_sampler(
        config.sampler_type,
        &config.sampler_params,
        film,
        shared,
        eye_seed,
    )?;
    let light_sampler = if path_tracer.is_hybrid_back_forward() {
        Some(create_sampler(
            SamplerType::Metropolis,
            &config.sampler_params.light_sampler_params(),
            film,
            &SamplerSharedData::Metropolis,
            light_seed,
        )?)
    } else {
        None
    };
    return Ok(path_tracer.init_thread_state(index, eye_sampler, light_sampler));
}

// Runs when the thread exits for any reason, panics included, so that the
// photon cache barrier never waits for a thread that is gone.
struct ThreadExitGuard {
    index: usize,
    done: Arc<AtomicBool>,
    photon_gi: Option<Arc<PhotonGICache>>,
}

impl Drop for ThreadExitGuard {
    fn drop(&mut self) {
        if let Some(cache) = self.photon_gi.as_ref() {
            cache.finish_update(self.index);
        }
        self.done.store(true, Ordering::SeqCst);
        debug!("Render thread {} done", self.index);
    }
}

fn render_loop(index: usize, ctx: &RenderThreadContext, state: &mut PathTracerThreadState) {
    let pixel_count = usize::max(1, ctx.film.get_pixel_count()) as u64;
    loop {
        while ctx.pause.load(Ordering::SeqCst) && !ctx.cancel.is_cancelled() {
            thread::sleep(PAUSE_POLL_INTERVAL);
        }
        if ctx.cancel.is_cancelled() {
            break;
        }

        ctx.path_tracer.render_sample(
            ctx.scene.as_ref(),
            &ctx.film,
            ctx.photon_gi.as_deref(),
            state,
        );

        if ctx.film.update_convergence() >= 1.0 || ctx.cancel.is_cancelled() {
            break;
        }

        if let Some(cache) = ctx.photon_gi.as_ref() {
            let spp = ctx.film.get_total_eye_sample_count() / pixel_count;
            cache.update(index, spp);
            if cache.is_finished() {
                break;
            }
        }
    }
}

pub struct RenderThread {
    index: usize,
    handle: Option<JoinHandle<()>>,
    done: Arc<AtomicBool>,
}

impl RenderThread {
    pub fn spawn(
        index: usize,
        ctx: &Arc<RenderThreadContext>,
        mut state: PathTracerThreadState,
    ) -> Result<Self, RenderError> {
        let done = Arc::new(AtomicBool::new(false));
        let guard = ThreadExitGuard {
            index,
            done: done.clone(),
            photon_gi: ctx.photon_gi.clone(),
        };
        let ctx = ctx.clone();
        let handle = thread::Builder::new()
            .name(format!("render-{}", index))
            .spawn(move || {
                let _guard = guard;
                render_loop(index, &ctx, &mut state);
            })
            .map_err(|source| RenderError::ThreadSpawn { index, source })?;
        debug!("Render thread {} started", index);
        Ok(RenderThread {
            index,
            handle: Some(handle),
            done,
        })
    }

    pub fn get_index(&self) -> usize {
        return self.index;
    }

    pub fn has_done(&self) -> bool {
        return self.done.load(Ordering::SeqCst);
    }

    pub fn join(&mut self) -> Result<(), RenderError> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Render thread {} panicked", self.index);
                return Err(RenderError::ThreadPanicked(self.index));
            }
        }
        return Ok(());
    }
}
