use super::light_transport::*;
use crate::core::film::*;
use crate::core::photongi::*;
use crate::core::sampler::*;
use crate::core::scene::Scene;
use crate::core::stats::*;
use crate::core::variance_clamping::*;
use crate::samplers::SamplerVariant;

use std::sync::{Arc, LazyLock};

static EYE_PATHS: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("Integrator/Eye paths traced"));
static LIGHT_PATHS: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("Integrator/Light paths traced"));

/// Per render thread state of the path tracer.
pub struct PathTracerThreadState {
    pub thread_index: usize,
    pub eye_sampler: SamplerVariant,
    pub light_sampler: Option<SamplerVariant>,
    eye_result: SampleResult,
    light_results: Vec<SampleResult>,
    photon_gi: Option<Arc<CacheSnapshot>>,
    photon_gi_version: u64,
}

impl PathTracerThreadState {
    pub fn get_eye_result(&self) -> &SampleResult {
        return &self.eye_result;
    }
}

pub struct PathTracer {
    transport: Arc<dyn LightTransport>,
    variance_clamping: VarianceClamping,
    hybrid_back_forward: bool,
    radiance_group_count: usize,
}

impl PathTracer {
    pub fn new(
        transport: &Arc<dyn LightTransport>,
        variance_clamping: &VarianceClamping,
        hybrid_back_forward: bool,
        radiance_group_count: usize,
    ) -> Self {
        PathTracer {
            transport: transport.clone(),
            variance_clamping: *variance_clamping,
            hybrid_back_forward,
            radiance_group_count,
        }
    }

    pub fn is_hybrid_back_forward(&self) -> bool {
        return self.hybrid_back_forward;
    }

    pub fn init_thread_state(
        &self,
        thread_index: usize,
        mut eye_sampler: SamplerVariant,
        light_sampler: Option<SamplerVariant>,
    ) -> PathTracerThreadState {
        let eye_domain = match eye_sampler.get_type() {
            SamplerType::Metropolis => SampleDomain::ScreenNormalizedOnly,
            _ => SampleDomain::PixelNormalizedOnly,
        };
        eye_sampler.set_thread_index(thread_index);
        eye_sampler.request_samples(eye_domain, self.transport.eye_sample_size());

        let light_sampler = if self.hybrid_back_forward {
            light_sampler.map(|mut s| {
                s.set_thread_index(thread_index);
                s.request_samples(
                    SampleDomain::ScreenNormalizedOnly,
                    self.transport.light_sample_size(),
                );
                s
            })
        } else {
            None
        };

        PathTracerThreadState {
            thread_index,
            eye_sampler,
            light_sampler,
            eye_result: SampleResult::new(self.radiance_group_count),
            light_results: Vec::new(),
            photon_gi: None,
            photon_gi_version: 0,
        }
    }

    fn refresh_photon_gi(&self, cache: Option<&PhotonGICache>, state: &mut PathTracerThreadState) {
        if let Some(cache) = cache {
            let version = cache.get_version();
            if state.photon_gi.is_none() || version != state.photon_gi_version {
                state.photon_gi = Some(cache.snapshot());
                state.photon_gi_version = version;
            }
        }
    }

    /// Traces one eye path and, in hybrid mode, one light path, commits them
    /// to the film through the samplers and counts them.
    pub fn render_sample(
        &self,
        scene: &dyn Scene,
        film: &Film,
        cache: Option<&PhotonGICache>,
        state: &mut PathTracerThreadState,
    ) {
        self.refresh_photon_gi(cache, state);
        let ctx = TraceContext {
            scene,
            photon_gi: state.photon_gi.as_deref(),
            thread_index: state.thread_index,
        };

        // Eye path
        let p = state.eye_sampler.get_film_position();
        let result = &mut state.eye_result;
        result.reset();
        result.film_x = p.x;
        result.film_y = p.y;
        result.screen_normalized = false;
        self.transport
            .trace_eye_path(&ctx, &mut state.eye_sampler, result);
        self.variance_clamping.clamp_sample_result(result);
        state
            .eye_sampler
            .next_sample(std::slice::from_ref(&state.eye_result));
        film.add_sample_count(1, 0);
        EYE_PATHS.inc();

        // Light path
        if let Some(light_sampler) = state.light_sampler.as_mut() {
            state.light_results.clear();
            self.transport
                .trace_light_path(&ctx, light_sampler, &mut state.light_results);
            for r in state.light_results.iter_mut() {
                r.screen_normalized = true;
                self.variance_clamping.clamp_sample_result(r);
            }
            light_sampler.next_sample(&state.light_results);
            film.add_sample_count(0, 1);
            LIGHT_PATHS.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spectrum::*;
    use crate::samplers::create_sampler;

    struct EmptyScene;

    impl Scene for EmptyScene {
        fn name(&self) -> &str {
            return "empty";
        }
        fn as_any(&self) -> &dyn std::any::Any {
            return self;
        }
    }

    struct ConstantTransport;

    impl LightTransport for ConstantTransport {
        fn eye_sample_size(&self) -> usize {
            return 4;
        }
        fn light_sample_size(&self) -> usize {
            return 4;
        }
        fn trace_eye_path(
            &self,
            _ctx: &TraceContext,
            sampler: &mut dyn Sampler,
            result: &mut SampleResult,
        ) {
            let _ = sampler.get_sample(2);
            result.radiance[0] = Spectrum::from(100.0);
        }
        fn trace_light_path(
            &self,
            _ctx: &TraceContext,
            sampler: &mut dyn Sampler,
            results: &mut Vec<SampleResult>,
        ) {
            let mut r = SampleResult::new(1);
            r.film_x = sampler.get_sample(2) * 4.0;
            r.film_y = sampler.get_sample(3) * 4.0;
            r.radiance[0] = Spectrum::from(1.0);
            r.is_caustic_path = true;
            results.push(r);
        }
    }

    #[test]
    fn test_001() {
        let film = Arc::new(Film::new(4, 4, &FilmChannel::default_set(1)));
        let transport: Arc<dyn LightTransport> = Arc::new(ConstantTransport);
        let clamping = VarianceClamping::new(4.0);
        let tracer = PathTracer::new(&transport, &clamping, true, 1);
        let params = SamplerParams::default();

        let shared = create_sampler_shared_data(SamplerType::Random, &film, &params, 1);
        let eye = create_sampler(SamplerType::Random, &params, &film, &shared, 1).unwrap();
        let light_params = params.light_sampler_params();
        let light = create_sampler(
            SamplerType::Metropolis,
            &light_params,
            &film,
            &SamplerSharedData::Metropolis,
            2,
        )
        .unwrap();
        let mut state = tracer.init_thread_state(0, eye, Some(light));
        assert!(state.light_sampler.is_some());

        for _ in 0..16 {
            tracer.render_sample(&EmptyScene, &film, None, &mut state);
        }
        assert_eq!(film.get_total_eye_sample_count(), 16);
        assert_eq!(film.get_total_light_sample_count(), 16);
        // eye radiance is clamped to the bound, sqrt(4)
        let r = state.get_eye_result().radiance[0];
        assert!((r.y() - 2.0).abs() < 1e-4);
        let v = film
            .get_pixel_value(0, 0, &FilmChannel::RadiancePerPixelNormalized(0))
            .unwrap();
        assert!((v[1] / v[3] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_002() {
        // without hybrid mode the light sampler is dropped
        let film = Arc::new(Film::new(2, 2, &FilmChannel::default_set(1)));
        let transport: Arc<dyn LightTransport> = Arc::new(ConstantTransport);
        let tracer = PathTracer::new(&transport, &VarianceClamping::new(0.0), false, 1);
        let params = SamplerParams::default();
        let shared = create_sampler_shared_data(SamplerType::Sobol, &film, &params, 1);
        let eye = create_sampler(SamplerType::Sobol, &params, &film, &shared, 1).unwrap();
        let light = create_sampler(
            SamplerType::Metropolis,
            &params,
            &film,
            &SamplerSharedData::Metropolis,
            2,
        )
        .unwrap();
        let mut state = tracer.init_thread_state(0, eye, Some(light));
        assert!(state.light_sampler.is_none());
        tracer.render_sample(&EmptyScene, &film, None, &mut state);
        assert_eq!(film.get_total_light_sample_count(), 0);
        assert_eq!(film.get_total_eye_sample_count(), 1);
    }
}
