use crate::core::base::*;
use crate::core::film::*;
use crate::core::misc::*;
use crate::core::rng::*;
use crate::core::sampler::*;
use crate::core::stats::*;

use std::sync::{Arc, LazyLock};

static ACCEPTED_MUTATIONS: LazyLock<StatPercent> =
    LazyLock::new(|| StatPercent::new("Metropolis/Accepted mutations"));
static FORCED_LARGE_STEPS: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("Metropolis/Large steps forced by rejections"));

// Standard deviation of small step mutations outside the image plane.
const SMALL_STEP_SIGMA: Float = 0.01;

#[derive(Debug, PartialEq, Default, Clone)]
pub struct PrimarySample {
    pub value: Float,
    pub last_modification_iteration: i64,
    pub value_backup: Float,
    pub modify_backup: i64,
}

impl PrimarySample {
    pub fn backup(&mut self) {
        self.value_backup = self.value;
        self.modify_backup = self.last_modification_iteration;
    }
    pub fn restore(&mut self) {
        self.value = self.value_backup;
        self.last_modification_iteration = self.modify_backup;
    }
}

/// Primary sample space Metropolis sampler.
///
/// Each `next_sample` call is one Markov chain step: the proposed path is
/// accepted with probability `min(1, L_new / L_cur)` and both the proposed and
/// the current path are splatted with their expected weights.
pub struct MetropolisSampler {
    base: BaseSampler,
    params: SamplerParams,
    rng: RNG,

    x: Vec<PrimarySample>,
    current_iteration: i64,
    large_step: bool,
    last_large_iteration: i64,

    current_results: Vec<SampleResult>,
    current_luminance: Float,
    initialized: bool,
    consecutive_rejects: u32,
    large_step_luminance_sum: f64,
    large_step_count: u64,
}

impl MetropolisSampler {
    pub fn new(film: &Arc<Film>, params: &SamplerParams, seed: u64) -> Self {
        MetropolisSampler {
            base: BaseSampler::new(film),
            params: params.clone(),
            rng: RNG::new_sequence(seed),
            x: Vec::new(),
            current_iteration: 0,
            large_step: true,
            last_large_iteration: 0,
            current_results: Vec::new(),
            current_luminance: 0.0,
            initialized: false,
            consecutive_rejects: 0,
            large_step_luminance_sum: 0.0,
            large_step_count: 0,
        }
    }

    pub fn start_iteration(&mut self) {
        self.current_iteration += 1;
        let forced = self.consecutive_rejects >= self.params.max_consecutive_reject;
        if forced {
            FORCED_LARGE_STEPS.inc();
            self.consecutive_rejects = 0;
        }
        self.large_step = forced || self.rng.uniform_float() < self.params.large_step_rate;
    }

    pub fn accept(&mut self) {
        if self.large_step {
            self.last_large_iteration = self.current_iteration;
        }
    }

    pub fn reject(&mut self) {
        for xi in &mut self.x {
            if xi.last_modification_iteration == self.current_iteration {
                xi.restore();
            }
        }
        self.current_iteration -= 1;
    }

    pub fn is_large_step(&self) -> bool {
        return self.large_step;
    }

    pub fn get_consecutive_rejects(&self) -> u32 {
        return self.consecutive_rejects;
    }

    /// Mean luminance of the large steps seen so far.
    pub fn get_normalization(&self) -> Float {
        if self.large_step_count == 0 {
            return 0.0;
        }
        return (self.large_step_luminance_sum / self.large_step_count as f64) as Float;
    }

    fn get_sigma(&self, index: usize) -> Float {
        if index < 2 && self.params.image_samples {
            return self.params.image_mutation_rate;
        }
        return SMALL_STEP_SIGMA;
    }

    fn ensure_ready(&mut self, index: usize) {
        if index >= self.x.len() {
            self.x.resize(index + 1, PrimarySample::default());
        }
        let sigma = self.get_sigma(index);
        let xi = &mut self.x[index];

        // Reset the sample if a large step took place in the meantime
        if xi.last_modification_iteration < self.last_large_iteration {
            xi.value = self.rng.uniform_float();
            xi.last_modification_iteration = self.last_large_iteration;
        }

        xi.backup();
        if self.large_step {
            xi.value = self.rng.uniform_float();
        } else {
            let n_small = self.current_iteration - xi.last_modification_iteration;
            let normal_sample = SQRT_2 * erf_inv(2.0 * self.rng.uniform_float() - 1.0);
            let eff_sigma = sigma * Float::sqrt(n_small as Float);
            xi.value += normal_sample * eff_sigma;
            xi.value -= Float::floor(xi.value);
            xi.value = Float::min(xi.value, ONE_MINUS_EPSILON);
        }
        xi.last_modification_iteration = self.current_iteration;
    }

    fn is_counted(&self, result: &SampleResult) -> bool {
        return !self.params.add_only_caustics || result.is_caustic_path;
    }

    fn path_luminance(&self, results: &[SampleResult]) -> Float {
        return results
            .iter()
            .filter(|r| self.is_counted(r))
            .map(|r| r.luminance())
            .filter(|l| l.is_finite() && *l > 0.0)
            .sum();
    }

    fn splat(&self, results: &[SampleResult], weight: Float) {
        for r in results.iter().filter(|r| self.is_counted(r)) {
            self.base.commit_weighted(r, weight);
        }
    }
}

impl Sampler for MetropolisSampler {
    fn get_type(&self) -> SamplerType {
        return SamplerType::Metropolis;
    }

    fn set_thread_index(&mut self, index: usize) {
        self.base.thread_index = index;
    }

    fn request_samples(&mut self, domain: SampleDomain, size: usize) {
        self.base.request_samples(domain, size);
        self.x.clear();
        self.current_iteration = 0;
        self.last_large_iteration = 0;
        self.start_iteration();
        self.large_step = true;
    }

    fn get_sample(&mut self, index: usize) -> Float {
        self.ensure_ready(index);
        return self.x[index].value;
    }

    fn get_film_position(&mut self) -> Point2f {
        let u0 = self.get_sample(0);
        let u1 = self.get_sample(1);
        return self.base.film_position(None, u0, u1);
    }

    fn next_sample(&mut self, results: &[SampleResult]) {
        let proposed_luminance = self.path_luminance(results);
        if self.large_step {
            self.large_step_luminance_sum += proposed_luminance as f64;
            self.large_step_count += 1;
        }

        if !self.initialized {
            self.current_results = results.to_vec();
            self.current_luminance = proposed_luminance;
            self.initialized = true;
            self.accept();
        } else {
            let b = self.get_normalization();
            let accept = if self.current_luminance > 0.0 {
                Float::min(1.0, proposed_luminance / self.current_luminance)
            } else {
                1.0
            };

            if accept > 0.0 && proposed_luminance > 0.0 {
                self.splat(results, accept / proposed_luminance * b);
            }
            if accept < 1.0 && self.current_luminance > 0.0 {
                self.splat(
                    &self.current_results,
                    (1.0 - accept) / self.current_luminance * b,
                );
            }

            ACCEPTED_MUTATIONS.add_denom(1);
            if self.rng.uniform_float() < accept {
                self.accept();
                self.current_results.clear();
                self.current_results.extend_from_slice(results);
                self.current_luminance = proposed_luminance;
                self.consecutive_rejects = 0;
                ACCEPTED_MUTATIONS.add_num(1);
            } else {
                self.reject();
                self.consecutive_rejects += 1;
            }
        }

        self.start_iteration();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spectrum::*;

    fn create_sampler(params: &SamplerParams) -> (Arc<Film>, MetropolisSampler) {
        let film = Arc::new(Film::new(4, 4, &FilmChannel::default_set(1)));
        let mut sampler = MetropolisSampler::new(&film, params, 7);
        sampler.request_samples(SampleDomain::ScreenNormalizedOnly, 4);
        return (film, sampler);
    }

    #[test]
    fn test_001() {
        let mut s = PrimarySample {
            value: 0.25,
            last_modification_iteration: 3,
            ..Default::default()
        };
        s.backup();
        s.value = 0.75;
        s.last_modification_iteration = 4;
        s.restore();
        assert_eq!(s.value, 0.25);
        assert_eq!(s.last_modification_iteration, 3);
    }

    #[test]
    fn test_002() {
        // constant luminance: every mutation is accepted, each step splats one unit
        let (film, mut sampler) = create_sampler(&SamplerParams::default());
        assert!(sampler.is_large_step());
        let steps = 500;
        for _ in 0..steps {
            let p = sampler.get_film_position();
            assert!(p.x >= 0.0 && p.x < 4.0 && p.y >= 0.0 && p.y < 4.0);
            for i in 2..4 {
                let u = sampler.get_sample(i);
                assert!((0.0..1.0).contains(&u));
            }
            let mut r = SampleResult::new(1);
            r.film_x = p.x;
            r.film_y = p.y;
            r.radiance[0] = Spectrum::from(1.0);
            sampler.next_sample(&[r]);
        }
        assert!((sampler.get_normalization() - 1.0).abs() < 1e-4);
        assert_eq!(sampler.get_consecutive_rejects(), 0);
        let data = film
            .get_channel_data(&FilmChannel::RadiancePerScreenNormalized(0))
            .unwrap();
        let total: Float = data.chunks(4).map(|c| c[1]).sum();
        assert!((total - (steps - 1) as Float).abs() < 1e-2);
    }

    #[test]
    fn test_003() {
        // a chain stuck on a bright path is forced to take a large step
        let params = SamplerParams {
            large_step_rate: 0.0,
            max_consecutive_reject: 4,
            ..Default::default()
        };
        let (_film, mut sampler) = create_sampler(&params);
        let mut r = SampleResult::new(1);
        r.radiance[0] = Spectrum::from(1.0e6);
        sampler.get_film_position();
        sampler.next_sample(&[r.clone()]);
        r.radiance[0] = Spectrum::from(0.0);
        let mut forced = false;
        for _ in 0..4 {
            sampler.get_film_position();
            sampler.next_sample(&[r.clone()]);
            if sampler.is_large_step() {
                forced = true;
            }
        }
        assert!(forced);
        assert_eq!(sampler.get_consecutive_rejects(), 0);
    }

    #[test]
    fn test_004() {
        // only caustic paths count when requested
        let params = SamplerParams::default().light_sampler_params();
        let (_film, sampler) = create_sampler(&params);
        let mut caustic = SampleResult::new(1);
        caustic.radiance[0] = Spectrum::from(2.0);
        caustic.is_caustic_path = true;
        let mut diffuse = caustic.clone();
        diffuse.is_caustic_path = false;
        assert!((sampler.path_luminance(&[caustic, diffuse]) - 2.0).abs() < 1e-5);
    }
}
