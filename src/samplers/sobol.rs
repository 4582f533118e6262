use crate::core::base::*;
use crate::core::film::*;
use crate::core::lowdiscrepancy::*;
use crate::core::misc::*;
use crate::core::rng::*;
use crate::core::sampler::*;

use std::sync::Arc;

/// Per-pixel Sobol sequence with a Cranley-Patterson rotation derived from
/// the seed and the pixel. Dimensions beyond the direction number table are
/// filled with uniform random numbers.
pub struct SobolSampler {
    base: BaseSampler,
    shared: Arc<SobolSamplerSharedData>,
    rng: RNG,
    cursor: PixelBucketCursor,
    pixel: Point2i,
    pass: u32,
    rng0: Float,
    rng1: Float,
}

impl SobolSampler {
    pub fn new(film: &Arc<Film>, shared: &Arc<SobolSamplerSharedData>, seed: u64) -> Self {
        SobolSampler {
            base: BaseSampler::new(film),
            shared: shared.clone(),
            rng: RNG::new_sequence(seed),
            cursor: PixelBucketCursor::new(),
            pixel: Point2i::zero(),
            pass: 0,
            rng0: 0.0,
            rng1: 0.0,
        }
    }

    fn init_new_sample(&mut self) {
        self.pixel = self.cursor.next_pixel(&self.shared.buckets);
        self.pass = self.shared.next_pass(&self.pixel);
        let pixel_index = self.shared.pixel_index(&self.pixel) as u64;
        let key = ((self.shared.seed as u64) << 32) ^ (pixel_index << 1);
        self.rng0 = hash_to_float(key);
        self.rng1 = hash_to_float(key | 1);
    }

    pub fn get_pass(&self) -> u32 {
        return self.pass;
    }
}

impl Sampler for SobolSampler {
    fn get_type(&self) -> SamplerType {
        return SamplerType::Sobol;
    }

    fn set_thread_index(&mut self, index: usize) {
        self.base.thread_index = index;
    }

    fn request_samples(&mut self, domain: SampleDomain, size: usize) {
        self.base.request_samples(domain, size);
        self.init_new_sample();
    }

    fn get_sample(&mut self, index: usize) -> Float {
        match sobol_sample(self.pass, index) {
            Some(u) => {
                let shift = if index & 1 == 0 { self.rng0 } else { self.rng1 };
                let v = u + shift;
                return Float::min(v - Float::floor(v), ONE_MINUS_EPSILON);
            }
            None => {
                return self.rng.uniform_float();
            }
        }
    }

    fn get_film_position(&mut self) -> Point2f {
        let u0 = self.get_sample(0);
        let u1 = self.get_sample(1);
        if self.base.domain == SampleDomain::ScreenNormalizedOnly {
            return self.base.film_position(None, u0, u1);
        }
        return self.base.film_position(Some(self.pixel), u0, u1);
    }

    fn next_sample(&mut self, results: &[SampleResult]) {
        self.base.commit(results);
        self.init_new_sample();
    }
}
