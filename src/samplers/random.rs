use crate::core::base::*;
use crate::core::film::*;
use crate::core::rng::*;
use crate::core::sampler::*;

use std::sync::Arc;

/// Independent uniform samples, one pixel at a time from the shared buckets.
pub struct RandomSampler {
    base: BaseSampler,
    shared: Arc<RandomSamplerSharedData>,
    rng: RNG,
    cursor: PixelBucketCursor,
    pixel: Point2i,
    samples: Vec<Float>,
}

impl RandomSampler {
    pub fn new(film: &Arc<Film>, shared: &Arc<RandomSamplerSharedData>, seed: u64) -> Self {
        RandomSampler {
            base: BaseSampler::new(film),
            shared: shared.clone(),
            rng: RNG::new_sequence(seed),
            cursor: PixelBucketCursor::new(),
            pixel: Point2i::zero(),
            samples: Vec::new(),
        }
    }

    fn init_new_sample(&mut self) {
        if self.base.domain != SampleDomain::ScreenNormalizedOnly {
            self.pixel = self.cursor.next_pixel(&self.shared.buckets);
        }
        for s in self.samples.iter_mut() {
            *s = self.rng.uniform_float();
        }
    }
}

impl Sampler for RandomSampler {
    fn get_type(&self) -> SamplerType {
        return SamplerType::Random;
    }

    fn set_thread_index(&mut self, index: usize) {
        self.base.thread_index = index;
    }

    fn request_samples(&mut self, domain: SampleDomain, size: usize) {
        self.base.request_samples(domain, size);
        self.samples = vec![0.0; self.base.size];
        self.init_new_sample();
    }

    fn get_sample(&mut self, index: usize) -> Float {
        if index < self.samples.len() {
            return self.samples[index];
        }
        return self.rng.uniform_float();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spectrum::*;

    #[test]
    fn test_001() {
        let film = Arc::new(Film::new(6, 5, &FilmChannel::default_set(1)));
        let shared = Arc::new(RandomSamplerSharedData::new(&film, &SamplerParams::default()));
        let mut sampler = RandomSampler::new(&film, &shared, 3);
        sampler.request_samples(SampleDomain::PixelNormalizedOnly, 4);
        for _ in 0..30 {
            let p = sampler.get_film_position();
            assert!(p.x >= 0.0 && p.x < 6.0 && p.y >= 0.0 && p.y < 5.0);
            let u = sampler.get_sample(3);
            assert!((0.0..1.0).contains(&u));
            // samples are stable until the next sample is started
            assert_eq!(sampler.get_sample(3), u);
            let mut r = SampleResult::new(1);
            r.film_x = p.x;
            r.film_y = p.y;
            r.radiance[0] = Spectrum::from(1.0);
            sampler.next_sample(&[r]);
        }
        // a single bucket covers the film, every pixel got one sample
        for y in 0..5 {
            for x in 0..6 {
                let n = film.get_pixel_value(x, y, &FilmChannel::SampleCount);
                assert_eq!(n, Some(vec![1.0]));
            }
        }
    }
}
