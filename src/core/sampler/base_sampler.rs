use super::sample_result::SampleResult;
use super::sampler::SampleDomain;
use crate::core::base::*;
use crate::core::film::*;

use std::sync::Arc;

/// State shared by every sampler variant.
pub struct BaseSampler {
    pub film: Arc<Film>,
    pub domain: SampleDomain,
    pub size: usize,
    pub thread_index: usize,
}

impl BaseSampler {
    pub fn new(film: &Arc<Film>) -> Self {
        BaseSampler {
            film: film.clone(),
            domain: SampleDomain::PixelNormalizedOnly,
            size: 0,
            thread_index: 0,
        }
    }

    pub fn request_samples(&mut self, domain: SampleDomain, size: usize) {
        self.domain = domain;
        self.size = usize::max(size, 2);
    }

    /// Film position of a sample inside `pixel`, or of a sample spread over
    /// the whole screen when `pixel` is `None`.
    pub fn film_position(&self, pixel: Option<Point2i>, u0: Float, u1: Float) -> Point2f {
        match pixel {
            Some(p) => {
                return Point2f::new(p.x as Float + u0, p.y as Float + u1);
            }
            None => {
                let w = self.film.get_width() as Float;
                let h = self.film.get_height() as Float;
                return Point2f::new(
                    Float::min(u0 * w, w * ONE_MINUS_EPSILON),
                    Float::min(u1 * h, h * ONE_MINUS_EPSILON),
                );
            }
        }
    }

    pub fn commit(&self, results: &[SampleResult]) {
        for result in results.iter() {
            self.commit_weighted(result, 1.0);
        }
    }

    pub fn commit_weighted(&self, result: &SampleResult, weight: Float) {
        let screen = match self.domain {
            SampleDomain::PixelNormalizedOnly => false,
            SampleDomain::ScreenNormalizedOnly => true,
            SampleDomain::PixelNormalizedAndScreenNormalized => result.screen_normalized,
        };
        if screen {
            self.film.splat_sample_result(result, weight);
        } else {
            self.film.add_sample_result(result, weight);
        }
    }
}
