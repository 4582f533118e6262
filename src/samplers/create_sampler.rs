use crate::core::base::*;
use crate::core::error::*;
use crate::core::film::*;
use crate::core::sampler::*;

use std::sync::Arc;

use super::metropolis::MetropolisSampler;
use super::random::RandomSampler;
use super::sobol::SobolSampler;

/// A sampler of any type, owned by a single render thread.
pub enum SamplerVariant {
    Random(RandomSampler),
    Sobol(SobolSampler),
    Metropolis(MetropolisSampler),
}

impl SamplerVariant {
    fn as_sampler(&self) -> &dyn Sampler {
        match self {
            SamplerVariant::Random(s) => s,
            SamplerVariant::Sobol(s) => s,
            SamplerVariant::Metropolis(s) => s,
        }
    }

    fn as_sampler_mut(&mut self) -> &mut dyn Sampler {
        match self {
            SamplerVariant::Random(s) => s,
            SamplerVariant::Sobol(s) => s,
            SamplerVariant::Metropolis(s) => s,
        }
    }
}

impl Sampler for SamplerVariant {
    fn get_type(&self) -> SamplerType {
        return self.as_sampler().get_type();
    }

    fn set_thread_index(&mut self, index: usize) {
        self.as_sampler_mut().set_thread_index(index);
    }

    fn request_samples(&mut self, domain: SampleDomain, size: usize) {
        self.as_sampler_mut().request_samples(domain, size);
    }

    fn get_sample(&mut self, index: usize) -> Float {
        return self.as_sampler_mut().get_sample(index);
    }

    fn get_film_position(&mut self) -> Point2f {
        return self.as_sampler_mut().get_film_position();
    }

    fn next_sample(&mut self, results: &[SampleResult]) {
        self.as_sampler_mut().next_sample(results);
    }
}

pub fn create_sampler(
    sampler_type: SamplerType,
    params: &SamplerParams,
    film: &Arc<Film>,
    shared: &SamplerSharedData,
    seed: u64,
) -> Result<SamplerVariant, RenderError> {
    match (sampler_type, shared) {
        (SamplerType::Random, SamplerSharedData::Random(shared)) => {
            return Ok(SamplerVariant::Random(RandomSampler::new(film, shared, seed)));
        }
        (SamplerType::Sobol, SamplerSharedData::Sobol(shared)) => {
            return Ok(SamplerVariant::Sobol(SobolSampler::new(film, shared, seed)));
        }
        (SamplerType::Metropolis, _) => {
            return Ok(SamplerVariant::Metropolis(MetropolisSampler::new(
                film, params, seed,
            )));
        }
        _ => {
            return Err(RenderError::Config(format!(
                "Sampler \"{}\" can not use shared data of \"{}\".",
                sampler_type,
                shared.get_type()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let film = Arc::new(Film::new(8, 8, &FilmChannel::default_set(1)));
        let params = SamplerParams::default();
        for t in [SamplerType::Random, SamplerType::Sobol, SamplerType::Metropolis] {
            let shared = create_sampler_shared_data(t, &film, &params, 1);
            let mut sampler = create_sampler(t, &params, &film, &shared, 1).unwrap();
            assert_eq!(sampler.get_type(), t);
            sampler.request_samples(SampleDomain::PixelNormalizedOnly, 4);
            let p = sampler.get_film_position();
            assert!(p.x >= 0.0 && p.x < 8.0 && p.y >= 0.0 && p.y < 8.0);
        }
        let shared = create_sampler_shared_data(SamplerType::Random, &film, &params, 1);
        let r = create_sampler(SamplerType::Sobol, &params, &film, &shared, 1);
        assert!(matches!(r, Err(RenderError::Config(_))));
    }
}
