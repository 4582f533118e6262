use super::sample_result::SampleResult;
use crate::core::base::*;
use crate::core::error::*;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    Random,
    Sobol,
    Metropolis,
}

impl SamplerType {
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "RANDOM" => Ok(SamplerType::Random),
            "SOBOL" => Ok(SamplerType::Sobol),
            "METROPOLIS" => Ok(SamplerType::Metropolis),
            _ => Err(RenderError::Config(format!("Unknown sampler type: {}", name))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SamplerType::Random => "RANDOM",
            SamplerType::Sobol => "SOBOL",
            SamplerType::Metropolis => "METROPOLIS",
        }
    }
}

impl fmt::Display for SamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which film channels the results of a sampler are committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDomain {
    PixelNormalizedOnly,
    ScreenNormalizedOnly,
    PixelNormalizedAndScreenNormalized,
}

/// Produces the primary sample vectors driving one path at a time.
///
/// Dimensions 0 and 1 are the film position. A sampler is owned by a single
/// render thread; `next_sample` commits the results of the current sample to
/// the film and moves to the next one.
pub trait Sampler: Send {
    fn get_type(&self) -> SamplerType;
    fn set_thread_index(&mut self, index: usize);
    fn request_samples(&mut self, domain: SampleDomain, size: usize);
    fn get_sample(&mut self, index: usize) -> Float;
    fn get_film_position(&mut self) -> Point2f;
    fn next_sample(&mut self, results: &[SampleResult]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        for t in [SamplerType::Random, SamplerType::Sobol, SamplerType::Metropolis] {
            assert_eq!(SamplerType::from_name(t.name()).unwrap(), t);
        }
        assert!(SamplerType::from_name("halton").is_err());
    }
}
