use super::channel::FilmChannel;
use super::film::Film;
use crate::core::base::*;
use crate::core::error::*;

use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseEstimatorType {
    ConvTest,
    Variance,
}

impl NoiseEstimatorType {
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "CONVTEST" => Ok(NoiseEstimatorType::ConvTest),
            "VARIANCE" => Ok(NoiseEstimatorType::Variance),
            _ => Err(RenderError::Config(format!(
                "Unknown noise estimator: {}",
                name
            ))),
        }
    }

    /// Extra film channel the estimator reads, if any.
    pub fn required_channel(&self) -> Option<FilmChannel> {
        match self {
            NoiseEstimatorType::ConvTest => None,
            NoiseEstimatorType::Variance => Some(FilmChannel::NoiseMoments),
        }
    }
}

/// Estimates the remaining relative noise of the film. Returns `None` while
/// there is not enough data for an estimate.
pub trait NoiseEstimator: Send {
    fn estimate(&mut self, film: &Film) -> Option<Float>;
    fn reset(&mut self);
}

/// Compares the image against the one seen at the previous test.
#[derive(Debug, Default)]
pub struct ConvTestEstimator {
    reference: Option<Vec<Float>>,
}

impl ConvTestEstimator {
    pub fn new() -> Self {
        ConvTestEstimator { reference: None }
    }
}

fn luminance_image(film: &Film) -> Vec<Float> {
    let rgb = film.get_image_rgb();
    return rgb
        .par_chunks(3)
        .map(|c| 0.212671 * c[0] + 0.715160 * c[1] + 0.072169 * c[2])
        .collect();
}

impl NoiseEstimator for ConvTestEstimator {
    fn estimate(&mut self, film: &Film) -> Option<Float> {
        let current = luminance_image(film);
        let result = match &self.reference {
            Some(reference) if reference.len() == current.len() => {
                let (diff, total) = current
                    .par_iter()
                    .zip(reference.par_iter())
                    .map(|(c, r)| ((c - r).abs() as f64, Float::max(*c, *r) as f64))
                    .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
                if total > 0.0 {
                    Some((diff / total) as Float)
                } else {
                    Some(0.0)
                }
            }
            _ => None,
        };
        self.reference = Some(current);
        return result;
    }

    fn reset(&mut self) {
        self.reference = None;
    }
}

/// Standard error of the per-pixel luminance mean, relative to the image mean.
#[derive(Debug, Default)]
pub struct VarianceEstimator {}

impl VarianceEstimator {
    pub fn new() -> Self {
        VarianceEstimator {}
    }
}

impl NoiseEstimator for VarianceEstimator {
    fn estimate(&mut self, film: &Film) -> Option<Float> {
        let data = film.get_channel_data(&FilmChannel::NoiseMoments)?;
        let (error, mean, count) = data
            .par_chunks(3)
            .map(|m| {
                let w = m[2] as f64;
                if w <= 0.0 {
                    return (0.0, 0.0, 0u64);
                }
                let mean = m[0] as f64 / w;
                let variance = f64::max(m[1] as f64 / w - mean * mean, 0.0);
                return (f64::sqrt(variance / w), mean, 1u64);
            })
            .reduce(|| (0.0, 0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));
        if count == 0 {
            return None;
        }
        if mean <= 0.0 {
            return Some(0.0);
        }
        return Some((error / mean) as Float);
    }

    fn reset(&mut self) {}
}

pub fn create_noise_estimator(t: NoiseEstimatorType) -> Box<dyn NoiseEstimator> {
    match t {
        NoiseEstimatorType::ConvTest => Box::new(ConvTestEstimator::new()),
        NoiseEstimatorType::Variance => Box::new(VarianceEstimator::new()),
    }
}
