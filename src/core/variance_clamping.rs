use crate::core::base::*;
use crate::core::sampler::SampleResult;
use crate::core::spectrum::*;

/// Rejects statistical outliers ("fireflies") by scaling down radiance whose
/// luminance exceeds `sqrt(max_variance)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceClamping {
    sqrt_variance_clamp_max_value: Float,
}

impl VarianceClamping {
    pub fn new(max_variance: Float) -> Self {
        let max_variance = if max_variance.is_finite() {
            Float::max(max_variance, 0.0)
        } else {
            0.0
        };
        VarianceClamping {
            sqrt_variance_clamp_max_value: Float::sqrt(max_variance),
        }
    }

    pub fn has_clamping(&self) -> bool {
        return self.sqrt_variance_clamp_max_value > 0.0;
    }

    pub fn get_bound(&self) -> Float {
        return self.sqrt_variance_clamp_max_value;
    }

    /// Keeps the chromaticity of `c` and limits its luminance to the bound.
    pub fn apply(&self, c: &Spectrum) -> Spectrum {
        if !self.has_clamping() {
            return *c;
        }
        let bound = self.sqrt_variance_clamp_max_value;
        let y = c.y();
        if y * y > bound * bound {
            return *c * (bound / y.abs());
        }
        return *c;
    }

    pub fn clamp_sample_result(&self, result: &mut SampleResult) {
        if !self.has_clamping() {
            return;
        }
        for r in result.radiance.iter_mut() {
            *r = self.apply(r);
        }
    }
}
