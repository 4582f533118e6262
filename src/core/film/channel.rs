use crate::core::base::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How samples landing on the same pixel are combined. Every mode is
/// commutative, so the final raster does not depend on thread interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// `Σ value·weight` per component followed by `Σ weight`.
    Weighted,
    /// Smallest value wins.
    Min,
    /// `(value, weight)` of the heaviest sample, ties broken by the smallest value.
    MaxWeight,
    /// `Σ value·weight`.
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilmChannel {
    RadiancePerPixelNormalized(usize),
    RadiancePerScreenNormalized(usize),
    Alpha,
    Depth,
    ShadingNormal,
    ObjectId,
    SampleCount,
    /// Weighted luminance moments `(Y, Y²)` used by the variance estimator.
    NoiseMoments,
}

impl FilmChannel {
    /// Number of values a sample contributes.
    pub fn arity(&self) -> usize {
        match self {
            FilmChannel::RadiancePerPixelNormalized(_) => 3,
            FilmChannel::RadiancePerScreenNormalized(_) => 3,
            FilmChannel::ShadingNormal => 3,
            FilmChannel::NoiseMoments => 2,
            _ => 1,
        }
    }

    pub fn merge_mode(&self) -> MergeMode {
        match self {
            FilmChannel::Depth => MergeMode::Min,
            FilmChannel::ObjectId => MergeMode::MaxWeight,
            FilmChannel::SampleCount => MergeMode::Sum,
            _ => MergeMode::Weighted,
        }
    }

    /// Number of stored values per pixel.
    pub fn stride(&self) -> usize {
        match self.merge_mode() {
            MergeMode::Weighted => self.arity() + 1,
            MergeMode::Min => 1,
            MergeMode::MaxWeight => 2,
            MergeMode::Sum => 1,
        }
    }

    pub fn initial_values(&self) -> Vec<Float> {
        match self.merge_mode() {
            MergeMode::Min => vec![Float::MAX],
            MergeMode::MaxWeight => vec![Float::MAX, 0.0],
            _ => vec![0.0; self.stride()],
        }
    }

    pub fn merge(&self, dst: &mut [Float], value: &[Float], weight: Float) {
        match self.merge_mode() {
            MergeMode::Weighted => {
                let n = self.arity();
                for i in 0..n {
                    dst[i] += value[i] * weight;
                }
                dst[n] += weight;
            }
            MergeMode::Min => {
                dst[0] = Float::min(dst[0], value[0]);
            }
            MergeMode::MaxWeight => {
                if weight > dst[1] || (weight == dst[1] && value[0] < dst[0]) {
                    dst[0] = value[0];
                    dst[1] = weight;
                }
            }
            MergeMode::Sum => {
                dst[0] += value[0] * weight;
            }
        }
    }

    /// Combines two stored pixels, used when restoring or merging films.
    pub fn merge_stored(&self, dst: &mut [Float], src: &[Float]) {
        match self.merge_mode() {
            MergeMode::Weighted | MergeMode::Sum => {
                for i in 0..self.stride() {
                    dst[i] += src[i];
                }
            }
            MergeMode::Min => {
                dst[0] = Float::min(dst[0], src[0]);
            }
            MergeMode::MaxWeight => self.merge(dst, &src[0..1], src[1]),
        }
    }

    /// The per-pixel value an observer sees.
    pub fn resolve(&self, stored: &[Float]) -> Vec<Float> {
        match self.merge_mode() {
            MergeMode::Weighted => {
                let n = self.arity();
                let w = stored[n];
                if w > 0.0 {
                    return stored[0..n].iter().map(|v| v / w).collect();
                } else {
                    return vec![0.0; n];
                }
            }
            MergeMode::Min => {
                if stored[0] == Float::MAX {
                    return vec![Float::INFINITY];
                }
                return vec![stored[0]];
            }
            MergeMode::MaxWeight => {
                return vec![stored[0]];
            }
            MergeMode::Sum => {
                return vec![stored[0]];
            }
        }
    }

    /// Contributions must be finite; a depth of +inf marks a sample that hit nothing.
    pub fn is_valid_value(&self, value: &[Float], weight: Float) -> bool {
        if !weight.is_finite() || value.len() < self.arity() {
            return false;
        }
        match self {
            FilmChannel::Depth => !value[0].is_nan() && value[0] != Float::NEG_INFINITY,
            _ => value[0..self.arity()].iter().all(|v| v.is_finite()),
        }
    }

    /// Radiance channels for `count` groups followed by the sample counter.
    pub fn default_set(count: usize) -> Vec<FilmChannel> {
        let count = usize::max(1, count);
        let mut channels = Vec::new();
        for i in 0..count {
            channels.push(FilmChannel::RadiancePerPixelNormalized(i));
        }
        for i in 0..count {
            channels.push(FilmChannel::RadiancePerScreenNormalized(i));
        }
        channels.push(FilmChannel::SampleCount);
        return channels;
    }
}

impl fmt::Display for FilmChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilmChannel::RadiancePerPixelNormalized(i) => {
                write!(f, "RADIANCE_PER_PIXEL_NORMALIZED[{}]", i)
            }
            FilmChannel::RadiancePerScreenNormalized(i) => {
                write!(f, "RADIANCE_PER_SCREEN_NORMALIZED[{}]", i)
            }
            FilmChannel::Alpha => write!(f, "ALPHA"),
            FilmChannel::Depth => write!(f, "DEPTH"),
            FilmChannel::ShadingNormal => write!(f, "SHADING_NORMAL"),
            FilmChannel::ObjectId => write!(f, "OBJECT_ID"),
            FilmChannel::SampleCount => write!(f, "SAMPLECOUNT"),
            FilmChannel::NoiseMoments => write!(f, "NOISE_MOMENTS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let c = FilmChannel::RadiancePerPixelNormalized(0);
        let mut dst = c.initial_values();
        assert_eq!(dst.len(), 4);
        c.merge(&mut dst, &[1.0, 2.0, 3.0], 0.5);
        c.merge(&mut dst, &[3.0, 2.0, 1.0], 0.5);
        assert_eq!(c.resolve(&dst), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_002() {
        // the heaviest object id wins regardless of arrival order
        let c = FilmChannel::ObjectId;
        let samples = [(7.0, 0.5), (3.0, 0.9), (5.0, 0.9), (1.0, 0.1)];
        let mut a = c.initial_values();
        for (id, w) in samples.iter() {
            c.merge(&mut a, &[*id], *w);
        }
        let mut b = c.initial_values();
        for (id, w) in samples.iter().rev() {
            c.merge(&mut b, &[*id], *w);
        }
        assert_eq!(a, b);
        assert_eq!(c.resolve(&a), vec![3.0]);
    }

    #[test]
    fn test_003() {
        let c = FilmChannel::Depth;
        let mut dst = c.initial_values();
        assert_eq!(c.resolve(&dst), vec![Float::INFINITY]);
        assert!(c.is_valid_value(&[Float::INFINITY], 1.0));
        assert!(!c.is_valid_value(&[Float::NAN], 1.0));
        c.merge(&mut dst, &[Float::INFINITY], 1.0);
        c.merge(&mut dst, &[4.0], 1.0);
        c.merge(&mut dst, &[2.5], 1.0);
        assert_eq!(c.resolve(&dst), vec![2.5]);
        assert!(!FilmChannel::Alpha.is_valid_value(&[Float::INFINITY], 1.0));
    }
}
