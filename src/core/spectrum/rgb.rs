use crate::core::base::*;
use serde::{Deserialize, Serialize};
use std::ops;

const YWEIGHT: [Float; 3] = [0.212671, 0.715160, 0.072169];

/// Linear RGB radiance carried through sample results and the film.
#[derive(Debug, PartialEq, Default, Copy, Clone, Serialize, Deserialize)]
pub struct RGBSpectrum {
    pub c: [Float; 3],
}

impl RGBSpectrum {
    #[inline]
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        RGBSpectrum { c: [r, g, b] }
    }

    #[inline]
    pub fn zero() -> Self {
        RGBSpectrum { c: [0.0, 0.0, 0.0] }
    }

    /// Luminance.
    pub fn y(&self) -> Float {
        let c = &self.c;
        return YWEIGHT[0] * c[0] + YWEIGHT[1] * c[1] + YWEIGHT[2] * c[2];
    }

    pub fn to_rgb(&self) -> [Float; 3] {
        return self.c;
    }

    #[inline]
    pub fn is_black(&self) -> bool {
        let c = &self.c;
        return c.iter().all(|x| -> bool { x.abs() <= 0.0 });
    }

    pub fn is_valid(&self) -> bool {
        let c = &self.c;
        return c.iter().all(|x| -> bool { x.is_finite() });
    }
}

impl From<Float> for RGBSpectrum {
    fn from(v: Float) -> Self {
        RGBSpectrum { c: [v, v, v] }
    }
}

impl ops::Add<RGBSpectrum> for RGBSpectrum {
    type Output = RGBSpectrum;
    #[inline]
    fn add(self, rhs: RGBSpectrum) -> Self::Output {
        RGBSpectrum::new(
            self.c[0] + rhs.c[0],
            self.c[1] + rhs.c[1],
            self.c[2] + rhs.c[2],
        )
    }
}

impl ops::AddAssign<RGBSpectrum> for RGBSpectrum {
    #[inline]
    fn add_assign(&mut self, rhs: RGBSpectrum) {
        for (a, b) in self.c.iter_mut().zip(rhs.c.iter()) {
            *a += *b;
        }
    }
}

impl ops::Mul<RGBSpectrum> for RGBSpectrum {
    type Output = RGBSpectrum;
    #[inline]
    fn mul(self, rhs: RGBSpectrum) -> Self::Output {
        RGBSpectrum::new(
            self.c[0] * rhs.c[0],
            self.c[1] * rhs.c[1],
            self.c[2] * rhs.c[2],
        )
    }
}

impl ops::Mul<Float> for RGBSpectrum {
    type Output = RGBSpectrum;
    #[inline]
    fn mul(self, rhs: Float) -> Self::Output {
        RGBSpectrum::new(self.c[0] * rhs, self.c[1] * rhs, self.c[2] * rhs)
    }
}

impl ops::Index<usize> for RGBSpectrum {
    type Output = Float;
    #[inline]
    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let s = RGBSpectrum::from(1.0);
        assert!((s.y() - 1.0).abs() < 1e-5);
        assert!(RGBSpectrum::zero().is_black());
        assert!(!s.is_black());
    }

    #[test]
    fn test_002() {
        let s = RGBSpectrum::new(Float::NAN, 0.0, 0.0);
        assert!(!s.is_valid());
        let s = RGBSpectrum::new(0.0, Float::INFINITY, 0.0);
        assert!(!s.is_valid());
        let s = RGBSpectrum::new(0.5, 2.0, 3.0) * 2.0;
        assert_eq!(s.to_rgb(), [1.0, 4.0, 6.0]);
        let mut t = s * RGBSpectrum::new(0.5, 0.25, 0.0);
        t += RGBSpectrum::from(1.0);
        assert_eq!(t.to_rgb(), [1.5, 2.0, 1.0]);
    }
}
