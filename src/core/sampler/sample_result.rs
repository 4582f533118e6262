use crate::core::base::*;
use crate::core::spectrum::*;

/// Everything one traced path contributes to the film.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    /// Continuous film coordinates, in pixels.
    pub film_x: Float,
    pub film_y: Float,
    /// One radiance value per radiance group.
    pub radiance: Vec<Spectrum>,
    pub alpha: Float,
    pub depth: Float,
    pub shading_normal: [Float; 3],
    pub object_id: u32,
    pub is_caustic_path: bool,
    /// Light-traced contributions are splatted into the screen normalized
    /// channels instead of being averaged per pixel.
    pub screen_normalized: bool,
}

impl SampleResult {
    pub fn new(radiance_group_count: usize) -> Self {
        SampleResult {
            film_x: 0.0,
            film_y: 0.0,
            radiance: vec![Spectrum::zero(); usize::max(1, radiance_group_count)],
            alpha: 1.0,
            depth: Float::INFINITY,
            shading_normal: [0.0; 3],
            object_id: u32::MAX,
            is_caustic_path: false,
            screen_normalized: false,
        }
    }

    pub fn reset(&mut self) {
        for r in self.radiance.iter_mut() {
            *r = Spectrum::zero();
        }
        self.alpha = 1.0;
        self.depth = Float::INFINITY;
        self.shading_normal = [0.0; 3];
        self.object_id = u32::MAX;
        self.is_caustic_path = false;
    }

    pub fn get_pixel(&self) -> Point2i {
        return Point2f::new(self.film_x, self.film_y).floor();
    }

    /// Luminance summed over every radiance group.
    pub fn luminance(&self) -> Float {
        return self.radiance.iter().map(|r| r.y()).sum();
    }

    pub fn is_valid(&self) -> bool {
        return self.radiance.iter().all(|r| r.is_valid())
            && self.alpha.is_finite()
            && !self.depth.is_nan()
            && self.shading_normal.iter().all(|v| v.is_finite());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut r = SampleResult::new(2);
        r.film_x = 3.7;
        r.film_y = 1.2;
        r.radiance[0] = Spectrum::from(1.0);
        r.radiance[1] = Spectrum::from(2.0);
        assert_eq!(r.get_pixel(), Point2i::new(3, 1));
        assert!((r.luminance() - 3.0).abs() < 1e-5);
        assert!(r.is_valid());
        r.radiance[1] = Spectrum::from(Float::NAN);
        assert!(!r.is_valid());
        r.reset();
        assert!(r.is_valid());
        assert_eq!(r.luminance(), 0.0);
    }
}
