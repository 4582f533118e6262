use crate::core::base::*;
use crate::core::integrator::*;
use crate::core::sampler::*;
use crate::core::scene::Scene;
use crate::core::spectrum::*;

use std::any::Any;

/// Object id of the emitting disk. Everything else is the backdrop, id 0.
pub const DISK_OBJECT_ID: u32 = 1;

/// A flat, analytic test scene: a colored backdrop lit by an emitting disk,
/// seen straight on. Film coordinates map to `[0, 1]^2` on the `z = 0` plane.
#[derive(Debug, Clone)]
pub struct ProceduralScene {
    name: String,
    pub disk_center: (Float, Float),
    pub disk_radius: Float,
    pub disk_emission: Spectrum,
    /// Probability of a rare, very bright path on the backdrop.
    pub firefly_probability: Float,
    pub firefly_radiance: Float,
}

impl ProceduralScene {
    pub fn new(name: &str) -> Self {
        ProceduralScene {
            name: String::from(name),
            disk_center: (0.5, 0.35),
            disk_radius: 0.12,
            disk_emission: Spectrum::new(4.0, 3.6, 3.0),
            firefly_probability: 0.001,
            firefly_radiance: 500.0,
        }
    }

    pub fn is_on_disk(&self, u: Float, v: Float) -> bool {
        let dx = u - self.disk_center.0;
        let dy = v - self.disk_center.1;
        return dx * dx + dy * dy <= self.disk_radius * self.disk_radius;
    }

    /// Diffuse reflectance of the backdrop.
    pub fn albedo(&self, u: Float, v: Float) -> Spectrum {
        let checker = ((u * 8.0).floor() as i32 + (v * 8.0).floor() as i32) & 1;
        let base = if checker == 0 { 0.6 } else { 0.4 };
        return Spectrum::new(base * (0.5 + 0.5 * u), base, base * (1.0 - 0.5 * v));
    }

    /// Irradiance from the disk, falling off with the squared distance.
    pub fn direct_light(&self, u: Float, v: Float) -> Spectrum {
        let dx = u - self.disk_center.0;
        let dy = v - self.disk_center.1;
        let d2 = dx * dx + dy * dy + 0.05;
        return self.disk_emission * (0.05 / d2);
    }

    /// Light bounced once off the backdrop, the signal the photon cache stores.
    pub fn indirect_light(&self, u: Float, v: Float) -> Spectrum {
        return self.albedo(u, v) * self.direct_light(u, v) * 0.25;
    }
}

impl Scene for ProceduralScene {
    fn name(&self) -> &str {
        return &self.name;
    }

    fn as_any(&self) -> &dyn Any {
        return self;
    }
}

/// Light transport of `ProceduralScene`: noisy direct lighting on the
/// backdrop, the photon cache or a one sample estimate for the indirect term,
/// and caustic light paths focused in a ring around the disk.
#[derive(Debug, Clone, Default)]
pub struct ProceduralTransport {
    pub width: u32,
    pub height: u32,
}

impl ProceduralTransport {
    pub fn new(width: u32, height: u32) -> Self {
        ProceduralTransport { width, height }
    }

    fn to_scene(&self, film_x: Float, film_y: Float) -> (Float, Float) {
        let w = u32::max(1, self.width) as Float;
        let h = u32::max(1, self.height) as Float;
        return (film_x / w, film_y / h);
    }
}

impl LightTransport for ProceduralTransport {
    fn eye_sample_size(&self) -> usize {
        return 5;
    }

    fn light_sample_size(&self) -> usize {
        return 4;
    }

    fn trace_eye_path(
        &self,
        ctx: &TraceContext,
        sampler: &mut dyn Sampler,
        result: &mut SampleResult,
    ) {
        let scene = match ctx.scene.as_any().downcast_ref::<ProceduralScene>() {
            Some(scene) => scene,
            None => return,
        };
        let (u, v) = self.to_scene(result.film_x, result.film_y);
        result.alpha = 1.0;
        result.depth = 1.0 + v;
        result.shading_normal = [0.0, 0.0, 1.0];

        let c = if scene.is_on_disk(u, v) {
            result.object_id = DISK_OBJECT_ID;
            result.depth = 0.9;
            scene.disk_emission
        } else {
            result.object_id = 0;
            // Shadow ray visibility, on average 1.
            let visibility = 2.0 * sampler.get_sample(2);
            let mut c = scene.albedo(u, v) * scene.direct_light(u, v) * visibility;

            let p = Point3f::new(u, v, 0.0);
            let n = Normal3f::new(0.0, 0.0, 1.0);
            match ctx.photon_gi.and_then(|cache| cache.get_radiance(&p, &n)) {
                Some(indirect) => c += indirect,
                None => c += scene.indirect_light(u, v) * (2.0 * sampler.get_sample(3)),
            }
            if sampler.get_sample(4) < scene.firefly_probability {
                c += Spectrum::from(scene.firefly_radiance);
            }
            c
        };
        result.radiance[0] = c;
    }

    fn trace_light_path(
        &self,
        ctx: &TraceContext,
        sampler: &mut dyn Sampler,
        results: &mut Vec<SampleResult>,
    ) {
        let scene = match ctx.scene.as_any().downcast_ref::<ProceduralScene>() {
            Some(scene) => scene,
            None => return,
        };
        let phi = 2.0 * PI * sampler.get_sample(2);
        let r = scene.disk_radius * (1.6 + 0.1 * (sampler.get_sample(3) - 0.5));
        let u = scene.disk_center.0 + r * phi.cos();
        let v = scene.disk_center.1 + r * phi.sin();
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return;
        }
        let mut result = SampleResult::new(1);
        result.film_x = u * self.width as Float;
        result.film_y = v * self.height as Float;
        result.radiance[0] = scene.disk_emission * 0.5;
        result.is_caustic_path = true;
        result.screen_normalized = true;
        results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::film::*;
    use crate::samplers::*;
    use std::sync::Arc;

    #[test]
    fn test_001() {
        let scene = ProceduralScene::new("test");
        assert!(scene.is_on_disk(0.5, 0.35));
        assert!(!scene.is_on_disk(0.0, 0.0));
        assert!(scene.indirect_light(0.1, 0.9).y() > 0.0);
        let any: &dyn Scene = &scene;
        assert_eq!(any.name(), "test");
    }

    #[test]
    fn test_002() {
        let scene = ProceduralScene::new("test");
        let transport = ProceduralTransport::new(16, 16);
        let film = Arc::new(Film::new(16, 16, &FilmChannel::default_set(1)));
        let params = SamplerParams::default();
        let shared = create_sampler_shared_data(SamplerType::Random, &film, &params, 1);
        let mut sampler = create_sampler(SamplerType::Random, &params, &film, &shared, 1).unwrap();
        sampler.request_samples(SampleDomain::PixelNormalizedOnly, transport.eye_sample_size());
        let ctx = TraceContext {
            scene: &scene,
            photon_gi: None,
            thread_index: 0,
        };

        let mut result = SampleResult::new(1);
        result.film_x = 8.0;
        result.film_y = 5.6;
        transport.trace_eye_path(&ctx, &mut sampler, &mut result);
        assert_eq!(result.object_id, DISK_OBJECT_ID);
        assert_eq!(result.radiance[0], scene.disk_emission);

        result.reset();
        result.film_x = 1.0;
        result.film_y = 15.0;
        transport.trace_eye_path(&ctx, &mut sampler, &mut result);
        assert_eq!(result.object_id, 0);
        assert!(result.is_valid());

        let mut results = Vec::new();
        for _ in 0..8 {
            transport.trace_light_path(&ctx, &mut sampler, &mut results);
            sampler.next_sample(&[]);
        }
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.is_caustic_path && r.screen_normalized));
    }
}
