use super::procedural::ProceduralScene;
use crate::core::base::*;
use crate::core::error::*;
use crate::core::misc::*;
use crate::core::photongi::*;
use crate::core::rng::*;
use crate::core::scene::Scene;

use log::*;

/// Photon tracer of `ProceduralScene`. Photons land uniformly on the backdrop
/// and carry its once bounced light.
#[derive(Debug, Clone, Default)]
pub struct ProceduralPhotonTracer {
    /// Makes the build of this pass fail, to exercise error handling.
    pub fail_on_pass: Option<u32>,
}

impl ProceduralPhotonTracer {
    pub fn new() -> Self {
        ProceduralPhotonTracer::default()
    }
}

const PROGRESS_STEPS: usize = 100;

impl PhotonTracer for ProceduralPhotonTracer {
    fn trace(
        &self,
        scene: &dyn Scene,
        params: &PhotonGICacheParams,
        pass: u32,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<RadiancePhoton>, RenderError> {
        if self.fail_on_pass == Some(pass) {
            return Err(RenderError::PhotonGI(format!(
                "photon tracing of pass {} failed",
                pass
            )));
        }
        let scene = scene
            .as_any()
            .downcast_ref::<ProceduralScene>()
            .ok_or_else(|| {
                RenderError::PhotonGI(format!("unsupported scene: {}", scene.name()))
            })?;

        let total = params.max_photon_count as usize;
        let step = usize::max(1, total / PROGRESS_STEPS);
        let mut rng = RNG::new_sequence(pass as u64);
        let mut photons = Vec::with_capacity(total);
        for i in 0..total {
            let u = rng.uniform_float();
            let v = rng.uniform_float();
            if !scene.is_on_disk(u, v) {
                photons.push(RadiancePhoton {
                    p: Point3f::new(u, v, 0.0),
                    n: Normal3f::new(0.0, 0.0, 1.0),
                    radiance: scene.indirect_light(u, v),
                });
            }
            if (i + 1) % step == 0 {
                progress.update(i + 1, total);
            }
        }
        debug!("Traced {} photons for pass {}", photons.len(), pass);
        return Ok(photons);
    }
}
