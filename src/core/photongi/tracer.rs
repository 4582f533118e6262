use super::params::PhotonGICacheParams;
use super::snapshot::RadiancePhoton;
use crate::core::error::*;
use crate::core::misc::ProgressCallback;
use crate::core::scene::Scene;

/// Traces the photons a cache build is made of.
pub trait PhotonTracer: Send + Sync {
    /// `pass` is 0 for the initial build and grows with every refresh.
    fn trace(
        &self,
        scene: &dyn Scene,
        params: &PhotonGICacheParams,
        pass: u32,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<RadiancePhoton>, RenderError>;
}
