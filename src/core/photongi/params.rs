use crate::core::base::*;
use crate::core::error::*;
use crate::core::param_set::*;

#[derive(Debug, Clone, PartialEq)]
pub struct PhotonGICacheParams {
    pub enabled: bool,
    pub max_photon_count: u32,
    /// Rebuild the cache every `update_spp` samples per pixel. 0 disables refreshes.
    pub update_spp: u32,
    pub lookup_radius: Float,
}

impl Default for PhotonGICacheParams {
    fn default() -> Self {
        PhotonGICacheParams {
            enabled: false,
            max_photon_count: 100000,
            update_spp: 0,
            lookup_radius: 0.15,
        }
    }
}

impl PhotonGICacheParams {
    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let d = PhotonGICacheParams::default();
        let max_photon_count =
            props.find_one_int("path.photongi.photon.maxcount", d.max_photon_count as i64);
        let update_spp = props.find_one_int("path.photongi.updatespp", d.update_spp as i64);
        let lookup_radius = props.find_one_float("path.photongi.lookup.radius", d.lookup_radius);
        if max_photon_count <= 0 {
            return Err(RenderError::Config(format!(
                "path.photongi.photon.maxcount must be > 0: {}",
                max_photon_count
            )));
        }
        if update_spp < 0 {
            return Err(RenderError::Config(format!(
                "path.photongi.updatespp must be >= 0: {}",
                update_spp
            )));
        }
        if lookup_radius <= 0.0 || !lookup_radius.is_finite() {
            return Err(RenderError::Config(format!(
                "path.photongi.lookup.radius must be > 0: {}",
                lookup_radius
            )));
        }
        Ok(PhotonGICacheParams {
            enabled: props.find_one_bool("path.photongi.enable", d.enabled),
            max_photon_count: max_photon_count as u32,
            update_spp: update_spp as u32,
            lookup_radius,
        })
    }
}
