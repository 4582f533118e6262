use crate::core::base::*;
use crate::core::error::*;
use crate::core::film::*;
use crate::core::param_set::*;
use crate::core::photongi::*;
use crate::core::sampler::*;
use crate::core::variance_clamping::*;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEngineType {
    PathCpu,
    LightCpu,
    BiDirCpu,
    BiDirVmCpu,
    TilePathCpu,
    RtPathCpu,
    BakeCpu,
    PathOcl,
    TilePathOcl,
    RtPathOcl,
}

impl RenderEngineType {
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "PATHCPU" => Ok(RenderEngineType::PathCpu),
            "LIGHTCPU" => Ok(RenderEngineType::LightCpu),
            "BIDIRCPU" => Ok(RenderEngineType::BiDirCpu),
            "BIDIRVMCPU" => Ok(RenderEngineType::BiDirVmCpu),
            "TILEPATHCPU" => Ok(RenderEngineType::TilePathCpu),
            "RTPATHCPU" => Ok(RenderEngineType::RtPathCpu),
            "BAKECPU" => Ok(RenderEngineType::BakeCpu),
            "PATHOCL" => Ok(RenderEngineType::PathOcl),
            "TILEPATHOCL" => Ok(RenderEngineType::TilePathOcl),
            "RTPATHOCL" => Ok(RenderEngineType::RtPathOcl),
            _ => Err(RenderError::Config(format!("Unknown render engine type: {}", name))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderEngineType::PathCpu => "PATHCPU",
            RenderEngineType::LightCpu => "LIGHTCPU",
            RenderEngineType::BiDirCpu => "BIDIRCPU",
            RenderEngineType::BiDirVmCpu => "BIDIRVMCPU",
            RenderEngineType::TilePathCpu => "TILEPATHCPU",
            RenderEngineType::RtPathCpu => "RTPATHCPU",
            RenderEngineType::BakeCpu => "BAKECPU",
            RenderEngineType::PathOcl => "PATHOCL",
            RenderEngineType::TilePathOcl => "TILEPATHOCL",
            RenderEngineType::RtPathOcl => "RTPATHOCL",
        }
    }

    pub fn is_supported(&self) -> bool {
        return *self == RenderEngineType::PathCpu;
    }
}

impl fmt::Display for RenderEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything a render engine needs to know, read from a `Properties` set.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub engine_type: RenderEngineType,
    pub seed: u32,
    /// 0 picks one thread per core.
    pub thread_count: usize,
    pub film_width: u32,
    pub film_height: u32,
    pub radiance_group_count: usize,
    pub alpha_channel: bool,
    pub depth_channel: bool,
    pub shading_normal_channel: bool,
    pub object_id_channel: bool,
    pub outputs: FilmOutputs,
    pub sampler_type: SamplerType,
    pub sampler_params: SamplerParams,
    pub clamping_max_variance: Float,
    pub hybrid_back_forward: bool,
    pub halt: HaltConditions,
    pub photongi: PhotonGICacheParams,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            engine_type: RenderEngineType::PathCpu,
            seed: 1,
            thread_count: 0,
            film_width: 640,
            film_height: 480,
            radiance_group_count: 1,
            alpha_channel: false,
            depth_channel: false,
            shading_normal_channel: false,
            object_id_channel: false,
            outputs: FilmOutputs::new(),
            sampler_type: SamplerType::Random,
            sampler_params: SamplerParams::default(),
            clamping_max_variance: 0.0,
            hybrid_back_forward: false,
            halt: HaltConditions::default(),
            photongi: PhotonGICacheParams::default(),
        }
    }
}

impl RenderConfig {
    /// Reads the configuration. Malformed values are reported here,
    /// contradicting settings by `validate`.
    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let d = RenderConfig::default();
        let engine_type =
            RenderEngineType::from_name(&props.find_one_string("renderengine.type", "PATHCPU"))?;
        let sampler_name = props.find_one_string("sampler.type", "RANDOM");
        let sampler_type = SamplerType::from_name(&sampler_name)?;
        let seed = props.find_one_int("renderengine.seed", d.seed as i64);
        let thread_count = props.find_one_int("native.threads.count", 0);
        let film_width = props.find_one_int("film.width", d.film_width as i64);
        let film_height = props.find_one_int("film.height", d.film_height as i64);
        let groups = props.find_one_int("film.radiancegroups.count", 1);
        if seed < 0 || seed > u32::MAX as i64 {
            return Err(RenderError::Config(format!("renderengine.seed out of range: {}", seed)));
        }
        if thread_count < 0 {
            return Err(RenderError::Config(format!(
                "native.threads.count must be >= 0: {}",
                thread_count
            )));
        }
        let size_range = 0..=u32::MAX as i64;
        if !size_range.contains(&film_width) || !size_range.contains(&film_height) {
            return Err(RenderError::Config(format!(
                "Invalid film size: {}x{}",
                film_width, film_height
            )));
        }
        if groups < 0 {
            return Err(RenderError::Config(format!(
                "film.radiancegroups.count must be >= 0: {}",
                groups
            )));
        }
        Ok(RenderConfig {
            engine_type,
            seed: seed as u32,
            thread_count: thread_count as usize,
            film_width: film_width as u32,
            film_height: film_height as u32,
            radiance_group_count: groups as usize,
            alpha_channel: props.find_one_bool("film.channels.alpha", false),
            depth_channel: props.find_one_bool("film.channels.depth", false),
            shading_normal_channel: props.find_one_bool("film.channels.shadingnormal", false),
            object_id_channel: props.find_one_bool("film.channels.objectid", false),
            outputs: FilmOutputs::from_properties(props)?,
            sampler_type,
            sampler_params: SamplerParams::from_properties(props, &sampler_name),
            clamping_max_variance: props.find_one_float("path.clamping.variance.maxvalue", 0.0),
            hybrid_back_forward: props.find_one_bool("path.hybridbackforward.enable", false),
            halt: HaltConditions::from_properties(props)?,
            photongi: PhotonGICacheParams::from_properties(props)?,
        })
    }

    /// Rejects settings that can not be rendered. Called by the engine before
    /// any render thread is spawned.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !self.engine_type.is_supported() {
            return Err(RenderError::Config(format!(
                "Render engine {} is not supported, only PATHCPU is available",
                self.engine_type
            )));
        }
        if self.film_width == 0 || self.film_height == 0 {
            return Err(RenderError::Config(format!(
                "Invalid film size: {}x{}",
                self.film_width, self.film_height
            )));
        }
        if self.radiance_group_count == 0 {
            return Err(RenderError::config("At least one radiance group is required"));
        }
        if self.hybrid_back_forward && self.sampler_type == SamplerType::Metropolis {
            return Err(RenderError::config(
                "path.hybridbackforward.enable can not be used with the METROPOLIS sampler",
            ));
        }
        if self.clamping_max_variance < 0.0 || !self.clamping_max_variance.is_finite() {
            return Err(RenderError::Config(format!(
                "path.clamping.variance.maxvalue must be >= 0: {}",
                self.clamping_max_variance
            )));
        }
        if self.sampler_type == SamplerType::Metropolis || self.hybrid_back_forward {
            let p = &self.sampler_params;
            if !(0.0..=1.0).contains(&p.large_step_rate) {
                return Err(RenderError::Config(format!(
                    "sampler.metropolis.largesteprate must be in [0, 1]: {}",
                    p.large_step_rate
                )));
            }
            if p.image_mutation_rate <= 0.0 || !(0.0..=1.0).contains(&p.image_mutation_rate) {
                return Err(RenderError::Config(format!(
                    "sampler.metropolis.imagemutationrate must be in (0, 1]: {}",
                    p.image_mutation_rate
                )));
            }
        }
        return Ok(());
    }

    /// Number of render threads, resolving 0 to the available parallelism.
    pub fn get_thread_count(&self) -> usize {
        if self.thread_count > 0 {
            return self.thread_count;
        }
        return std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
    }

    pub fn get_variance_clamping(&self) -> VarianceClamping {
        return VarianceClamping::new(self.clamping_max_variance);
    }

    /// Film channels needed by the radiance groups, the AOVs, the outputs and
    /// the noise estimator.
    pub fn get_film_channels(&self) -> Vec<FilmChannel> {
        let mut channels = FilmChannel::default_set(self.radiance_group_count);
        if self.alpha_channel {
            channels.push(FilmChannel::Alpha);
        }
        if self.depth_channel {
            channels.push(FilmChannel::Depth);
        }
        if self.shading_normal_channel {
            channels.push(FilmChannel::ShadingNormal);
        }
        if self.object_id_channel {
            channels.push(FilmChannel::ObjectId);
        }
        channels.extend(self.outputs.required_channels());
        if self.halt.threshold > 0.0 {
            if let Some(c) = self.halt.estimator.required_channel() {
                channels.push(c);
            }
        }
        let mut unique: Vec<FilmChannel> = Vec::new();
        for c in channels {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        return unique;
    }

    /// A new empty film with the configured size, channels and halt conditions.
    pub fn create_film(&self) -> Film {
        let mut film = Film::new(self.film_width, self.film_height, &self.get_film_channels());
        film.set_halt_conditions(&self.halt);
        return film;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let config = RenderConfig::from_properties(&Properties::new()).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert!(config.validate().is_ok());
        assert!(config.get_thread_count() >= 1);
        assert_eq!(config.get_film_channels(), FilmChannel::default_set(1));
    }

    #[test]
    fn test_002() {
        let mut props = Properties::new();
        props.add_string("sampler.type", "SOBOL");
        props.add_int("film.width", 32);
        props.add_int("film.height", 16);
        props.add_bool("film.channels.depth", true);
        props.add_string("film.outputs.0.type", "OBJECT_ID");
        props.add_string("film.outputs.0.filename", "id.png");
        props.add_float("batch.haltthreshold", 0.02);
        props.add_string("batch.haltthreshold.estimator", "VARIANCE");
        props.add_float("path.clamping.variance.maxvalue", 9.0);
        let config = RenderConfig::from_properties(&props).unwrap();
        assert_eq!(config.sampler_type, SamplerType::Sobol);
        assert_eq!(config.get_variance_clamping().get_bound(), 3.0);
        let channels = config.get_film_channels();
        assert!(channels.contains(&FilmChannel::Depth));
        assert!(channels.contains(&FilmChannel::ObjectId));
        assert!(channels.contains(&FilmChannel::NoiseMoments));
        let film = config.create_film();
        assert_eq!(film.get_width(), 32);
        assert!((film.get_halt_conditions().threshold - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_003() {
        let mut props = Properties::new();
        props.add_string("sampler.type", "HALTON");
        assert!(matches!(
            RenderConfig::from_properties(&props),
            Err(RenderError::Config(_))
        ));

        let mut props = Properties::new();
        props.add_string("renderengine.type", "BIDIRCPU");
        let config = RenderConfig::from_properties(&props).unwrap();
        assert!(config.validate().is_err());

        let config = RenderConfig {
            sampler_type: SamplerType::Metropolis,
            hybrid_back_forward: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RenderConfig {
            film_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
