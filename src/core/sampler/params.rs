use crate::core::base::*;
use crate::core::param_set::*;

/// Per-instance sampler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerParams {
    pub bucket_size: u32,
    pub large_step_rate: Float,
    pub max_consecutive_reject: u32,
    pub image_mutation_rate: Float,
    pub add_only_caustics: bool,
    pub image_samples: bool,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            bucket_size: 16,
            large_step_rate: 0.4,
            max_consecutive_reject: 512,
            image_mutation_rate: 0.1,
            add_only_caustics: false,
            image_samples: true,
        }
    }
}

impl SamplerParams {
    pub fn from_properties(props: &Properties, sampler_name: &str) -> Self {
        let d = SamplerParams::default();
        let bucket_key = match sampler_name {
            "SOBOL" => "sampler.sobol.bucketsize",
            _ => "sampler.random.bucketsize",
        };
        SamplerParams {
            bucket_size: props.find_one_int(bucket_key, d.bucket_size as i64).max(1) as u32,
            large_step_rate: props
                .find_one_float("sampler.metropolis.largesteprate", d.large_step_rate),
            max_consecutive_reject: props
                .find_one_int(
                    "sampler.metropolis.maxconsecutivereject",
                    d.max_consecutive_reject as i64,
                )
                .max(0) as u32,
            image_mutation_rate: props.find_one_float(
                "sampler.metropolis.imagemutationrate",
                d.image_mutation_rate,
            ),
            add_only_caustics: props
                .find_one_bool("sampler.metropolis.addonlycaustics", d.add_only_caustics),
            image_samples: props.find_one_bool("sampler.imagesamples.enable", d.image_samples),
        }
    }

    /// Settings of the Metropolis light sampler used by hybrid back/forward
    /// path tracing: no image samples, only caustic paths are kept.
    pub fn light_sampler_params(&self) -> Self {
        let mut params = self.clone();
        params.image_samples = false;
        params.add_only_caustics = true;
        return params;
    }
}
