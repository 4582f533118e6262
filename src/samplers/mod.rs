pub mod create_sampler;
pub mod metropolis;
pub mod random;
pub mod sobol;

pub use create_sampler::{create_sampler, SamplerVariant};
pub use metropolis::MetropolisSampler;
pub use random::RandomSampler;
pub use sobol::SobolSampler;
