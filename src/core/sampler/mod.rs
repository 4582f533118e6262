pub mod base_sampler;
mod params;
pub mod sample_result;
pub mod sampler;
pub mod shared_data;

pub use base_sampler::*;
pub use params::*;
pub use sample_result::*;
pub use sampler::*;
pub use shared_data::*;
