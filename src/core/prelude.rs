pub use super::base::*;
pub use super::config::*;
pub use super::error::*;
pub use super::film::*;
pub use super::geometry::*;
pub use super::integrator::*;
pub use super::misc::*;
pub use super::param_set::*;
pub use super::photongi::*;
pub use super::rng::*;
pub use super::sampler::*;
pub use super::scene::*;
pub use super::spectrum::*;
pub use super::stats::*;
pub use super::variance_clamping::*;
