pub mod base;
pub mod config;
pub mod error;
pub mod film;
pub mod geometry;
pub mod integrator;
pub mod lowdiscrepancy;
pub mod misc;
pub mod param_set;
pub mod photongi;
pub mod prelude;
pub mod rng;
pub mod sampler;
pub mod scene;
pub mod spectrum;
pub mod stats;
pub mod variance_clamping;
