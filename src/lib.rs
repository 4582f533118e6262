pub mod core;
pub mod engines;
pub mod samplers;
pub mod scenes;
