pub mod photons;
pub mod procedural;

pub use photons::*;
pub use procedural::*;
