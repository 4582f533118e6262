pub mod barrier;
pub mod cache;
mod params;
pub mod snapshot;
pub mod tracer;

pub use barrier::*;
pub use cache::*;
pub use params::*;
pub use snapshot::*;
pub use tracer::*;
