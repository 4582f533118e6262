pub mod config_dir;
pub mod misc;
pub mod progressreporter;

pub use config_dir::*;
pub use misc::*;
pub use progressreporter::*;
