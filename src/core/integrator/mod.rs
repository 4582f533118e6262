mod light_transport;
mod path_tracer;

pub use light_transport::*;
pub use path_tracer::*;
