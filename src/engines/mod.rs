pub mod cancel;
pub mod engine;
pub mod render_thread;

pub use cancel::*;
pub use engine::*;
pub use render_thread::*;
