pub mod channel;
pub mod film;
pub mod film_tile;
pub mod halt;
pub mod noise;
pub mod outputs;
pub mod persist;

pub use channel::*;
pub use film::*;
pub use film_tile::*;
pub use halt::*;
pub use noise::*;
pub use outputs::*;
pub use persist::*;
