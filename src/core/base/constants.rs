use super::types::Float;
use std::time::Duration;

/// Largest float below one.
pub const ONE_MINUS_EPSILON: Float = 0.99999994;

pub const PI: Float = std::f32::consts::PI;
pub const SQRT_2: Float = std::f32::consts::SQRT_2;

// 1 / 2^32
pub const INV_2_POW_32: f64 = 2.3283064365386963e-10;

/// Interval at which a paused render thread checks whether it may continue.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Film tiles are the unit of write synchronization.
pub const FILM_TILE_SIZE: usize = 32;
