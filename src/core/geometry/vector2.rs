use serde::{Deserialize, Serialize};

/// Film coordinates. Pixels use `i32`, continuous positions use `Float`.
#[derive(Debug, PartialEq, Default, Copy, Clone, Serialize, Deserialize)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> Vector2<T> {
    pub fn new(x: T, y: T) -> Self {
        Vector2::<T> { x, y }
    }
}

impl<T: Default> Vector2<T> {
    #[inline]
    pub fn zero() -> Self {
        Vector2::<T> {
            x: T::default(),
            y: T::default(),
        }
    }
}

impl Vector2<f32> {
    /// Pixel containing a continuous film position.
    #[inline]
    pub fn floor(&self) -> Vector2<i32> {
        Vector2::<i32> {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let a = Vector2::<f32>::new(1.5, -0.25);
        assert_eq!(a.floor(), Vector2::<i32>::new(1, -1));
        assert_eq!(Vector2::<i32>::zero(), Vector2::new(0, 0));
    }
}
