use serde::{Deserialize, Serialize};
use std::ops;

/// Photon positions and surface normals.
#[derive(Debug, PartialEq, Default, Copy, Clone, Serialize, Deserialize)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> Vector3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Vector3::<T> { x, y, z }
    }
}

impl Vector3<f32> {
    #[inline]
    pub fn dot(&self, rhs: &Self) -> f32 {
        return self.x * rhs.x + self.y * rhs.y + self.z * rhs.z;
    }

    #[inline]
    pub fn distance_squared(a: &Self, b: &Self) -> f32 {
        let d = *a - *b;
        return d.dot(&d);
    }

    /// Grid cell of a position already scaled to cell units.
    pub fn floor(&self) -> Vector3<i32> {
        Vector3::<i32> {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }
}

impl<T: ops::Sub<Output = T>> ops::Sub<Vector3<T>> for Vector3<T> {
    type Output = Vector3<T>;
    #[inline]
    fn sub(self, rhs: Vector3<T>) -> Self::Output {
        Vector3::<T> {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<T: ops::Mul<Output = T> + Copy> ops::Mul<T> for Vector3<T> {
    type Output = Vector3<T>;
    #[inline]
    fn mul(self, rhs: T) -> Self::Output {
        Vector3::<T> {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl<T: ops::Neg<Output = T>> ops::Neg for Vector3<T> {
    type Output = Vector3<T>;
    #[inline]
    fn neg(self) -> Self::Output {
        Vector3::<T> {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let a = Vector3::<f32>::new(1.0, 2.0, 2.0);
        let b = Vector3::<f32>::new(0.0, 1.0, 0.0);
        assert_eq!(a.dot(&b), 2.0);
        assert_eq!(Vector3::distance_squared(&a, &b), 6.0);
        assert_eq!((-a).z, -2.0);
        assert_eq!((a * 0.5).floor(), Vector3::<i32>::new(0, 1, 1));
        assert_eq!(Vector3::<f32>::new(-0.5, 1.5, 2.0).floor(), Vector3::<i32>::new(-1, 1, 2));
    }
}
