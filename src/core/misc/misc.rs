use crate::core::base::*;

#[inline]
pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        return 12.92 * value;
    } else {
        return 1.055 * Float::powf(value, 1.0 / 2.4) - 0.055;
    }
}

pub fn erf_inv(x: Float) -> Float {
    let x = Float::clamp(x, -0.99999, 0.99999);
    let mut w = -Float::ln((1.0 - x) * (1.0 + x));
    let mut p;
    if w < 5.0 {
        w -= 2.5;
        p = 2.81022636e-08;
        p = 3.43273939e-07 + p * w;
        p = -3.5233877e-06 + p * w;
        p = -4.39150654e-06 + p * w;
        p = 0.00021858087 + p * w;
        p = -0.00125372503 + p * w;
        p = -0.00417768164 + p * w;
        p = 0.246640727 + p * w;
        p = 1.50140941 + p * w;
    } else {
        w = Float::sqrt(w) - 3.0;
        p = -0.000200214257;
        p = 0.000100950558 + p * w;
        p = 0.00134934322 + p * w;
        p = -0.00367342844 + p * w;
        p = 0.00573950773 + p * w;
        p = -0.0076224613 + p * w;
        p = 0.00943887047 + p * w;
        p = 1.00167406 + p * w;
        p = 2.83297682 + p * w;
    }
    return p * x;
}

/// 64 bit finalizer of MurmurHash3.
#[inline]
pub fn mix_bits(v: u64) -> u64 {
    let mut v = v;
    v ^= v >> 33;
    v = v.wrapping_mul(0xff51afd7ed558ccd);
    v ^= v >> 33;
    v = v.wrapping_mul(0xc4ceb9fe1a85ec53);
    v ^= v >> 33;
    return v;
}

/// Maps a hash to a float in [0, 1).
#[inline]
pub fn hash_to_float(v: u64) -> Float {
    let f = (mix_bits(v) >> 32) as f64 * INV_2_POW_32;
    return Float::min(f as Float, ONE_MINUS_EPSILON);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        assert_eq!(erf_inv(0.0), 0.0);
        assert!(erf_inv(0.5) > 0.0);
        assert!((erf_inv(-0.5) + erf_inv(0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_002() {
        for i in 0..1000 {
            let f = hash_to_float(i);
            assert!((0.0..1.0).contains(&f));
        }
        assert_ne!(mix_bits(1), mix_bits(2));
    }
}
