use crate::core::base::*;
use std::sync::OnceLock;

const SOBOL_BITS: usize = 32;

// Joe-Kuo primitive polynomials: (degree, coefficients, initial direction numbers).
// Dimension 0 is the van der Corput sequence and is not listed.
const SOBOL_POLYNOMIALS: [(u32, u32, &[u32]); 20] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
];

pub const NUM_SOBOL_DIMENSIONS: usize = SOBOL_POLYNOMIALS.len() + 1;

type DirectionNumbers = [[u32; SOBOL_BITS]; NUM_SOBOL_DIMENSIONS];

fn build_direction_numbers() -> DirectionNumbers {
    let mut v = [[0u32; SOBOL_BITS]; NUM_SOBOL_DIMENSIONS];
    for i in 0..SOBOL_BITS {
        v[0][i] = 1u32 << (31 - i);
    }
    for (d, (s, a, m)) in SOBOL_POLYNOMIALS.iter().enumerate() {
        let s = *s as usize;
        let dv = &mut v[d + 1];
        for i in 0..s {
            dv[i] = m[i] << (31 - i);
        }
        for i in s..SOBOL_BITS {
            let mut x = dv[i - s] ^ (dv[i - s] >> s);
            for k in 1..s {
                if ((a >> (s - 1 - k)) & 1) != 0 {
                    x ^= dv[i - k];
                }
            }
            dv[i] = x;
        }
    }
    return v;
}

fn direction_numbers() -> &'static DirectionNumbers {
    static DIRECTIONS: OnceLock<DirectionNumbers> = OnceLock::new();
    return DIRECTIONS.get_or_init(build_direction_numbers);
}

/// Returns the `index`-th point of the Sobol sequence in `dimension`, or
/// `None` when the dimension is beyond the direction number table.
pub fn sobol_sample(index: u32, dimension: usize) -> Option<Float> {
    if dimension >= NUM_SOBOL_DIMENSIONS {
        return None;
    }
    let v = &direction_numbers()[dimension];
    let mut a = index;
    let mut x = 0u32;
    let mut i = 0;
    while a != 0 {
        if (a & 1) != 0 {
            x ^= v[i];
        }
        a >>= 1;
        i += 1;
    }
    let f = (x as f64 * INV_2_POW_32) as Float;
    return Some(Float::min(f, ONE_MINUS_EPSILON));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        // first points of the two leading dimensions
        let expected = [(0.0, 0.0), (0.5, 0.5), (0.25, 0.75), (0.75, 0.25)];
        for (i, (x, y)) in expected.iter().enumerate() {
            assert_eq!(sobol_sample(i as u32, 0), Some(*x));
            assert_eq!(sobol_sample(i as u32, 1), Some(*y));
        }
        assert_eq!(sobol_sample(0, NUM_SOBOL_DIMENSIONS), None);
    }

    #[test]
    fn test_002() {
        // every dimension is stratified over the first 2^k points
        let n = 64;
        for d in 0..NUM_SOBOL_DIMENSIONS {
            let mut strata = vec![false; n];
            for i in 0..n {
                let u = sobol_sample(i as u32, d).unwrap();
                assert!((0.0..1.0).contains(&u));
                strata[(u * n as Float) as usize] = true;
            }
            assert!(strata.iter().all(|s| *s), "dimension {}", d);
        }
    }
}
