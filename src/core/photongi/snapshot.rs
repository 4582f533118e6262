use crate::core::base::*;
use crate::core::geometry::*;
use crate::core::spectrum::*;

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiancePhoton {
    pub p: Point3f,
    pub n: Normal3f,
    pub radiance: Spectrum,
}

/// Immutable, versioned photon cache. Render threads hold an `Arc` to the
/// snapshot they read, so a rebuild never invalidates a lookup in flight.
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    pub version: u64,
    pub photons: Vec<RadiancePhoton>,
    pub lookup_radius: Float,
    grid: HashMap<(i32, i32, i32), Vec<u32>>,
}

impl CacheSnapshot {
    pub fn new(version: u64, photons: Vec<RadiancePhoton>, lookup_radius: Float) -> Self {
        let mut grid: HashMap<(i32, i32, i32), Vec<u32>> = HashMap::new();
        for (i, photon) in photons.iter().enumerate() {
            let c = (photon.p * (1.0 / lookup_radius)).floor();
            grid.entry((c.x, c.y, c.z)).or_default().push(i as u32);
        }
        CacheSnapshot {
            version,
            photons,
            lookup_radius,
            grid,
        }
    }

    pub fn empty(lookup_radius: Float) -> Self {
        return CacheSnapshot::new(0, Vec::new(), lookup_radius);
    }

    pub fn len(&self) -> usize {
        return self.photons.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.photons.is_empty();
    }

    /// Radiance of the closest photon within the lookup radius whose normal
    /// lies in the same hemisphere as `n`.
    pub fn get_radiance(&self, p: &Point3f, n: &Normal3f) -> Option<Spectrum> {
        if self.photons.is_empty() {
            return None;
        }
        let c = (*p * (1.0 / self.lookup_radius)).floor();
        let max_dist2 = self.lookup_radius * self.lookup_radius;
        let mut best: Option<(Float, u32)> = None;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let key = (c.x + dx, c.y + dy, c.z + dz);
                    if let Some(indices) = self.grid.get(&key) {
                        for index in indices.iter() {
                            let photon = &self.photons[*index as usize];
                            let d2 = Vector3::distance_squared(&photon.p, p);
                            if d2 > max_dist2 || photon.n.dot(n) <= 0.0 {
                                continue;
                            }
                            // equal distances resolve to the smallest index
                            let closer = match best {
                                Some((bd2, bi)) => d2 < bd2 || (d2 == bd2 && *index < bi),
                                None => true,
                            };
                            if closer {
                                best = Some((d2, *index));
                            }
                        }
                    }
                }
            }
        }
        return best.map(|(_, i)| self.photons[i as usize].radiance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photon(x: Float, v: Float) -> RadiancePhoton {
        RadiancePhoton {
            p: Point3f::new(x, 0.0, 0.0),
            n: Normal3f::new(0.0, 0.0, 1.0),
            radiance: Spectrum::from(v),
        }
    }

    #[test]
    fn test_001() {
        let snapshot = CacheSnapshot::new(1, vec![photon(0.0, 1.0), photon(0.3, 2.0)], 0.15);
        let up = Normal3f::new(0.0, 0.0, 1.0);
        assert_eq!(
            snapshot.get_radiance(&Point3f::new(0.05, 0.0, 0.0), &up),
            Some(Spectrum::from(1.0))
        );
        assert_eq!(
            snapshot.get_radiance(&Point3f::new(0.26, 0.0, 0.0), &up),
            Some(Spectrum::from(2.0))
        );
        // out of radius
        assert_eq!(snapshot.get_radiance(&Point3f::new(0.15, 0.1, 0.1), &up), None);
        // wrong hemisphere
        assert_eq!(snapshot.get_radiance(&Point3f::new(0.0, 0.0, 0.0), &-up), None);
        assert!(CacheSnapshot::empty(0.1).is_empty());
    }
}
