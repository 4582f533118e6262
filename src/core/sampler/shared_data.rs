use super::params::SamplerParams;
use super::sampler::SamplerType;
use crate::core::base::*;
use crate::core::film::*;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Hands out square pixel buckets to render threads in round robin order so
/// concurrent samplers mostly work on disjoint parts of the film.
#[derive(Debug)]
pub struct PixelBucketDispenser {
    width: u32,
    height: u32,
    bucket_size: u32,
    buckets_x: u32,
    bucket_count: u32,
    next_bucket: AtomicU32,
}

impl PixelBucketDispenser {
    pub fn new(width: u32, height: u32, bucket_size: u32) -> Self {
        let bucket_size = u32::max(1, bucket_size);
        let buckets_x = (width + bucket_size - 1) / bucket_size;
        let buckets_y = (height + bucket_size - 1) / bucket_size;
        PixelBucketDispenser {
            width,
            height,
            bucket_size,
            buckets_x,
            bucket_count: u32::max(1, buckets_x * buckets_y),
            next_bucket: AtomicU32::new(0),
        }
    }

    pub fn get_bucket_count(&self) -> u32 {
        return self.bucket_count;
    }

    pub fn next_bucket(&self) -> u32 {
        return self.next_bucket.fetch_add(1, Ordering::Relaxed) % self.bucket_count;
    }

    /// Pixel bounds `(x0, y0, x1, y1)` of a bucket, clipped to the film.
    pub fn bucket_bounds(&self, bucket: u32) -> (u32, u32, u32, u32) {
        let bx = bucket % self.buckets_x.max(1);
        let by = bucket / self.buckets_x.max(1);
        let x0 = bx * self.bucket_size;
        let y0 = by * self.bucket_size;
        let x1 = u32::min(x0 + self.bucket_size, self.width);
        let y1 = u32::min(y0 + self.bucket_size, self.height);
        return (x0, y0, x1, y1);
    }
}

/// Per-thread walk over the pixels of the current bucket.
#[derive(Debug, Default, Clone)]
pub struct PixelBucketCursor {
    bounds: (u32, u32, u32, u32),
    offset: u32,
    started: bool,
}

impl PixelBucketCursor {
    pub fn new() -> Self {
        PixelBucketCursor::default()
    }

    pub fn next_pixel(&mut self, dispenser: &PixelBucketDispenser) -> Point2i {
        let (x0, y0, x1, y1) = self.bounds;
        let area = (x1 - x0) * (y1 - y0);
        if !self.started || self.offset >= area {
            self.bounds = dispenser.bucket_bounds(dispenser.next_bucket());
            self.offset = 0;
            self.started = true;
        }
        let (x0, y0, x1, _) = self.bounds;
        let w = u32::max(1, x1 - x0);
        let p = Point2i::new((x0 + self.offset % w) as i32, (y0 + self.offset / w) as i32);
        self.offset += 1;
        return p;
    }
}

#[derive(Debug)]
pub struct RandomSamplerSharedData {
    pub buckets: PixelBucketDispenser,
}

impl RandomSamplerSharedData {
    pub fn new(film: &Film, params: &SamplerParams) -> Self {
        RandomSamplerSharedData {
            buckets: PixelBucketDispenser::new(
                film.get_width(),
                film.get_height(),
                params.bucket_size,
            ),
        }
    }
}

#[derive(Debug)]
pub struct SobolSamplerSharedData {
    pub buckets: PixelBucketDispenser,
    pub seed: u32,
    film_width: u32,
    pass_per_pixel: Vec<AtomicU32>,
}

impl SobolSamplerSharedData {
    /// Pass counters start at the samples a pixel already holds, so a film
    /// restored from disk continues the sequence instead of repeating it.
    pub fn new(film: &Film, params: &SamplerParams, seed: u32) -> Self {
        let pass_per_pixel: Vec<AtomicU32> = match film.get_channel_data(&FilmChannel::SampleCount)
        {
            Some(counts) => counts
                .iter()
                .map(|c| AtomicU32::new(Float::max(*c, 0.0) as u32))
                .collect(),
            None => {
                let spp = film.get_samples_per_pixel().ceil() as u32;
                (0..film.get_pixel_count())
                    .map(|_| AtomicU32::new(spp))
                    .collect()
            }
        };
        SobolSamplerSharedData {
            buckets: PixelBucketDispenser::new(
                film.get_width(),
                film.get_height(),
                params.bucket_size,
            ),
            seed,
            film_width: film.get_width(),
            pass_per_pixel,
        }
    }

    pub fn pixel_index(&self, p: &Point2i) -> usize {
        return p.y as usize * self.film_width as usize + p.x as usize;
    }

    /// Reserves the next Sobol pass of a pixel. Two threads landing on the
    /// same pixel never get the same pass.
    pub fn get_pass(&self, p: &Point2i) -> u32 {
        return self.pass_per_pixel[self.pixel_index(p)].load(Ordering::Relaxed);
    }

    pub fn next_pass(&self, p: &Point2i) -> u32 {
        let index = self.pixel_index(p);
        return self.pass_per_pixel[index].fetch_add(1, Ordering::Relaxed);
    }
}

/// Data shared by the samplers of every render thread of one engine run.
#[derive(Debug, Clone)]
pub enum SamplerSharedData {
    Random(Arc<RandomSamplerSharedData>),
    Sobol(Arc<SobolSamplerSharedData>),
    Metropolis,
}

impl SamplerSharedData {
    pub fn get_type(&self) -> SamplerType {
        match self {
            SamplerSharedData::Random(_) => SamplerType::Random,
            SamplerSharedData::Sobol(_) => SamplerType::Sobol,
            SamplerSharedData::Metropolis => SamplerType::Metropolis,
        }
    }
}

pub fn create_sampler_shared_data(
    sampler_type: SamplerType,
    film: &Film,
    params: &SamplerParams,
    seed: u32,
) -> SamplerSharedData {
    match sampler_type {
        SamplerType::Random => {
            SamplerSharedData::Random(Arc::new(RandomSamplerSharedData::new(film, params)))
        }
        SamplerType::Sobol => {
            SamplerSharedData::Sobol(Arc::new(SobolSamplerSharedData::new(film, params, seed)))
        }
        SamplerType::Metropolis => SamplerSharedData::Metropolis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let dispenser = PixelBucketDispenser::new(40, 20, 16);
        assert_eq!(dispenser.get_bucket_count(), 6);
        assert_eq!(dispenser.bucket_bounds(2), (32, 0, 40, 16));
        assert_eq!(dispenser.bucket_bounds(5), (32, 16, 40, 20));
        for i in 0..12 {
            assert_eq!(dispenser.next_bucket(), i % 6);
        }
    }

    #[test]
    fn test_002() {
        // a cursor visits every pixel of its bucket before moving on
        let dispenser = PixelBucketDispenser::new(4, 4, 2);
        let mut cursor = PixelBucketCursor::new();
        let mut seen = vec![0; 16];
        for _ in 0..16 {
            let p = cursor.next_pixel(&dispenser);
            seen[(p.y * 4 + p.x) as usize] += 1;
        }
        assert!(seen.iter().all(|n| *n == 1));
    }

    #[test]
    fn test_003() {
        // Sobol passes continue after the samples already in the film
        let film = Film::new(2, 1, &FilmChannel::default_set(1));
        let mut r = crate::core::sampler::SampleResult::new(1);
        r.film_x = 1.5;
        r.film_y = 0.5;
        for _ in 0..3 {
            assert!(film.add_sample_result(&r, 1.0));
        }
        let shared = SobolSamplerSharedData::new(&film, &SamplerParams::default(), 1);
        assert_eq!(shared.get_pass(&Point2i::new(0, 0)), 0);
        assert_eq!(shared.get_pass(&Point2i::new(1, 0)), 3);
        assert_eq!(shared.next_pass(&Point2i::new(1, 0)), 3);
        assert_eq!(shared.next_pass(&Point2i::new(1, 0)), 4);
    }
}
