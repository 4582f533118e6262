use super::channel::*;
use super::film_tile::*;
use super::halt::*;
use super::noise::*;
use crate::core::base::*;
use crate::core::sampler::SampleResult;
use crate::core::spectrum::*;
use crate::core::stats::*;

use log::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static INVALID_SAMPLES: LazyLock<StatCounter> =
    LazyLock::new(|| StatCounter::new("Film/Invalid samples discarded"));

#[derive(Debug, Default)]
struct FilmTimer {
    start: Option<Instant>,
    accumulated: f64,
}

impl FilmTimer {
    fn elapsed(&self) -> f64 {
        let running = self.start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
        return self.accumulated + running;
    }
}

struct NoiseTest {
    estimator: Box<dyn NoiseEstimator>,
    last_test_spp: f64,
}

/// Shared accumulation buffer of a render.
///
/// Writers lock only the `FILM_TILE_SIZE` tile they touch. Readers observe a
/// consistent value per pixel but not across the whole image while rendering.
pub struct Film {
    width: u32,
    height: u32,
    channels: Vec<FilmChannel>,
    slots: HashMap<FilmChannel, usize>,
    radiance_group_count: usize,

    tiles: Vec<Mutex<FilmTile>>,
    tiles_x: u32,

    eye_sample_count: AtomicU64,
    light_sample_count: AtomicU64,
    invalid_sample_count: AtomicU64,

    halt: HaltConditions,
    convergence: AtomicU32,
    threshold_progress: AtomicU32,
    noise_test: Mutex<NoiseTest>,
    timer: Mutex<FilmTimer>,
}

impl Film {
    pub fn new(width: u32, height: u32, channels: &[FilmChannel]) -> Self {
        let mut unique: Vec<FilmChannel> = Vec::new();
        for c in channels.iter() {
            if !unique.contains(c) {
                unique.push(*c);
            }
        }
        let slots: HashMap<FilmChannel, usize> =
            unique.iter().enumerate().map(|(i, c)| (*c, i)).collect();
        let radiance_group_count = unique
            .iter()
            .filter(|c| matches!(c, FilmChannel::RadiancePerPixelNormalized(_)))
            .count();

        let ts = FILM_TILE_SIZE as u32;
        let tiles_x = (width + ts - 1) / ts;
        let tiles_y = (height + ts - 1) / ts;
        let mut tiles = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = tx * ts;
                let y0 = ty * ts;
                let w = u32::min(ts, width - x0);
                let h = u32::min(ts, height - y0);
                tiles.push(Mutex::new(FilmTile::new(x0, y0, w, h, &unique)));
            }
        }

        info!(
            "Created film {}x{} with {} channels, {} tiles",
            width,
            height,
            unique.len(),
            tiles.len()
        );

        let halt = HaltConditions::default();
        Film {
            width,
            height,
            channels: unique,
            slots,
            radiance_group_count,
            tiles,
            tiles_x,
            eye_sample_count: AtomicU64::new(0),
            light_sample_count: AtomicU64::new(0),
            invalid_sample_count: AtomicU64::new(0),
            convergence: AtomicU32::new(0.0f32.to_bits()),
            threshold_progress: AtomicU32::new(0.0f32.to_bits()),
            noise_test: Mutex::new(NoiseTest {
                estimator: create_noise_estimator(halt.estimator),
                last_test_spp: 0.0,
            }),
            halt,
            timer: Mutex::new(FilmTimer::default()),
        }
    }

    pub fn get_width(&self) -> u32 {
        return self.width;
    }

    pub fn get_height(&self) -> u32 {
        return self.height;
    }

    pub fn get_pixel_count(&self) -> usize {
        return self.width as usize * self.height as usize;
    }

    pub fn get_radiance_group_count(&self) -> usize {
        return self.radiance_group_count;
    }

    pub fn get_channels(&self) -> &[FilmChannel] {
        return &self.channels;
    }

    pub fn has_channel(&self, channel: &FilmChannel) -> bool {
        return self.slots.contains_key(channel);
    }

    pub fn set_halt_conditions(&mut self, halt: &HaltConditions) {
        self.halt = halt.clone();
        if let Ok(mut test) = self.noise_test.lock() {
            test.estimator = create_noise_estimator(halt.estimator);
            test.last_test_spp = 0.0;
        }
        if let Some(c) = halt.estimator.required_channel() {
            if halt.threshold > 0.0 && !self.has_channel(&c) {
                warn!("Noise estimator requires the {} channel, which the film lacks", c);
            }
        }
    }

    pub fn get_halt_conditions(&self) -> &HaltConditions {
        return &self.halt;
    }

    #[inline]
    fn get_tile_index(&self, x: u32, y: u32) -> usize {
        let ts = FILM_TILE_SIZE as u32;
        return ((y / ts) * self.tiles_x + (x / ts)) as usize;
    }

    fn discard_invalid(&self) {
        let n = self.invalid_sample_count.fetch_add(1, Ordering::Relaxed);
        INVALID_SAMPLES.inc();
        if n == 0 {
            warn!("Discarding a sample with a NaN or infinite value");
        }
    }

    fn resolve_pixel(&self, film_x: Float, film_y: Float) -> Option<(u32, u32)> {
        if !(film_x >= 0.0 && film_y >= 0.0) {
            return None;
        }
        let x = film_x as u32;
        let y = film_y as u32;
        if x >= self.width || y >= self.height {
            return None;
        }
        return Some((x, y));
    }

    /// Merges one value into a pixel of a channel. Returns false when the
    /// contribution was rejected: unknown channel, out of range, or invalid.
    pub fn add_sample_contribution(
        &self,
        x: u32,
        y: u32,
        channel: &FilmChannel,
        value: &[Float],
        weight: Float,
    ) -> bool {
        let slot = match self.slots.get(channel) {
            Some(slot) => *slot,
            None => return false,
        };
        if x >= self.width || y >= self.height {
            return false;
        }
        if !channel.is_valid_value(value, weight) {
            self.discard_invalid();
            return false;
        }
        let mut tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
        tile.add(slot, channel, x, y, value, weight);
        return true;
    }

    /// Averages a sample into the pixel normalized channels and the AOVs.
    pub fn add_sample_result(&self, result: &SampleResult, weight: Float) -> bool {
        if !result.is_valid() || !weight.is_finite() {
            self.discard_invalid();
            return false;
        }
        let (x, y) = match self.resolve_pixel(result.film_x, result.film_y) {
            Some(p) => p,
            None => return false,
        };
        let mut tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
        for (slot, channel) in self.channels.iter().enumerate() {
            match channel {
                FilmChannel::RadiancePerPixelNormalized(i) => {
                    if let Some(r) = result.radiance.get(*i) {
                        tile.add(slot, channel, x, y, &r.c, weight);
                    }
                }
                FilmChannel::RadiancePerScreenNormalized(_) => {}
                FilmChannel::Alpha => {
                    tile.add(slot, channel, x, y, &[result.alpha], weight);
                }
                FilmChannel::Depth => {
                    tile.add(slot, channel, x, y, &[result.depth], weight);
                }
                FilmChannel::ShadingNormal => {
                    tile.add(slot, channel, x, y, &result.shading_normal, weight);
                }
                FilmChannel::ObjectId => {
                    if result.object_id != u32::MAX {
                        tile.add(slot, channel, x, y, &[result.object_id as Float], weight);
                    }
                }
                FilmChannel::SampleCount => {
                    tile.add(slot, channel, x, y, &[1.0], 1.0);
                }
                FilmChannel::NoiseMoments => {
                    let l = result.luminance();
                    tile.add(slot, channel, x, y, &[l, l * l], weight);
                }
            }
        }
        return true;
    }

    /// Accumulates a sample into the screen normalized radiance channels.
    pub fn splat_sample_result(&self, result: &SampleResult, weight: Float) -> bool {
        if !result.is_valid() || !weight.is_finite() {
            self.discard_invalid();
            return false;
        }
        let (x, y) = match self.resolve_pixel(result.film_x, result.film_y) {
            Some(p) => p,
            None => return false,
        };
        let mut tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
        for (i, r) in result.radiance.iter().enumerate() {
            let channel = FilmChannel::RadiancePerScreenNormalized(i);
            if let Some(slot) = self.slots.get(&channel) {
                let v = [r.c[0] * weight, r.c[1] * weight, r.c[2] * weight];
                tile.add(*slot, &channel, x, y, &v, 1.0);
            }
        }
        return true;
    }

    pub fn add_sample_count(&self, eye_samples: u64, light_samples: u64) {
        if eye_samples > 0 {
            self.eye_sample_count.fetch_add(eye_samples, Ordering::Relaxed);
        }
        if light_samples > 0 {
            self.light_sample_count.fetch_add(light_samples, Ordering::Relaxed);
        }
    }

    pub fn get_total_eye_sample_count(&self) -> u64 {
        return self.eye_sample_count.load(Ordering::Relaxed);
    }

    pub fn get_total_light_sample_count(&self) -> u64 {
        return self.light_sample_count.load(Ordering::Relaxed);
    }

    pub fn get_total_sample_count(&self) -> u64 {
        return self.get_total_eye_sample_count() + self.get_total_light_sample_count();
    }

    pub fn get_invalid_sample_count(&self) -> u64 {
        return self.invalid_sample_count.load(Ordering::Relaxed);
    }

    pub fn get_samples_per_pixel(&self) -> f64 {
        let pixel_count = self.get_pixel_count();
        if pixel_count == 0 {
            return 0.0;
        }
        return self.get_total_eye_sample_count() as f64 / pixel_count as f64;
    }

    /// Stored values of one pixel of a channel.
    pub fn get_pixel_value(&self, x: u32, y: u32, channel: &FilmChannel) -> Option<Vec<Float>> {
        let slot = *self.slots.get(channel)?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
        return Some(tile.get(slot, channel, x, y).to_vec());
    }

    fn get_screen_normalization(&self) -> Float {
        let light = self.get_total_light_sample_count();
        let samples = if light > 0 {
            light
        } else {
            self.get_total_eye_sample_count()
        };
        if samples == 0 {
            return 0.0;
        }
        return (self.get_pixel_count() as f64 / samples as f64) as Float;
    }

    fn resolve_radiance(&self, tile: &FilmTile, x: u32, y: u32, screen_scale: Float) -> Spectrum {
        let mut c = Spectrum::zero();
        for (slot, channel) in self.channels.iter().enumerate() {
            match channel {
                FilmChannel::RadiancePerPixelNormalized(_) => {
                    let v = channel.resolve(tile.get(slot, channel, x, y));
                    c += Spectrum::new(v[0], v[1], v[2]);
                }
                FilmChannel::RadiancePerScreenNormalized(_) => {
                    let v = tile.get(slot, channel, x, y);
                    c += Spectrum::new(v[0], v[1], v[2]) * screen_scale;
                }
                _ => {}
            }
        }
        return c;
    }

    /// Radiance of a pixel summed over every radiance group.
    pub fn get_pixel_radiance(&self, x: u32, y: u32) -> Spectrum {
        if x >= self.width || y >= self.height {
            return Spectrum::zero();
        }
        let screen_scale = self.get_screen_normalization();
        let tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
        return self.resolve_radiance(&tile, x, y, screen_scale);
    }

    /// Linear RGB image, row major, three floats per pixel.
    pub fn get_image_rgb(&self) -> Vec<Float> {
        let width = self.width as usize;
        let mut rgb = vec![0.0; 3 * self.get_pixel_count()];
        if width == 0 {
            return rgb;
        }
        let screen_scale = self.get_screen_normalization();
        rgb.par_chunks_mut(3 * width)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                let mut x = 0;
                while x < self.width {
                    let tile = self.tiles[self.get_tile_index(x, y)].lock().unwrap();
                    let x1 = tile.x0 + tile.width;
                    for xx in x..x1 {
                        let c = self.resolve_radiance(&tile, xx, y, screen_scale);
                        let i = 3 * xx as usize;
                        row[i] = c[0];
                        row[i + 1] = c[1];
                        row[i + 2] = c[2];
                    }
                    x = x1;
                }
            });
        return rgb;
    }

    /// Resolved per-pixel values of a channel, `arity` floats per pixel.
    pub fn get_channel_image(&self, channel: &FilmChannel) -> Option<Vec<Float>> {
        let data = self.get_channel_data(channel)?;
        let stride = channel.stride();
        let mut image = Vec::with_capacity(self.get_pixel_count() * channel.arity());
        let screen_scale = self.get_screen_normalization();
        for stored in data.chunks(stride) {
            match channel {
                FilmChannel::RadiancePerScreenNormalized(_) => {
                    image.extend(stored[0..3].iter().map(|v| v * screen_scale));
                }
                _ => image.extend(channel.resolve(stored)),
            }
        }
        return Some(image);
    }

    /// Stored raster of a channel, `stride` floats per pixel, row major.
    pub fn get_channel_data(&self, channel: &FilmChannel) -> Option<Vec<Float>> {
        let slot = *self.slots.get(channel)?;
        let stride = channel.stride();
        let width = self.width as usize;
        let mut data = vec![0.0; self.get_pixel_count() * stride];
        for tile in self.tiles.iter() {
            let tile = tile.lock().unwrap();
            let buffer = &tile.buffers[slot];
            let tw = tile.width as usize;
            for ty in 0..tile.height as usize {
                let src = ty * tw * stride;
                let dst = ((tile.y0 as usize + ty) * width + tile.x0 as usize) * stride;
                data[dst..dst + tw * stride].copy_from_slice(&buffer[src..src + tw * stride]);
            }
        }
        return Some(data);
    }

    /// Overwrites (`merge == false`) or merges a stored raster into a channel.
    pub fn set_channel_data(&self, channel: &FilmChannel, data: &[Float], merge: bool) -> bool {
        let slot = match self.slots.get(channel) {
            Some(slot) => *slot,
            None => return false,
        };
        let stride = channel.stride();
        if data.len() != self.get_pixel_count() * stride {
            return false;
        }
        let width = self.width as usize;
        for tile in self.tiles.iter() {
            let mut tile = tile.lock().unwrap();
            for y in tile.y0..tile.y0 + tile.height {
                for x in tile.x0..tile.x0 + tile.width {
                    let offset = (y as usize * width + x as usize) * stride;
                    let src = &data[offset..offset + stride];
                    if merge {
                        let mut stored = tile.get(slot, channel, x, y).to_vec();
                        channel.merge_stored(&mut stored, src);
                        tile.set(slot, channel, x, y, &stored);
                    } else {
                        tile.set(slot, channel, x, y, src);
                    }
                }
            }
        }
        return true;
    }

    pub fn set_sample_counts(&self, eye: u64, light: u64, invalid: u64) {
        self.eye_sample_count.store(eye, Ordering::Relaxed);
        self.light_sample_count.store(light, Ordering::Relaxed);
        self.invalid_sample_count.store(invalid, Ordering::Relaxed);
    }

    /// Clears every channel, counter and the convergence.
    pub fn reset(&self) {
        for tile in self.tiles.iter() {
            tile.lock().unwrap().clear(&self.channels);
        }
        self.set_sample_counts(0, 0, 0);
        self.convergence.store(0.0f32.to_bits(), Ordering::SeqCst);
        self.threshold_progress.store(0.0f32.to_bits(), Ordering::SeqCst);
        {
            let mut test = self.noise_test.lock().unwrap();
            test.estimator.reset();
            test.last_test_spp = 0.0;
        }
        *self.timer.lock().unwrap() = FilmTimer::default();
    }

    pub fn render_start(&self) {
        let mut timer = self.timer.lock().unwrap();
        if timer.start.is_none() {
            timer.start = Some(Instant::now());
        }
    }

    pub fn render_end(&self) {
        let mut timer = self.timer.lock().unwrap();
        if let Some(start) = timer.start.take() {
            timer.accumulated += start.elapsed().as_secs_f64();
        }
    }

    /// Rendering time in seconds, including time restored from a saved film.
    pub fn get_elapsed_time(&self) -> f64 {
        return self.timer.lock().unwrap().elapsed();
    }

    pub fn set_elapsed_time(&self, seconds: f64) {
        let mut timer = self.timer.lock().unwrap();
        timer.accumulated = seconds;
        if timer.start.is_some() {
            timer.start = Some(Instant::now());
        }
    }

    pub fn get_convergence(&self) -> Float {
        return Float::from_bits(self.convergence.load(Ordering::SeqCst));
    }

    fn update_threshold_progress(&self, spp: f64) -> Float {
        if let Ok(mut test) = self.noise_test.try_lock() {
            let step = self.halt.threshold_step as f64;
            if spp > 0.0 && spp - test.last_test_spp >= step {
                test.last_test_spp = spp;
                if let Some(noise) = test.estimator.estimate(self) {
                    let progress = if noise <= self.halt.threshold {
                        1.0
                    } else {
                        Float::min(self.halt.threshold / noise, ONE_MINUS_EPSILON)
                    };
                    debug!("Noise test at {:.1} spp: noise {}, progress {}", spp, noise, progress);
                    self.threshold_progress
                        .store(progress.to_bits(), Ordering::SeqCst);
                }
            }
        }
        return Float::from_bits(self.threshold_progress.load(Ordering::SeqCst));
    }

    /// Recomputes convergence from the halt conditions and returns it. The
    /// stored value never decreases; it is 1.0 once every enabled criterion is
    /// met and stays 0.0 when none is enabled.
    pub fn update_convergence(&self) -> Float {
        if !self.halt.is_enabled() {
            return self.get_convergence();
        }
        let mut progress: Float = 1.0;
        let spp = self.get_samples_per_pixel();
        if self.halt.spp > 0 {
            progress = Float::min(progress, criterion_progress(spp, self.halt.spp as f64));
        }
        if self.halt.time > 0.0 {
            let elapsed = self.get_elapsed_time();
            progress = Float::min(progress, criterion_progress(elapsed, self.halt.time));
        }
        if self.halt.threshold > 0.0 {
            progress = Float::min(progress, self.update_threshold_progress(spp));
        }
        // Bit patterns of non-negative floats sort like the floats themselves.
        self.convergence
            .fetch_max(progress.to_bits(), Ordering::SeqCst);
        return self.get_convergence();
    }
}
