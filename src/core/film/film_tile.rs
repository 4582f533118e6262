use super::channel::FilmChannel;
use crate::core::base::*;

/// Storage of one `FILM_TILE_SIZE` square of the film, for every channel.
/// A tile is always accessed under its own lock.
#[derive(Debug, Clone)]
pub struct FilmTile {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
    pub buffers: Vec<Vec<Float>>,
}

impl FilmTile {
    pub fn new(x0: u32, y0: u32, width: u32, height: u32, channels: &[FilmChannel]) -> Self {
        let mut tile = FilmTile {
            x0,
            y0,
            width,
            height,
            buffers: Vec::with_capacity(channels.len()),
        };
        let area = (width * height) as usize;
        for c in channels.iter() {
            tile.buffers.push(c.initial_values().repeat(area));
        }
        return tile;
    }

    #[inline]
    fn get_pixel_offset(&self, x: u32, y: u32) -> usize {
        return ((y - self.y0) * self.width + (x - self.x0)) as usize;
    }

    pub fn add(
        &mut self,
        slot: usize,
        channel: &FilmChannel,
        x: u32,
        y: u32,
        value: &[Float],
        weight: Float,
    ) {
        let stride = channel.stride();
        let offset = self.get_pixel_offset(x, y) * stride;
        channel.merge(&mut self.buffers[slot][offset..offset + stride], value, weight);
    }

    pub fn get(&self, slot: usize, channel: &FilmChannel, x: u32, y: u32) -> &[Float] {
        let stride = channel.stride();
        let offset = self.get_pixel_offset(x, y) * stride;
        return &self.buffers[slot][offset..offset + stride];
    }

    pub fn set(&mut self, slot: usize, channel: &FilmChannel, x: u32, y: u32, stored: &[Float]) {
        let stride = channel.stride();
        let offset = self.get_pixel_offset(x, y) * stride;
        self.buffers[slot][offset..offset + stride].copy_from_slice(&stored[0..stride]);
    }

    pub fn clear(&mut self, channels: &[FilmChannel]) {
        let area = (self.width * self.height) as usize;
        for (slot, c) in channels.iter().enumerate() {
            self.buffers[slot] = c.initial_values().repeat(area);
        }
    }
}
