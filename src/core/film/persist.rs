use super::channel::FilmChannel;
use super::film::Film;
use crate::core::base::*;
use crate::core::error::*;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const FILM_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmChannelState {
    pub channel: FilmChannel,
    pub data: Vec<Float>,
}

/// Serializable image of a film, enough to resume rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmState {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub channels: Vec<FilmChannelState>,
    pub eye_sample_count: u64,
    pub light_sample_count: u64,
    pub invalid_sample_count: u64,
    pub elapsed_time: f64,
}

impl Film {
    pub fn get_state(&self) -> FilmState {
        let channels = self
            .get_channels()
            .iter()
            .filter_map(|c| {
                self.get_channel_data(c).map(|data| FilmChannelState {
                    channel: *c,
                    data,
                })
            })
            .collect();
        FilmState {
            version: FILM_STATE_VERSION,
            width: self.get_width(),
            height: self.get_height(),
            channels,
            eye_sample_count: self.get_total_eye_sample_count(),
            light_sample_count: self.get_total_light_sample_count(),
            invalid_sample_count: self.get_invalid_sample_count(),
            elapsed_time: self.get_elapsed_time(),
        }
    }

    pub fn from_state(state: &FilmState) -> Result<Film, RenderError> {
        let channels: Vec<FilmChannel> = state.channels.iter().map(|c| c.channel).collect();
        let film = Film::new(state.width, state.height, &channels);
        film.restore(state)?;
        return Ok(film);
    }

    /// Replaces the content of the film with a saved state. Dimensions must
    /// match; channels the film lacks are skipped with a warning.
    pub fn restore(&self, state: &FilmState) -> Result<(), RenderError> {
        if state.version != FILM_STATE_VERSION {
            return Err(RenderError::Film(format!(
                "unsupported film state version {}",
                state.version
            )));
        }
        if state.width != self.get_width() || state.height != self.get_height() {
            return Err(RenderError::Film(format!(
                "film size mismatch: saved {}x{}, current {}x{}",
                state.width,
                state.height,
                self.get_width(),
                self.get_height()
            )));
        }
        for c in state.channels.iter() {
            if c.data.len() != self.get_pixel_count() * c.channel.stride() {
                return Err(RenderError::Film(format!(
                    "corrupted {} channel: {} values",
                    c.channel,
                    c.data.len()
                )));
            }
        }
        self.reset();
        for c in state.channels.iter() {
            if !self.set_channel_data(&c.channel, &c.data, false) {
                warn!("Skipping saved channel {} not present in the film", c.channel);
            }
        }
        self.set_sample_counts(
            state.eye_sample_count,
            state.light_sample_count,
            state.invalid_sample_count,
        );
        self.set_elapsed_time(state.elapsed_time);
        return Ok(());
    }
}

pub fn save_film(film: &Film, path: &Path) -> Result<(), RenderError> {
    info!("Saving film to {}", path.display());
    let state = film.get_state();
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, &state)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(())
}

pub fn read_film_state(path: &Path) -> Result<FilmState, RenderError> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let state: FilmState = serde_json::from_reader(decoder)?;
    return Ok(state);
}

pub fn load_film(path: &Path) -> Result<Film, RenderError> {
    info!("Loading film from {}", path.display());
    let state = read_film_state(path)?;
    return Film::from_state(&state);
}

/// Loads a saved film into an existing one so rendering resumes from it.
pub fn restore_film(film: &Film, path: &Path) -> Result<(), RenderError> {
    info!("Restoring film from {}", path.display());
    let state = read_film_state(path)?;
    return film.restore(&state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let film = Film::new(3, 3, &FilmChannel::default_set(1));
        film.add_sample_contribution(
            1,
            2,
            &FilmChannel::RadiancePerPixelNormalized(0),
            &[1.0, 2.0, 3.0],
            1.0,
        );
        film.add_sample_count(9, 0);
        let state = film.get_state();
        assert_eq!(state.channels.len(), 3);
        let copy = Film::from_state(&state).unwrap();
        assert_eq!(copy.get_total_eye_sample_count(), 9);
        assert_eq!(copy.get_pixel_radiance(1, 2), film.get_pixel_radiance(1, 2));

        let other = Film::new(4, 3, &FilmChannel::default_set(1));
        assert!(other.restore(&state).is_err());
    }
}
