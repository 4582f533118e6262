use super::channel::FilmChannel;
use super::film::Film;
use crate::core::base::*;
use crate::core::error::*;
use crate::core::misc::*;
use crate::core::param_set::*;

use image::{Rgb32FImage, RgbImage};
use log::*;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmOutputType {
    Rgb,
    Alpha,
    Depth,
    ShadingNormal,
    ObjectId,
    SampleCount,
}

impl FilmOutputType {
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "RGB" => Ok(FilmOutputType::Rgb),
            "ALPHA" => Ok(FilmOutputType::Alpha),
            "DEPTH" => Ok(FilmOutputType::Depth),
            "SHADING_NORMAL" => Ok(FilmOutputType::ShadingNormal),
            "OBJECT_ID" => Ok(FilmOutputType::ObjectId),
            "SAMPLECOUNT" => Ok(FilmOutputType::SampleCount),
            _ => Err(RenderError::Config(format!("Unknown film output type: {}", name))),
        }
    }

    /// Channel the output is read from. RGB combines every radiance channel.
    pub fn get_channel(&self) -> Option<FilmChannel> {
        match self {
            FilmOutputType::Rgb => None,
            FilmOutputType::Alpha => Some(FilmChannel::Alpha),
            FilmOutputType::Depth => Some(FilmChannel::Depth),
            FilmOutputType::ShadingNormal => Some(FilmChannel::ShadingNormal),
            FilmOutputType::ObjectId => Some(FilmChannel::ObjectId),
            FilmOutputType::SampleCount => Some(FilmChannel::SampleCount),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilmOutput {
    pub output_type: FilmOutputType,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilmOutputs {
    pub outputs: Vec<FilmOutput>,
}

impl FilmOutputs {
    pub fn new() -> Self {
        FilmOutputs::default()
    }

    pub fn add(&mut self, output_type: FilmOutputType, file_name: &str) {
        self.outputs.push(FilmOutput {
            output_type,
            file_name: String::from(file_name),
        });
    }

    pub fn len(&self) -> usize {
        return self.outputs.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.outputs.is_empty();
    }

    /// Reads `film.outputs.<n>.type` / `film.outputs.<n>.filename` pairs,
    /// ordered by `n`.
    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let mut indices: Vec<u32> = Vec::new();
        for key in props.keys_with_prefix("film.outputs.") {
            let rest = &key["film.outputs.".len()..];
            if let Some(index) = rest.strip_suffix(".type") {
                match index.parse::<u32>() {
                    Ok(i) => indices.push(i),
                    Err(_) => warn!("Ignoring malformed film output property {}", key),
                }
            }
        }
        indices.sort();
        let mut outputs = FilmOutputs::new();
        for i in indices {
            let prefix = format!("film.outputs.{}", i);
            let output_type =
                FilmOutputType::from_name(&props.find_one_string(&format!("{}.type", prefix), ""))?;
            let file_name = props.find_one_string(&format!("{}.filename", prefix), "");
            if file_name.is_empty() {
                return Err(RenderError::Config(format!("{}.filename is missing", prefix)));
            }
            outputs.add(output_type, &file_name);
        }
        return Ok(outputs);
    }

    /// Channels the film needs for these outputs.
    pub fn required_channels(&self) -> Vec<FilmChannel> {
        return self
            .outputs
            .iter()
            .filter_map(|o| o.output_type.get_channel())
            .collect();
    }
}

fn to_byte(v: Float) -> u8 {
    Float::clamp(255.0 * gamma_correct(v), 0.0, 255.0) as u8
}

fn is_float_format(name: &str) -> bool {
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        return ext.eq_ignore_ascii_case("exr");
    }
    return false;
}

fn write_image(name: &str, rgb: Vec<Float>, width: u32, height: u32) -> Result<(), RenderError> {
    if is_float_format(name) {
        let img = Rgb32FImage::from_vec(width, height, rgb)
            .ok_or_else(|| RenderError::Film(format!("bad image buffer for {}", name)))?;
        img.save(name)?;
    } else {
        let bytes: Vec<u8> = rgb.iter().map(|v| to_byte(*v)).collect();
        let img = RgbImage::from_vec(width, height, bytes)
            .ok_or_else(|| RenderError::Film(format!("bad image buffer for {}", name)))?;
        img.save(name)?;
    }
    Ok(())
}

fn expand_to_rgb(values: &[Float]) -> Vec<Float> {
    let mut rgb = Vec::with_capacity(values.len() * 3);
    for v in values.iter() {
        rgb.extend_from_slice(&[*v, *v, *v]);
    }
    return rgb;
}

/// Scales a scalar AOV into [0, 1] for display formats.
fn normalize(values: &mut [Float]) {
    let max = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(0.0, |m: Float, v| Float::max(m, *v));
    for v in values.iter_mut() {
        *v = if v.is_finite() && max > 0.0 { *v / max } else { 0.0 };
    }
}

pub fn save_output(film: &Film, output: &FilmOutput) -> Result<(), RenderError> {
    let name = output.file_name.as_str();
    let float_format = is_float_format(name);
    info!("Writing {:?} output to {}", output.output_type, name);
    let rgb = match output.output_type.get_channel() {
        None => film.get_image_rgb(),
        Some(channel) => {
            let mut values = film.get_channel_image(&channel).ok_or_else(|| {
                RenderError::Film(format!("{} output requires the {} channel", name, channel))
            })?;
            match output.output_type {
                FilmOutputType::ShadingNormal => {
                    if !float_format {
                        for v in values.iter_mut() {
                            *v = 0.5 * *v + 0.5;
                        }
                    }
                    values
                }
                FilmOutputType::Alpha => expand_to_rgb(&values),
                _ => {
                    if !float_format {
                        normalize(&mut values);
                    }
                    expand_to_rgb(&values)
                }
            }
        }
    };
    return write_image(name, rgb, film.get_width(), film.get_height());
}

pub fn save_outputs(film: &Film, outputs: &FilmOutputs) -> Result<(), RenderError> {
    for output in outputs.outputs.iter() {
        save_output(film, output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut props = Properties::new();
        props.add_string("film.outputs.1.type", "DEPTH");
        props.add_string("film.outputs.1.filename", "depth.exr");
        props.add_string("film.outputs.0.type", "RGB");
        props.add_string("film.outputs.0.filename", "image.png");
        let outputs = FilmOutputs::from_properties(&props).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.outputs[0].output_type, FilmOutputType::Rgb);
        assert_eq!(outputs.outputs[1].file_name, "depth.exr");
        assert_eq!(outputs.required_channels(), vec![FilmChannel::Depth]);

        props.add_string("film.outputs.2.type", "BEAUTY");
        props.add_string("film.outputs.2.filename", "x.png");
        assert!(FilmOutputs::from_properties(&props).is_err());
    }

    #[test]
    fn test_002() {
        let mut values = vec![1.0, 4.0, Float::INFINITY, 2.0];
        normalize(&mut values);
        assert_eq!(values, vec![0.25, 1.0, 0.0, 0.5]);
        assert!(is_float_format("a.EXR"));
        assert!(!is_float_format("a.png"));
    }
}
