pub mod rgb;

pub use rgb::RGBSpectrum;

pub type Spectrum = RGBSpectrum;
