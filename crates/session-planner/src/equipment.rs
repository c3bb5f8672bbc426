//! Built-in telescope and camera presets, addressable by name.

use serde::Serialize;

use crate::optics::InstrumentSpec;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Telescope {
    pub name: &'static str,
    /// Effective focal length, reducer included
    pub focal_length_mm: f64,
    pub aperture_mm: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Camera {
    pub name: &'static str,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub pixel_size_um: f64,
}

pub const TELESCOPES: &[Telescope] = &[Telescope {
    name: "SW Evolux 62 ED + Reducteur 0.85x",
    focal_length_mm: 340.0,
    aperture_mm: 62.0,
}];

pub const CAMERAS: &[Camera] = &[Camera {
    name: "ZWO ASI 183 MC Pro",
    sensor_width_mm: 13.2,
    sensor_height_mm: 8.8,
    pixel_size_um: 2.4,
}];

fn matches(preset: &str, query: &str) -> bool {
    preset.eq_ignore_ascii_case(query.trim())
}

pub fn telescope(name: &str) -> Option<&'static Telescope> {
    TELESCOPES.iter().find(|t| matches(t.name, name))
}

pub fn camera(name: &str) -> Option<&'static Camera> {
    CAMERAS.iter().find(|c| matches(c.name, name))
}

/// Combine a telescope and a camera.
pub fn instrument(telescope: &Telescope, camera: &Camera) -> InstrumentSpec {
    InstrumentSpec {
        focal_length_mm: telescope.focal_length_mm,
        sensor_width_mm: camera.sensor_width_mm,
        sensor_height_mm: camera.sensor_height_mm,
        pixel_size_um: camera.pixel_size_um,
    }
}

/// First telescope on the first camera.
pub fn default_instrument() -> InstrumentSpec {
    instrument(&TELESCOPES[0], &CAMERAS[0])
}
