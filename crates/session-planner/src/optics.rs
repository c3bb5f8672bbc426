//! Optical Frame Calculator
//!
//! Angular field of view of a telescope/camera pair, plate scale, mosaic
//! tiling for large targets, and the exposure limit for moving comets.

use serde::{Deserialize, Serialize};

use crate::catalog::AngularSize;
use crate::{PlanError, Result};

const ARCSEC_PER_RAD_OVER_1000: f64 = 206.265;
/// Targets wider than this many frames are flagged for a multi-panel mosaic
const OVERSIZE_FACTOR: f64 = 1.5;
pub const DEFAULT_OVERLAP: f64 = 0.2;

/// Telescope focal length and camera sensor geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    pub focal_length_mm: f64,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub pixel_size_um: f64,
}

fn require_positive(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PlanError::DegenerateMath(format!("{} must be positive, got {}", what, value)))
    }
}

/// Full field angle in degrees, `2·atan(sensor / 2f)`.
pub fn fov_degrees(focal_mm: f64, sensor_mm: f64) -> Result<f64> {
    let focal = require_positive(focal_mm, "focal length")?;
    let sensor = require_positive(sensor_mm, "sensor dimension")?;
    Ok((2.0 * (sensor / (2.0 * focal)).atan()).to_degrees())
}

/// Small-angle approximation `sensor / f` in degrees. Overestimates the
/// field slightly; kept for comparison only.
pub fn fov_degrees_small_angle(focal_mm: f64, sensor_mm: f64) -> Result<f64> {
    let focal = require_positive(focal_mm, "focal length")?;
    let sensor = require_positive(sensor_mm, "sensor dimension")?;
    Ok((sensor / focal).to_degrees())
}

/// Image scale in arcseconds per pixel.
pub fn plate_scale_arcsec(pixel_um: f64, focal_mm: f64) -> Result<f64> {
    let pixel = require_positive(pixel_um, "pixel size")?;
    let focal = require_positive(focal_mm, "focal length")?;
    Ok(pixel / focal * ARCSEC_PER_RAD_OVER_1000)
}

/// Longest sub-exposure before a comet trails across one pixel.
/// A stationary comet has no limit.
pub fn comet_max_exposure_s(arcsec_per_pixel: f64, speed_arcsec_per_min: f64) -> Result<f64> {
    let scale = require_positive(arcsec_per_pixel, "plate scale")?;
    if !speed_arcsec_per_min.is_finite() || speed_arcsec_per_min < 0.0 {
        return Err(PlanError::DegenerateMath(format!(
            "comet speed must be non-negative, got {}",
            speed_arcsec_per_min
        )));
    }
    if speed_arcsec_per_min == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(scale / (speed_arcsec_per_min / 60.0))
}

/// Field of view in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldOfView {
    pub width_deg: f64,
    pub height_deg: f64,
}

impl FieldOfView {
    pub fn of(spec: &InstrumentSpec) -> Result<Self> {
        Ok(Self {
            width_deg: fov_degrees(spec.focal_length_mm, spec.sensor_width_mm)?,
            height_deg: fov_degrees(spec.focal_length_mm, spec.sensor_height_mm)?,
        })
    }

    pub fn small_angle(spec: &InstrumentSpec) -> Result<Self> {
        Ok(Self {
            width_deg: fov_degrees_small_angle(spec.focal_length_mm, spec.sensor_width_mm)?,
            height_deg: fov_degrees_small_angle(spec.focal_length_mm, spec.sensor_height_mm)?,
        })
    }

    pub fn width_arcmin(&self) -> f64 {
        self.width_deg * 60.0
    }

    pub fn height_arcmin(&self) -> f64 {
        self.height_deg * 60.0
    }
}

/// Panel grid for a target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MosaicPlan {
    pub panels_w: u32,
    pub panels_h: u32,
    pub overlap: f64,
    /// Target wider than 1.5 frames
    pub oversized: bool,
}

impl MosaicPlan {
    pub fn panels(&self) -> u32 {
        self.panels_w * self.panels_h
    }

    pub fn is_mosaic(&self) -> bool {
        self.panels() > 1
    }
}

fn panels_along(size_arcmin: f64, frame_arcmin: f64, overlap: f64) -> u32 {
    let usable = frame_arcmin * (1.0 - overlap);
    let panels = (size_arcmin / usable).ceil();
    if panels.is_finite() && panels >= 1.0 {
        panels as u32
    } else {
        1
    }
}

/// Tile `size` with frames overlapping by `overlap` (fraction in [0, 1)).
pub fn plan_mosaic(fov: &FieldOfView, size: Option<&AngularSize>, overlap: f64) -> Result<MosaicPlan> {
    if !(overlap.is_finite() && (0.0..1.0).contains(&overlap)) {
        return Err(PlanError::DegenerateMath(format!(
            "mosaic overlap {} outside [0, 1)",
            overlap
        )));
    }
    let Some(size) = size else {
        return Ok(MosaicPlan {
            panels_w: 1,
            panels_h: 1,
            overlap,
            oversized: false,
        });
    };

    Ok(MosaicPlan {
        panels_w: panels_along(size.width_arcmin, fov.width_arcmin(), overlap),
        panels_h: panels_along(size.height_arcmin, fov.height_arcmin(), overlap),
        overlap,
        oversized: size.largest() > fov.width_arcmin() * OVERSIZE_FACTOR,
    })
}

/// Everything the framing tab shows for one instrument and target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FramingReport {
    pub fov: FieldOfView,
    /// Small-angle figure, for comparison with other calculators
    pub fov_small_angle: FieldOfView,
    pub arcsec_per_pixel: f64,
    pub mosaic: MosaicPlan,
    pub comet_max_exposure_s: Option<f64>,
    pub advice: String,
}

impl FramingReport {
    pub fn build(
        spec: &InstrumentSpec,
        size: Option<&AngularSize>,
        overlap: f64,
        comet_speed_arcsec_per_min: Option<f64>,
    ) -> Result<Self> {
        let fov = FieldOfView::of(spec)?;
        let fov_small_angle = FieldOfView::small_angle(spec)?;
        let arcsec_per_pixel = plate_scale_arcsec(spec.pixel_size_um, spec.focal_length_mm)?;
        let mosaic = plan_mosaic(&fov, size, overlap)?;
        let comet_max_exposure_s = comet_speed_arcsec_per_min
            .map(|speed| comet_max_exposure_s(arcsec_per_pixel, speed))
            .transpose()?;

        let advice = match size {
            Some(s) if mosaic.oversized => format!(
                "Target is large ({:.1}°): plan a mosaic of 2x2 or more ({}x{} suggested)",
                s.largest() / 60.0,
                mosaic.panels_w,
                mosaic.panels_h
            ),
            Some(_) if mosaic.is_mosaic() => format!(
                "Target slightly exceeds the frame: {}x{} mosaic",
                mosaic.panels_w, mosaic.panels_h
            ),
            Some(_) => "Target fits in the current field of view".to_string(),
            None => "No catalog size; single frame assumed".to_string(),
        };

        Ok(Self {
            fov,
            fov_small_angle,
            arcsec_per_pixel,
            mosaic,
            comet_max_exposure_s,
            advice,
        })
    }
}
