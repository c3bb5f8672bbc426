//! Session configuration file support.
//!
//! Everything a computation needs is carried in one [`SessionConfig`] value,
//! read from a TOML file and then overridden by command-line flags. Every
//! section is optional.

use std::fs;
use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use observing_site::{GeoPosition, HorizonMask};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::equipment;
use crate::optics::{InstrumentSpec, DEFAULT_OVERLAP};
use crate::power::{Battery, PowerBudget, PowerItem};
use crate::visibility::SamplingPlan;
use crate::weather::WeatherConditions;
use crate::{PlanError, Result};

/// Telescope and camera, by preset name and/or explicit numbers.
/// Explicit numbers win over the preset values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    #[serde(default)]
    pub telescope: Option<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub focal_length_mm: Option<f64>,
    #[serde(default)]
    pub sensor_width_mm: Option<f64>,
    #[serde(default)]
    pub sensor_height_mm: Option<f64>,
    #[serde(default)]
    pub pixel_size_um: Option<f64>,
}

impl InstrumentConfig {
    pub fn resolve(&self) -> Result<InstrumentSpec> {
        let telescope = match &self.telescope {
            Some(name) => equipment::telescope(name)
                .ok_or_else(|| PlanError::InvalidEquipment(format!("unknown telescope '{}'", name)))?,
            None => &equipment::TELESCOPES[0],
        };
        let camera = match &self.camera {
            Some(name) => equipment::camera(name)
                .ok_or_else(|| PlanError::InvalidEquipment(format!("unknown camera '{}'", name)))?,
            None => &equipment::CAMERAS[0],
        };

        let preset = equipment::instrument(telescope, camera);
        Ok(InstrumentSpec {
            focal_length_mm: self.focal_length_mm.unwrap_or(preset.focal_length_mm),
            sensor_width_mm: self.sensor_width_mm.unwrap_or(preset.sensor_width_mm),
            sensor_height_mm: self.sensor_height_mm.unwrap_or(preset.sensor_height_mm),
            pixel_size_um: self.pixel_size_um.unwrap_or(preset.pixel_size_um),
        })
    }
}

/// Sampling plans for the catalog survey and the selected-target view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SamplingSettings {
    #[serde(default = "default_survey")]
    pub survey: SamplingPlan,
    #[serde(default = "default_drill_down")]
    pub drill_down: SamplingPlan,
}

fn default_survey() -> SamplingPlan {
    SamplingPlan::SURVEY
}

fn default_drill_down() -> SamplingPlan {
    SamplingPlan::DRILL_DOWN
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            survey: default_survey(),
            drill_down: default_drill_down(),
        }
    }
}

/// Framing options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FramingSettings {
    #[serde(default = "default_overlap")]
    pub mosaic_overlap: f64,
    /// Apparent motion of a comet target, arcsec per minute
    #[serde(default)]
    pub comet_speed_arcsec_per_min: Option<f64>,
}

fn default_overlap() -> f64 {
    DEFAULT_OVERLAP
}

impl Default for FramingSettings {
    fn default() -> Self {
        Self {
            mosaic_overlap: default_overlap(),
            comet_speed_arcsec_per_min: None,
        }
    }
}

/// All inputs of a planning session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Observer location; the default site is used when absent
    #[serde(default)]
    pub observer: Option<GeoPosition>,
    /// Offset used to display rise/set times, minutes east of UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub horizon: HorizonMask,
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub battery: Battery,
    #[serde(default)]
    pub power: Vec<PowerItem>,
    #[serde(default)]
    pub sampling: SamplingSettings,
    #[serde(default)]
    pub framing: FramingSettings,
    /// Manually entered conditions, used when no weather service is wired in
    #[serde(default)]
    pub weather: Option<WeatherConditions>,
}

impl SessionConfig {
    /// Load a session from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PlanError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded session config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| PlanError::Configuration(format!("Failed to parse config file: {}", e)))?;
        if let Some(observer) = &config.observer {
            observer.validate()?;
        }
        Ok(config)
    }

    pub fn observer(&self) -> GeoPosition {
        GeoPosition::or_default(self.observer)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| {
            warn!("UTC offset of {} min out of range, using UTC", self.utc_offset_minutes);
            Utc.fix()
        })
    }

    pub fn instrument(&self) -> Result<InstrumentSpec> {
        self.instrument.resolve()
    }

    pub fn power_budget(&self) -> PowerBudget {
        PowerBudget {
            battery: self.battery,
            items: self.power.clone(),
        }
    }

    /// Replace the mask with an imported table. On error the current mask
    /// is kept and the error returned.
    pub fn import_horizon(&mut self, table: &str) -> Result<()> {
        let mask = observing_site::table::from_table_str(table)?;
        if mask.is_fallback() {
            warn!("Imported horizon has fewer than two points, the default limit applies");
        }
        self.horizon = mask;
        Ok(())
    }

    pub fn import_horizon_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let table = fs::read_to_string(path.as_ref())?;
        self.import_horizon(&table)?;
        info!("Imported horizon table {}", path.as_ref().display());
        Ok(())
    }
}
