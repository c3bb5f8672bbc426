//! Session Planner
//!
//! Composes the observing site, sky positions, optics and power budget into
//! the report an astrophotographer reads before a night out:
//! - Which catalog targets clear the local horizon now
//! - When the selected target rises and sets
//! - Field of view, plate scale and mosaic tiling
//! - Battery runtime for the equipment list
//! - Mount hand-off coordinates (text and CSV)

use observing_site::MaskError;
use sky_position::SkyError;
use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod equipment;
pub mod export;
pub mod optics;
pub mod planner;
pub mod power;
pub mod visibility;
pub mod weather;

// Re-exports
pub use catalog::{AngularSize, CatalogRecord, CelestialTarget};
pub use config::{InstrumentConfig, SessionConfig};
pub use equipment::{Camera, Telescope};
pub use export::HandoffRow;
pub use optics::{FieldOfView, FramingReport, InstrumentSpec, MosaicPlan};
pub use planner::{SessionPlanner, SessionReport, SurveyEntry};
pub use power::{Battery, PowerBudget, PowerDraw, PowerItem, PowerReport};
pub use visibility::{Sample, SamplingPlan, VisibilityResult, VisibilityWindow};
pub use weather::{ImagingWeatherScore, StaticWeather, UnavailableWeather, WeatherConditions, WeatherProvider};

pub use observing_site::{CompassSector, GeoPosition, HorizonMask};
pub use sky_position::{ApparentSky, Coordinates, Equatorial, SolarSystemBody};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid horizon table{}: {reason}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidMaskTable { line: Option<u64>, reason: String },
    #[error("Degenerate math: {0}")]
    DegenerateMath(String),
    #[error("Unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid equipment: {0}")]
    InvalidEquipment(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;

impl From<SkyError> for PlanError {
    fn from(err: SkyError) -> Self {
        match err {
            SkyError::InvalidCoordinates(msg) => PlanError::InvalidCoordinates(msg),
            SkyError::Unavailable(msg) => PlanError::Unavailable(msg),
        }
    }
}

impl From<MaskError> for PlanError {
    fn from(err: MaskError) -> Self {
        match err {
            MaskError::InvalidMaskTable { line, reason } => PlanError::InvalidMaskTable { line, reason },
            MaskError::Io(e) => PlanError::Io(e),
        }
    }
}

impl From<csv::Error> for PlanError {
    fn from(err: csv::Error) -> Self {
        PlanError::Io(err.into())
    }
}
