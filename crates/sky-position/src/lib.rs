//! Sky Position Library
//!
//! Target and observer types for the session planner, and the seam through
//! which they become altitude/azimuth. The default backend, [`ApparentSky`],
//! delegates precession, nutation, sidereal time and the Solar System
//! ephemerides to the `celestial` crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod apparent;
pub mod coords;

pub use apparent::ApparentSky;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkyError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, SkyError>;

/// Observer location on the Earth's surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

impl GeoPosition {
    /// Used when the session has no geolocation (Paris Observatory).
    pub const DEFAULT: GeoPosition = GeoPosition {
        latitude: 48.8363,
        longitude: 2.3364,
        elevation_m: 67.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        Self::with_elevation(latitude, longitude, 0.0)
    }

    pub fn with_elevation(latitude: f64, longitude: f64, elevation_m: f64) -> Result<Self> {
        let pos = Self {
            latitude,
            longitude,
            elevation_m,
        };
        pos.validate()?;
        Ok(pos)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude)) {
            return Err(SkyError::InvalidCoordinates(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude)) {
            return Err(SkyError::InvalidCoordinates(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if !self.elevation_m.is_finite() {
            return Err(SkyError::InvalidCoordinates("elevation is not finite".into()));
        }
        Ok(())
    }

    /// Resolve an optional geolocation, falling back to [`GeoPosition::DEFAULT`].
    pub fn or_default(position: Option<GeoPosition>) -> GeoPosition {
        position.unwrap_or(Self::DEFAULT)
    }
}

impl Default for GeoPosition {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fixed equatorial coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Equatorial {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl Equatorial {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        if !(ra_deg.is_finite() && (0.0..360.0).contains(&ra_deg)) {
            return Err(SkyError::InvalidCoordinates(format!(
                "right ascension {}° outside [0, 360)",
                ra_deg
            )));
        }
        if !(dec_deg.is_finite() && (-90.0..=90.0).contains(&dec_deg)) {
            return Err(SkyError::InvalidCoordinates(format!(
                "declination {}° outside [-90, 90]",
                dec_deg
            )));
        }
        Ok(Self { ra_deg, dec_deg })
    }

    /// Parse catalog strings: RA in hours, Dec in degrees.
    pub fn parse(ra: &str, dec: &str) -> Result<Self> {
        let ra_deg = coords::parse_ra(ra)?;
        let dec_deg = coords::parse_dec(dec)?;
        Self::new(ra_deg, dec_deg)
    }

    pub fn ra_string(&self) -> String {
        coords::format_ra(self.ra_deg)
    }

    pub fn dec_string(&self) -> String {
        coords::format_dec(self.dec_deg)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SolarSystemBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl SolarSystemBody {
    pub const ALL: [SolarSystemBody; 9] = [
        Self::Sun,
        Self::Moon,
        Self::Mercury,
        Self::Venus,
        Self::Mars,
        Self::Jupiter,
        Self::Saturn,
        Self::Uranus,
        Self::Neptune,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
        }
    }
}

impl fmt::Display for SolarSystemBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolarSystemBody {
    type Err = SkyError;

    /// Accepts English and French body names, case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sun" | "soleil" => Ok(Self::Sun),
            "moon" | "lune" => Ok(Self::Moon),
            "mercury" | "mercure" => Ok(Self::Mercury),
            "venus" | "vénus" => Ok(Self::Venus),
            "mars" => Ok(Self::Mars),
            "jupiter" => Ok(Self::Jupiter),
            "saturn" | "saturne" => Ok(Self::Saturn),
            "uranus" => Ok(Self::Uranus),
            "neptune" => Ok(Self::Neptune),
            other => Err(SkyError::Unavailable(format!(
                "no ephemeris for body '{}'",
                other
            ))),
        }
    }
}

/// Where a target's position comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Coordinates {
    Equatorial(Equatorial),
    SolarSystem { body: SolarSystemBody },
}

impl Coordinates {
    /// J2000 equatorial position at `time` (constant for catalog objects).
    pub fn equatorial_at(&self, time: DateTime<Utc>) -> Result<Equatorial> {
        match self {
            Coordinates::Equatorial(eq) => Ok(*eq),
            Coordinates::SolarSystem { body } => apparent::body_equatorial(*body, time),
        }
    }
}

/// Instantaneous position in the observer's horizon frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Horizontal {
    /// Degrees above the horizon
    pub altitude_deg: f64,
    /// Degrees from north, clockwise, in [0, 360)
    pub azimuth_deg: f64,
}

/// Seam for the ephemeris backend.
pub trait HorizontalTransform {
    fn to_horizontal(
        &self,
        coordinates: &Coordinates,
        observer: &GeoPosition,
        time: DateTime<Utc>,
    ) -> Result<Horizontal>;
}

/// Horizontal coordinates with the default backend.
pub fn to_horizontal(
    coordinates: &Coordinates,
    observer: &GeoPosition,
    time: DateTime<Utc>,
) -> Result<Horizontal> {
    ApparentSky.to_horizontal(coordinates, observer, time)
}
