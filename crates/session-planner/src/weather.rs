//! Weather Input for Imaging Sessions
//!
//! Sky conditions enter the planner through [`WeatherProvider`]. Nothing in
//! this crate talks to a forecast service; the default provider reports that
//! weather is unavailable and a static provider replays conditions typed in
//! by the user.

use chrono::{DateTime, Utc};
use std::fmt;
use observing_site::GeoPosition;
use serde::{Deserialize, Serialize};

/// Conditions at the observing site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConditions {
    /// Cloud cover percentage (0-100)
    pub cloud_cover_pct: f64,
    /// Relative humidity (0-100), dew risk above ~85
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    /// Wind speed (m/s)
    #[serde(default)]
    pub wind_speed_ms: Option<f64>,
    /// Temperature (Celsius)
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Imaging quality score (0-1, 1 = optimal)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImagingWeatherScore {
    pub quality: f64,
    pub cloud_score: f64,
    pub dew_score: f64,
    pub wind_score: f64,
    pub imaging_viable: bool,
    pub degradation_reason: Option<String>,
}

impl fmt::Display for ImagingWeatherScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.quality * 100.0)?;
        match &self.degradation_reason {
            Some(reason) => write!(f, " ({})", reason),
            None if self.imaging_viable => write!(f, " (viable)"),
            None => Ok(()),
        }
    }
}

impl WeatherConditions {
    pub fn imaging_score(&self) -> ImagingWeatherScore {
        let cloud_score = 1.0 - (self.cloud_cover_pct / 100.0).clamp(0.0, 1.0);

        let dew_score = match self.humidity_pct {
            Some(h) if h >= 95.0 => 0.2,
            Some(h) if h >= 85.0 => 0.6,
            _ => 1.0,
        };

        // Long focal lengths suffer first from gusts
        let wind_score = match self.wind_speed_ms {
            Some(w) if w > 12.0 => 0.2,
            Some(w) if w > 7.0 => 0.6,
            _ => 1.0,
        };

        let quality = 0.70 * cloud_score + 0.15 * dew_score + 0.15 * wind_score;

        let (imaging_viable, degradation_reason) = if cloud_score < 0.3 {
            (false, Some("Overcast".to_string()))
        } else if wind_score < 0.3 {
            (false, Some("Too windy".to_string()))
        } else if quality < 0.4 {
            (false, Some("Multiple degradation factors".to_string()))
        } else {
            (true, None)
        };

        ImagingWeatherScore {
            quality,
            cloud_score,
            dew_score,
            wind_score,
            imaging_viable,
            degradation_reason,
        }
    }
}

/// Weather data provider interface
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at the observer, `None` when unavailable
    fn current(&self, observer: &GeoPosition) -> Option<WeatherConditions>;
}

/// Provider used when no weather source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableWeather;

impl WeatherProvider for UnavailableWeather {
    fn current(&self, _observer: &GeoPosition) -> Option<WeatherConditions> {
        None
    }
}

/// Replays one set of conditions, e.g. a manual cloud-cover entry.
#[derive(Debug, Clone)]
pub struct StaticWeather {
    conditions: WeatherConditions,
}

impl StaticWeather {
    pub fn new(conditions: WeatherConditions) -> Self {
        Self { conditions }
    }
}

impl WeatherProvider for StaticWeather {
    fn current(&self, _observer: &GeoPosition) -> Option<WeatherConditions> {
        Some(self.conditions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 5, 20, 0, 0).unwrap()
    }

    fn clear() -> WeatherConditions {
        WeatherConditions {
            cloud_cover_pct: 0.0,
            humidity_pct: None,
            wind_speed_ms: None,
            temperature_c: None,
            timestamp: at(),
        }
    }

    #[test]
    fn test_clear_sky_score() {
        let score = clear().imaging_score();
        assert!(score.quality > 0.99);
        assert!(score.imaging_viable);
        assert_eq!(score.to_string(), "100% (viable)");
    }

    #[test]
    fn test_overcast_blocks_imaging() {
        let wx = WeatherConditions {
            cloud_cover_pct: 90.0,
            humidity_pct: Some(70.0),
            wind_speed_ms: Some(2.0),
            temperature_c: Some(8.0),
            timestamp: at(),
        };
        let score = wx.imaging_score();
        assert!(!score.imaging_viable);
        assert_eq!(score.degradation_reason.as_deref(), Some("Overcast"));
        assert_eq!(score.to_string(), "37% (Overcast)");
    }

    #[test]
    fn test_dew_and_wind_degrade_quality() {
        let wx = WeatherConditions {
            humidity_pct: Some(96.0),
            wind_speed_ms: Some(9.0),
            ..clear()
        };
        let score = wx.imaging_score();
        assert!((score.quality - (0.70 + 0.15 * 0.2 + 0.15 * 0.6)).abs() < 1e-9);
        assert!(score.imaging_viable);
    }

    #[test]
    fn test_providers() {
        assert!(UnavailableWeather.current(&GeoPosition::DEFAULT).is_none());
        let provider = StaticWeather::new(clear());
        assert_eq!(provider.current(&GeoPosition::DEFAULT), Some(clear()));
    }
}
