//! Catalog records and their resolution into plannable targets.
//!
//! Records arrive as JSON objects. Fixed objects carry RA/Dec either as
//! strings (RA in hours, Dec in degrees, sexagesimal or decimal) or as plain
//! numbers in decimal degrees; solar-system objects carry a body name.

use serde::{Deserialize, Serialize};
use sky_position::{Coordinates, Equatorial, SolarSystemBody};
use tracing::{info, warn};

use crate::{PlanError, Result};

/// RA or Dec as found in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CoordinateValue {
    Degrees(f64),
    Text(String),
}

/// Apparent size as written in a catalog: one number for a round object,
/// or explicit width and height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SizeValue {
    Round(f64),
    Extent { width: f64, height: f64 },
}

/// Apparent size in arcminutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AngularSize {
    pub width_arcmin: f64,
    pub height_arcmin: f64,
}

impl AngularSize {
    pub fn largest(&self) -> f64 {
        self.width_arcmin.max(self.height_arcmin)
    }
}

/// One raw catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    pub name: String,
    #[serde(default)]
    pub ra: Option<CoordinateValue>,
    #[serde(default)]
    pub dec: Option<CoordinateValue>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, alias = "size")]
    pub size_arcmin: Option<SizeValue>,
    #[serde(default, alias = "conseil")]
    pub advice: Option<String>,
}

/// A target ready for planning. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CelestialTarget {
    pub name: String,
    pub coordinates: Coordinates,
    pub size: Option<AngularSize>,
    pub advice: Option<String>,
}

impl CelestialTarget {
    pub fn fixed(name: impl Into<String>, ra_deg: f64, dec_deg: f64) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            coordinates: Coordinates::Equatorial(Equatorial::new(ra_deg, dec_deg)?),
            size: None,
            advice: None,
        })
    }

    pub fn body(body: SolarSystemBody) -> Self {
        Self {
            name: body.name().to_string(),
            coordinates: Coordinates::SolarSystem { body },
            size: None,
            advice: None,
        }
    }

    pub fn with_size(mut self, width_arcmin: f64, height_arcmin: f64) -> Self {
        self.size = Some(AngularSize {
            width_arcmin,
            height_arcmin,
        });
        self
    }
}

fn ra_degrees(value: &CoordinateValue) -> Result<f64> {
    match value {
        CoordinateValue::Degrees(d) => Ok(*d),
        CoordinateValue::Text(s) => Ok(sky_position::coords::parse_ra(s)?),
    }
}

fn dec_degrees(value: &CoordinateValue) -> Result<f64> {
    match value {
        CoordinateValue::Degrees(d) => Ok(*d),
        CoordinateValue::Text(s) => Ok(sky_position::coords::parse_dec(s)?),
    }
}

impl CatalogRecord {
    /// Validate the record and build its target.
    pub fn resolve(&self) -> Result<CelestialTarget> {
        let coordinates = match (&self.body, &self.ra, &self.dec) {
            (Some(body), _, _) => Coordinates::SolarSystem {
                body: body.parse::<SolarSystemBody>()?,
            },
            (None, Some(ra), Some(dec)) => {
                Coordinates::Equatorial(Equatorial::new(ra_degrees(ra)?, dec_degrees(dec)?)?)
            }
            _ => {
                return Err(PlanError::InvalidCoordinates(format!(
                    "'{}' has neither RA/Dec nor a body name",
                    self.name
                )))
            }
        };

        let size = match self.size_arcmin {
            None => None,
            Some(SizeValue::Round(d)) => Some((d, d)),
            Some(SizeValue::Extent { width, height }) => Some((width, height)),
        };
        let size = match size {
            Some((w, h)) if w.is_finite() && h.is_finite() && w >= 0.0 && h >= 0.0 => Some(AngularSize {
                width_arcmin: w,
                height_arcmin: h,
            }),
            Some((w, h)) => {
                warn!("Ignoring invalid size {}x{} for '{}'", w, h, self.name);
                None
            }
            None => None,
        };

        Ok(CelestialTarget {
            name: self.name.clone(),
            coordinates,
            size,
            advice: self.advice.clone(),
        })
    }
}

/// Resolve a batch. Bad records are reported alongside the good ones and
/// never stop the rest of the batch.
pub fn resolve_all(records: &[CatalogRecord]) -> (Vec<CelestialTarget>, Vec<(String, PlanError)>) {
    let mut targets = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        match record.resolve() {
            Ok(target) => targets.push(target),
            Err(e) => {
                warn!("Skipping catalog entry '{}': {}", record.name, e);
                rejected.push((record.name.clone(), e));
            }
        }
    }

    info!(
        "Resolved {} catalog targets ({} rejected)",
        targets.len(),
        rejected.len()
    );
    (targets, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<CatalogRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_sexagesimal_record() {
        let recs = records(
            r#"[{"name": "M31 Andromède", "ra": "00h42m44.3s", "dec": "+41d16m09s",
                 "size_arcmin": 178, "conseil": "Long focal, 3h minimum"}]"#,
        );
        let target = recs[0].resolve().unwrap();
        match target.coordinates {
            Coordinates::Equatorial(eq) => {
                assert!((eq.ra_deg - 10.684583).abs() < 1e-5);
                assert!((eq.dec_deg - 41.269167).abs() < 1e-5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(target.size.unwrap().width_arcmin, 178.0);
        assert_eq!(target.advice.as_deref(), Some("Long focal, 3h minimum"));
    }

    #[test]
    fn test_decimal_degree_record_and_extent() {
        let recs = records(
            r#"[{"name": "M42", "ra": 83.82, "dec": -5.39, "size": {"width": 85, "height": 60}}]"#,
        );
        let target = recs[0].resolve().unwrap();
        assert_eq!(
            target.coordinates,
            Coordinates::Equatorial(Equatorial {
                ra_deg: 83.82,
                dec_deg: -5.39
            })
        );
        let size = target.size.unwrap();
        assert_eq!((size.width_arcmin, size.height_arcmin), (85.0, 60.0));
        assert_eq!(size.largest(), 85.0);
    }

    #[test]
    fn test_body_record() {
        let recs = records(r#"[{"name": "Saturne", "body": "saturne"}]"#);
        let target = recs[0].resolve().unwrap();
        assert_eq!(
            target.coordinates,
            Coordinates::SolarSystem {
                body: SolarSystemBody::Saturn
            }
        );
    }

    #[test]
    fn test_batch_keeps_going_past_bad_entries() {
        let recs = records(
            r#"[
                {"name": "Good", "ra": "05 35 17.3", "dec": "-05 23 28"},
                {"name": "Bad dec", "ra": "01h00m", "dec": "+95d00m"},
                {"name": "No coords"},
                {"name": "Pluto", "body": "pluto"},
                {"name": "Also good", "ra": "12.5", "dec": "10"}
            ]"#,
        );
        let (targets, rejected) = resolve_all(&recs);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].name, "Also good");
        assert_eq!(rejected.len(), 3);
        assert!(matches!(rejected[0].1, PlanError::InvalidCoordinates(_)));
        assert!(matches!(rejected[2].1, PlanError::Unavailable(_)));
    }

    #[test]
    fn test_negative_size_dropped() {
        let recs = records(r#"[{"name": "X", "ra": 10.0, "dec": 10.0, "size_arcmin": -3}]"#);
        assert!(recs[0].resolve().unwrap().size.is_none());
    }
}
