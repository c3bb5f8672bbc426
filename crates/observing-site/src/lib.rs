//! Observing Site Library
//!
//! The observer's location and local horizon obstruction profile.
//! A [`HorizonMask`] answers one question: how high must a target be at a
//! given azimuth to clear the trees, roofs and hills around the site.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod table;

pub use sky_position::GeoPosition;

/// Limit used whenever the mask cannot answer (empty sector table,
/// imported profile with fewer than two points).
pub const DEFAULT_LIMIT_DEG: f64 = 15.0;

const MAX_LIMIT_DEG: f64 = 90.0;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Invalid horizon table{}: {reason}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidMaskTable { line: Option<u64>, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MaskError>;

/// One imported (azimuth, altitude) sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProfilePoint {
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum MaskShape {
    /// N equal sectors, sector 0 centred on north
    Sectors(Vec<f64>),
    /// Sorted by azimuth in [0, 360), unique azimuths
    Profile(Vec<ProfilePoint>),
}

/// Local obstruction profile: minimum altitude as a function of azimuth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MaskSpec", into = "MaskSpec")]
pub struct HorizonMask {
    shape: MaskShape,
}

/// Serialized form of a mask (session files, JSON reports).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskSpec {
    Sectors { limits_deg: Vec<f64> },
    Profile { points: Vec<(f64, f64)> },
}

/// One row of the compass rendering of a mask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompassSector {
    pub label: String,
    pub center_azimuth_deg: f64,
    pub limit_deg: f64,
}

fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    let a = azimuth_deg.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

fn clamp_limit(altitude_deg: f64) -> f64 {
    if altitude_deg.is_finite() {
        altitude_deg.clamp(0.0, MAX_LIMIT_DEG)
    } else {
        DEFAULT_LIMIT_DEG
    }
}

fn sector_labels(count: usize) -> Vec<String> {
    const FOUR: [&str; 4] = ["N", "E", "S", "W"];
    const EIGHT: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    match count {
        4 => FOUR.iter().map(|s| s.to_string()).collect(),
        8 => EIGHT.iter().map(|s| s.to_string()).collect(),
        n => (0..n).map(|i| format!("S{}", i + 1)).collect(),
    }
}

impl HorizonMask {
    /// Sector table; values are clamped into [0, 90].
    pub fn from_sectors(limits_deg: Vec<f64>) -> Self {
        let limits = limits_deg.into_iter().map(clamp_limit).collect();
        Self {
            shape: MaskShape::Sectors(limits),
        }
    }

    /// `count` sectors all at the same limit.
    pub fn uniform(count: usize, limit_deg: f64) -> Self {
        Self::from_sectors(vec![limit_deg; count])
    }

    /// Imported (azimuth, altitude) samples, interpolated linearly and
    /// wrapped at 360°. Samples must be finite; altitudes are clamped into
    /// [0, 90] and repeated azimuths keep their first occurrence.
    pub fn from_profile(samples: Vec<(f64, f64)>) -> Result<Self> {
        let mut points = Vec::with_capacity(samples.len());
        for (i, (az, alt)) in samples.into_iter().enumerate() {
            if !(az.is_finite() && alt.is_finite()) {
                return Err(MaskError::InvalidMaskTable {
                    line: None,
                    reason: format!("sample {} is not a finite (azimuth, altitude) pair", i + 1),
                });
            }
            points.push(ProfilePoint {
                azimuth_deg: normalize_azimuth(az),
                altitude_deg: clamp_limit(alt),
            });
        }
        points.sort_by(|a, b| a.azimuth_deg.total_cmp(&b.azimuth_deg));
        points.dedup_by(|later, earlier| later.azimuth_deg == earlier.azimuth_deg);

        Ok(Self {
            shape: MaskShape::Profile(points),
        })
    }

    /// Minimum altitude (degrees) a target must exceed at `azimuth_deg`.
    pub fn limit(&self, azimuth_deg: f64) -> f64 {
        if !azimuth_deg.is_finite() {
            return DEFAULT_LIMIT_DEG;
        }
        match &self.shape {
            MaskShape::Sectors(limits) => sector_limit(limits, azimuth_deg),
            MaskShape::Profile(points) => profile_limit(points, azimuth_deg),
        }
    }

    /// True when the mask cannot answer and every query returns the default.
    pub fn is_fallback(&self) -> bool {
        match &self.shape {
            MaskShape::Sectors(limits) => limits.is_empty(),
            MaskShape::Profile(points) => points.len() < 2,
        }
    }

    /// Per-direction rows for a polar chart. Profiles are read at the eight
    /// compass points.
    pub fn compass(&self) -> Vec<CompassSector> {
        let count = match &self.shape {
            MaskShape::Sectors(limits) if !limits.is_empty() => limits.len(),
            _ => 8,
        };
        let width = 360.0 / count as f64;
        sector_labels(count)
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let center = i as f64 * width;
                CompassSector {
                    label,
                    center_azimuth_deg: center,
                    limit_deg: self.limit(center),
                }
            })
            .collect()
    }

    pub fn to_spec(&self) -> MaskSpec {
        match &self.shape {
            MaskShape::Sectors(limits) => MaskSpec::Sectors {
                limits_deg: limits.clone(),
            },
            MaskShape::Profile(points) => MaskSpec::Profile {
                points: points.iter().map(|p| (p.azimuth_deg, p.altitude_deg)).collect(),
            },
        }
    }
}

impl Default for HorizonMask {
    /// Eight sectors at the default limit.
    fn default() -> Self {
        Self::uniform(8, DEFAULT_LIMIT_DEG)
    }
}

impl From<MaskSpec> for HorizonMask {
    fn from(spec: MaskSpec) -> Self {
        match spec {
            MaskSpec::Sectors { limits_deg } => Self::from_sectors(limits_deg),
            MaskSpec::Profile { points } => {
                let before = points.len();
                let finite: Vec<(f64, f64)> = points
                    .into_iter()
                    .filter(|(az, alt)| az.is_finite() && alt.is_finite())
                    .collect();
                if finite.len() != before {
                    warn!("Dropped {} non-finite horizon samples", before - finite.len());
                }
                // Only non-finite samples can fail and those are gone
                Self::from_profile(finite).unwrap_or_else(|_| Self::from_sectors(Vec::new()))
            }
        }
    }
}

impl From<HorizonMask> for MaskSpec {
    fn from(mask: HorizonMask) -> Self {
        mask.to_spec()
    }
}

fn sector_limit(limits: &[f64], azimuth_deg: f64) -> f64 {
    if limits.is_empty() {
        debug!("Empty sector table, using default horizon limit");
        return DEFAULT_LIMIT_DEG;
    }
    let count = limits.len();
    let width = 360.0 / count as f64;
    let shifted = (azimuth_deg + width / 2.0).rem_euclid(360.0);
    let index = ((shifted / width).floor() as usize).min(count - 1);
    limits[index]
}

fn profile_limit(points: &[ProfilePoint], azimuth_deg: f64) -> f64 {
    if points.len() < 2 {
        debug!("Horizon profile has {} points, using default limit", points.len());
        return DEFAULT_LIMIT_DEG;
    }
    let az = normalize_azimuth(azimuth_deg);
    let first = points[0];
    let last = points[points.len() - 1];

    // Wrap segment joins the last sample to the first one, 360° later
    let (lo, hi) = if az >= last.azimuth_deg {
        let wrapped = ProfilePoint {
            azimuth_deg: first.azimuth_deg + 360.0,
            ..first
        };
        (last, wrapped)
    } else if az < first.azimuth_deg {
        let wrapped = ProfilePoint {
            azimuth_deg: last.azimuth_deg - 360.0,
            ..last
        };
        (wrapped, first)
    } else {
        let idx = points.partition_point(|p| p.azimuth_deg <= az);
        (points[idx - 1], points[idx])
    };

    let span = hi.azimuth_deg - lo.azimuth_deg;
    if span <= 0.0 {
        return lo.altitude_deg;
    }
    let fraction = (az - lo.azimuth_deg) / span;
    lo.altitude_deg + fraction * (hi.altitude_deg - lo.altitude_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn french_garden() -> HorizonMask {
        // N, NE, E, SE, S, SW, W, NW
        HorizonMask::from_sectors(vec![15.0, 15.0, 20.0, 30.0, 15.0, 15.0, 20.0, 15.0])
    }

    #[test]
    fn test_uniform_mask_east() {
        let mask = HorizonMask::uniform(8, 15.0);
        assert_eq!(mask.limit(90.0), 15.0);
        assert!(20.0 > mask.limit(90.0));
    }

    #[test]
    fn test_sector_index_with_half_sector_offset() {
        let mask = french_garden();
        // floor((100 + 22.5) / 45) = 2 -> E
        assert_eq!(mask.limit(100.0), 20.0);
        assert_eq!(mask.limit(0.0), 15.0);
        assert_eq!(mask.limit(135.0), 30.0);
        assert_eq!(mask.limit(350.0), 15.0);
    }

    #[test]
    fn test_boundary_belongs_to_clockwise_sector() {
        let mask = french_garden();
        // 112.5 is the E/SE boundary
        assert_eq!(mask.limit(112.4), 20.0);
        assert_eq!(mask.limit(112.5), 30.0);
        // 337.5 is the NW/N boundary
        assert_eq!(mask.limit(337.5), 15.0);
    }

    #[test]
    fn test_negative_and_large_azimuths_wrap() {
        let mask = french_garden();
        assert_eq!(mask.limit(-260.0), mask.limit(100.0));
        assert_eq!(mask.limit(100.0 + 720.0), 20.0);
    }

    #[test]
    fn test_four_sector_mask() {
        let mask = HorizonMask::from_sectors(vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(mask.limit(44.9), 10.0);
        assert_eq!(mask.limit(45.0), 20.0);
        assert_eq!(mask.limit(180.0), 30.0);
        assert_eq!(mask.limit(300.0), 40.0);
    }

    #[test]
    fn test_sector_values_clamped() {
        let mask = HorizonMask::from_sectors(vec![-5.0, 120.0, f64::NAN, 30.0]);
        assert_eq!(mask.limit(0.0), 0.0);
        assert_eq!(mask.limit(90.0), 90.0);
        assert_eq!(mask.limit(180.0), DEFAULT_LIMIT_DEG);
    }

    #[test]
    fn test_empty_sectors_fall_back() {
        let mask = HorizonMask::from_sectors(Vec::new());
        assert!(mask.is_fallback());
        assert_eq!(mask.limit(123.0), DEFAULT_LIMIT_DEG);
    }

    #[test]
    fn test_profile_interpolation() {
        let mask = HorizonMask::from_profile(vec![(0.0, 10.0), (90.0, 30.0), (180.0, 10.0)]).unwrap();
        assert!((mask.limit(45.0) - 20.0).abs() < 1e-12);
        assert!((mask.limit(90.0) - 30.0).abs() < 1e-12);
        assert!((mask.limit(135.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_wraps_through_north() {
        let mask = HorizonMask::from_profile(vec![(90.0, 20.0), (270.0, 40.0)]).unwrap();
        // Wrap segment 270 -> 450 (=90), halfway is 0/360
        assert!((mask.limit(0.0) - 30.0).abs() < 1e-12);
        assert!((mask.limit(315.0) - 35.0).abs() < 1e-12);
        assert!((mask.limit(45.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_unsorted_and_duplicates() {
        let mask =
            HorizonMask::from_profile(vec![(180.0, 10.0), (0.0, 20.0), (180.0, 80.0), (360.0, 50.0)])
                .unwrap();
        // 360 normalizes to 0 and is a duplicate of the first 0 sample
        assert_eq!(mask.limit(0.0), 20.0);
        assert_eq!(mask.limit(180.0), 10.0);
    }

    #[test]
    fn test_short_profile_falls_back() {
        let mask = HorizonMask::from_profile(vec![(10.0, 40.0)]).unwrap();
        assert!(mask.is_fallback());
        assert_eq!(mask.limit(10.0), DEFAULT_LIMIT_DEG);
    }

    #[test]
    fn test_profile_rejects_non_finite() {
        let err = HorizonMask::from_profile(vec![(0.0, 10.0), (f64::NAN, 5.0)]).unwrap_err();
        assert!(matches!(err, MaskError::InvalidMaskTable { .. }));
    }

    #[test]
    fn test_compass_labels() {
        let rows = french_garden().compass();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[2].label, "E");
        assert_eq!(rows[2].limit_deg, 20.0);
        assert_eq!(rows[3].center_azimuth_deg, 135.0);
    }

    #[test]
    fn test_serde_roundtrip_through_mask_spec() {
        let json = r#"{"kind":"sectors","limits_deg":[15,15,20,30,15,15,20,15]}"#;
        let mask: HorizonMask = serde_json::from_str(json).unwrap();
        assert_eq!(mask, french_garden());

        let toml_src = "kind = \"profile\"\npoints = [[270.0, 40.0], [90.0, 20.0]]\n";
        let mask: HorizonMask = toml::from_str(toml_src).unwrap();
        assert!((mask.limit(0.0) - 30.0).abs() < 1e-12);
    }

    proptest::proptest! {
        #[test]
        fn prop_sector_limit_in_range(
            limits in proptest::collection::vec(-20.0f64..120.0, 0..16),
            az in 0.0f64..360.0,
        ) {
            let mask = HorizonMask::from_sectors(limits);
            let l = mask.limit(az);
            proptest::prop_assert!(l.is_finite() && (0.0..=90.0).contains(&l));
        }

        #[test]
        fn prop_profile_limit_in_range(
            samples in proptest::collection::vec((-720.0f64..720.0, -20.0f64..120.0), 0..24),
            az in 0.0f64..360.0,
        ) {
            let mask = HorizonMask::from_profile(samples).unwrap();
            let l = mask.limit(az);
            proptest::prop_assert!(l.is_finite() && (0.0..=90.0).contains(&l));
        }

        #[test]
        fn prop_limit_is_periodic(
            samples in proptest::collection::vec((0.0f64..360.0, 0.0f64..90.0), 2..24),
            az in -720.0f64..720.0,
        ) {
            let mask = HorizonMask::from_profile(samples).unwrap();
            proptest::prop_assert!((mask.limit(az) - mask.limit(az + 360.0)).abs() < 1e-6);
            let sectors = HorizonMask::from_sectors(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
            let a = sectors.limit(az);
            let b = sectors.limit(az + 360.0);
            // Only an exact sector boundary can round differently
            let on_boundary = ((az + 22.5).rem_euclid(45.0)).abs() < 1e-9
                || (45.0 - (az + 22.5).rem_euclid(45.0)).abs() < 1e-9;
            proptest::prop_assert!(a == b || on_boundary);
        }
    }
}
