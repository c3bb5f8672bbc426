//! Visibility Window Sampler
//!
//! Samples a target's horizontal position over the coming hours, compares it
//! against the horizon mask and interpolates the first rise and set
//! crossings. Used for the ranked catalog and the altitude chart.

use chrono::{DateTime, Duration, Utc};
use observing_site::{GeoPosition, HorizonMask};
use serde::{Deserialize, Serialize};
use sky_position::{Coordinates, HorizontalTransform};
use tracing::debug;

use crate::{PlanError, Result};

/// Lookahead span and sample count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SamplingPlan {
    pub lookahead_hours: f64,
    pub samples: usize,
}

impl SamplingPlan {
    /// Coarse plan for refreshing a whole catalog (also the chart resolution).
    pub const SURVEY: SamplingPlan = SamplingPlan {
        lookahead_hours: 12.0,
        samples: 30,
    };

    /// Fine plan for a selected target, one sample every 2.5 minutes.
    pub const DRILL_DOWN: SamplingPlan = SamplingPlan {
        lookahead_hours: 12.0,
        samples: 289,
    };

    /// Evenly spaced instants from `now` to `now + lookahead` inclusive.
    pub fn timestamps(&self, now: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        match self.samples {
            0 => Err(PlanError::DegenerateMath("sampling plan has no samples".into())),
            1 => Ok(vec![now]),
            n => {
                if !(self.lookahead_hours.is_finite() && self.lookahead_hours > 0.0) {
                    return Err(PlanError::DegenerateMath(format!(
                        "lookahead of {} h cannot hold {} samples",
                        self.lookahead_hours, n
                    )));
                }
                let step_ms = self.lookahead_hours * 3_600_000.0 / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        let offset = Duration::try_milliseconds((step_ms * i as f64).round() as i64)
                            .ok_or_else(|| PlanError::DegenerateMath("lookahead overflows".into()))?;
                        now.checked_add_signed(offset)
                            .ok_or_else(|| PlanError::DegenerateMath("lookahead overflows".into()))
                    })
                    .collect()
            }
        }
    }
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self::SURVEY
    }
}

/// One evaluation of the target against the mask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub limit_deg: f64,
    pub above: bool,
}

/// Current visibility and the next crossings of the horizon mask.
///
/// When `currently_visible` holds, `rise_time <= now <= set_time` for the
/// bounds that are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisibilityResult {
    pub currently_visible: bool,
    pub current_altitude_deg: f64,
    pub current_azimuth_deg: f64,
    pub rise_time: Option<DateTime<Utc>>,
    pub set_time: Option<DateTime<Utc>>,
}

/// Result plus the sample series it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityWindow {
    pub result: VisibilityResult,
    pub samples: Vec<Sample>,
}

impl VisibilityWindow {
    /// (time, altitude) pairs for charting.
    pub fn altitude_curve(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.samples.iter().map(|s| (s.time, s.altitude_deg)).collect()
    }

    pub fn max_altitude(&self) -> Option<&Sample> {
        self.samples
            .iter()
            .max_by(|a, b| a.altitude_deg.total_cmp(&b.altitude_deg))
    }
}

/// Position of the crossing between two samples, in [0, 1].
pub fn crossing_fraction(alt0: f64, alt1: f64, limit: f64) -> f64 {
    let span = alt1 - alt0;
    if span == 0.0 {
        return 0.0;
    }
    let fraction = (limit - alt0) / span;
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn interpolate_instant(a: &Sample, b: &Sample) -> DateTime<Utc> {
    let fraction = crossing_fraction(a.altitude_deg, b.altitude_deg, a.limit_deg);
    let span_ms = (b.time - a.time).num_milliseconds() as f64;
    Duration::try_milliseconds((span_ms * fraction).round() as i64)
        .and_then(|d| a.time.checked_add_signed(d))
        .unwrap_or(a.time)
}

/// Evaluate each instant against the mask.
pub fn sample_track(
    sky: &dyn HorizontalTransform,
    coordinates: &Coordinates,
    observer: &GeoPosition,
    mask: &HorizonMask,
    times: &[DateTime<Utc>],
) -> Result<Vec<Sample>> {
    times
        .iter()
        .map(|&time| {
            let pos = sky.to_horizontal(coordinates, observer, time)?;
            let limit = mask.limit(pos.azimuth_deg);
            Ok(Sample {
                time,
                altitude_deg: pos.altitude_deg,
                azimuth_deg: pos.azimuth_deg,
                limit_deg: limit,
                above: pos.altitude_deg > limit,
            })
        })
        .collect()
}

/// Derive current visibility and first crossings from a sample series whose
/// first element is `now`.
pub fn summarize(samples: &[Sample]) -> Result<VisibilityResult> {
    let first = samples
        .first()
        .ok_or_else(|| PlanError::DegenerateMath("no samples to summarize".into()))?;

    let mut rise_time = None;
    let mut set_time = None;
    for pair in samples.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if !first.above && rise_time.is_none() && !a.above && b.above {
            rise_time = Some(interpolate_instant(a, b));
        }
        if set_time.is_none() && a.above && !b.above {
            set_time = Some(interpolate_instant(a, b));
        }
        if set_time.is_some() && (first.above || rise_time.is_some()) {
            break;
        }
    }

    Ok(VisibilityResult {
        currently_visible: first.above,
        current_altitude_deg: first.altitude_deg,
        current_azimuth_deg: first.azimuth_deg,
        rise_time,
        set_time,
    })
}

/// Sample the target over `plan` starting at `now`.
pub fn compute_window(
    sky: &dyn HorizontalTransform,
    coordinates: &Coordinates,
    observer: &GeoPosition,
    mask: &HorizonMask,
    now: DateTime<Utc>,
    plan: &SamplingPlan,
) -> Result<VisibilityWindow> {
    let times = plan.timestamps(now)?;
    let samples = sample_track(sky, coordinates, observer, mask, &times)?;
    let result = summarize(&samples)?;
    debug!(
        "Sampled {} points: visible={} rise={:?} set={:?}",
        samples.len(),
        result.currently_visible,
        result.rise_time,
        result.set_time
    );
    Ok(VisibilityWindow { result, samples })
}

/// Stable sort putting currently visible entries first.
pub fn rank_by_visibility<T>(items: &mut [T], is_visible: impl Fn(&T) -> bool) {
    items.sort_by_key(|item| !is_visible(item));
}
