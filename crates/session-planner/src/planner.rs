//! Session Planner
//!
//! Composition root: runs the visibility sampler over a catalog, and builds
//! the full report for the selected target (visibility, framing, power,
//! weather, mount hand-off).

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use observing_site::{CompassSector, GeoPosition};
use serde::{Deserialize, Serialize};
use sky_position::{ApparentSky, HorizontalTransform};
use tracing::{debug, info, warn};

use crate::catalog::CelestialTarget;
use crate::config::SessionConfig;
use crate::export::{self, HandoffRow};
use crate::optics::FramingReport;
use crate::power::PowerReport;
use crate::visibility::{self, Sample, SamplingPlan, VisibilityResult, VisibilityWindow};
use crate::weather::{ImagingWeatherScore, StaticWeather, UnavailableWeather, WeatherProvider};
use crate::Result;

/// Placeholder for a time or value that could not be computed
pub const NO_VALUE: &str = "—";

/// `HH:MM` in the session's offset, or a dash.
pub fn format_local(time: Option<DateTime<Utc>>, offset: &FixedOffset) -> String {
    match time {
        Some(t) => t.with_timezone(offset).format("%H:%M").to_string(),
        None => NO_VALUE.to_string(),
    }
}

/// One line of the ranked catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyEntry {
    pub name: String,
    pub visibility: Option<VisibilityResult>,
    pub rise_local: String,
    pub set_local: String,
    /// Why this target could not be evaluated
    pub error: Option<String>,
}

impl SurveyEntry {
    pub fn is_visible(&self) -> bool {
        self.visibility
            .as_ref()
            .map(|v| v.currently_visible)
            .unwrap_or(false)
    }
}

/// Everything shown for the selected target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub target: String,
    pub advice: Option<String>,
    pub observer: GeoPosition,
    pub generated_at: DateTime<Utc>,
    pub visibility: VisibilityResult,
    pub rise_local: String,
    pub set_local: String,
    /// Highest sampled altitude over the look-ahead
    pub peak_altitude_deg: Option<f64>,
    pub peak_local: String,
    /// Survey-resolution samples for the altitude chart
    pub altitude_curve: Vec<Sample>,
    pub horizon: Vec<CompassSector>,
    pub framing: Option<FramingReport>,
    pub framing_error: Option<String>,
    pub power: Option<PowerReport>,
    pub power_error: Option<String>,
    pub cloud_cover_pct: Option<f64>,
    pub imaging: Option<ImagingWeatherScore>,
    pub handoff: HandoffRow,
    pub mount_text: String,
}

pub struct SessionPlanner {
    config: SessionConfig,
    sky: Box<dyn HorizontalTransform + Send + Sync>,
    weather: Box<dyn WeatherProvider>,
}

impl SessionPlanner {
    /// Library-backed ephemeris; weather from the config's manual entry if any.
    pub fn new(config: SessionConfig) -> Self {
        let weather: Box<dyn WeatherProvider> = match &config.weather {
            Some(conditions) => Box::new(StaticWeather::new(conditions.clone())),
            None => Box::new(UnavailableWeather),
        };
        Self {
            config,
            sky: Box::new(ApparentSky),
            weather,
        }
    }

    pub fn with_sky(mut self, sky: impl HorizontalTransform + Send + Sync + 'static) -> Self {
        self.sky = Box::new(sky);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access between computations (e.g. horizon import).
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn visibility(
        &self,
        target: &CelestialTarget,
        now: DateTime<Utc>,
        plan: &SamplingPlan,
    ) -> Result<VisibilityWindow> {
        visibility::compute_window(
            self.sky.as_ref(),
            &target.coordinates,
            &self.config.observer(),
            &self.config.horizon,
            now,
            plan,
        )
    }

    /// Evaluate every target with the survey plan and rank visible ones
    /// first, keeping catalog order otherwise. Failures are reported on the
    /// entry and never stop the batch.
    pub fn survey(&self, targets: &[CelestialTarget], now: DateTime<Utc>) -> Vec<SurveyEntry> {
        let offset = self.config.utc_offset();
        let plan = self.config.sampling.survey;

        let mut entries: Vec<SurveyEntry> = targets
            .iter()
            .map(|target| match self.visibility(target, now, &plan) {
                Ok(window) => SurveyEntry {
                    name: target.name.clone(),
                    rise_local: format_local(window.result.rise_time, &offset),
                    set_local: format_local(window.result.set_time, &offset),
                    visibility: Some(window.result),
                    error: None,
                },
                Err(e) => {
                    warn!("Cannot evaluate '{}': {}", target.name, e);
                    SurveyEntry {
                        name: target.name.clone(),
                        visibility: None,
                        rise_local: NO_VALUE.to_string(),
                        set_local: NO_VALUE.to_string(),
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        visibility::rank_by_visibility(&mut entries, SurveyEntry::is_visible);
        info!(
            "Surveyed {} targets, {} visible now",
            entries.len(),
            entries.iter().filter(|e| e.is_visible()).count()
        );
        entries
    }

    /// Full report for one target.
    pub fn drill_down(&self, target: &CelestialTarget, now: DateTime<Utc>) -> Result<SessionReport> {
        let offset = self.config.utc_offset();
        let observer = self.config.observer();

        let fine = self.visibility(target, now, &self.config.sampling.drill_down)?;
        let chart = self.visibility(target, now, &self.config.sampling.survey)?;

        let (framing, framing_error) = match self.config.instrument().and_then(|spec| {
            FramingReport::build(
                &spec,
                target.size.as_ref(),
                self.config.framing.mosaic_overlap,
                self.config.framing.comet_speed_arcsec_per_min,
            )
        }) {
            Ok(report) => (Some(report), None),
            Err(e) => {
                warn!("Framing unavailable for '{}': {}", target.name, e);
                (None, Some(e.to_string()))
            }
        };

        let (power, power_error) = match self.config.power_budget().report() {
            Ok(report) => (Some(report), None),
            Err(e) => {
                warn!("Power budget unavailable: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let conditions = self.weather.current(&observer);
        if conditions.is_none() {
            debug!("No weather data for this session");
        }
        let peak = fine.max_altitude().copied();

        let position = target.coordinates.equatorial_at(now)?;
        let here = sky_position::Horizontal {
            altitude_deg: fine.result.current_altitude_deg,
            azimuth_deg: fine.result.current_azimuth_deg,
        };

        Ok(SessionReport {
            target: target.name.clone(),
            advice: target.advice.clone(),
            observer,
            generated_at: now,
            rise_local: format_local(fine.result.rise_time, &offset),
            set_local: format_local(fine.result.set_time, &offset),
            peak_altitude_deg: peak.map(|s| s.altitude_deg),
            peak_local: format_local(peak.map(|s| s.time), &offset),
            visibility: fine.result,
            altitude_curve: chart.samples,
            horizon: self.config.horizon.compass(),
            framing,
            framing_error,
            power,
            power_error,
            cloud_cover_pct: conditions.as_ref().map(|wx| wx.cloud_cover_pct),
            imaging: conditions.map(|wx| wx.imaging_score()),
            handoff: HandoffRow::new(&target.name, &position, &here),
            mount_text: export::mount_text(&target.name, &position),
        })
    }

    /// Hand-off rows for a batch; failing targets are skipped.
    pub fn handoff_rows(&self, targets: &[CelestialTarget], now: DateTime<Utc>) -> Vec<HandoffRow> {
        let observer = self.config.observer();
        targets
            .iter()
            .filter_map(|target| {
                let placed = self
                    .sky
                    .to_horizontal(&target.coordinates, &observer, now)
                    .and_then(|here| {
                        let position = target.coordinates.equatorial_at(now)?;
                        Ok((position, here))
                    });
                match placed {
                    Ok((position, here)) => Some(HandoffRow::new(&target.name, &position, &here)),
                    Err(e) => {
                        warn!("No hand-off for '{}': {}", target.name, e);
                        None
                    }
                }
            })
            .collect()
    }
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| NO_VALUE.to_string())
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.visibility;
        writeln!(f, "== {} ==", self.target)?;
        writeln!(
            f,
            "{} | altitude {:.1}° | azimuth {:.1}°",
            if v.currently_visible { "Visible now" } else { "Not visible now" },
            v.current_altitude_deg,
            v.current_azimuth_deg
        )?;
        writeln!(f, "Rises: {}   Sets: {}", self.rise_local, self.set_local)?;
        writeln!(
            f,
            "Peak: {} at {}",
            or_dash(self.peak_altitude_deg.map(|a| format!("{:.1}°", a))),
            self.peak_local
        )?;
        if let Some(advice) = &self.advice {
            writeln!(f, "Advice: {}", advice)?;
        }

        match &self.framing {
            Some(fr) => {
                writeln!(
                    f,
                    "FOV: {:.2}° x {:.2}° ({:.0}' x {:.0}'), {:.2}\"/px",
                    fr.fov.width_deg,
                    fr.fov.height_deg,
                    fr.fov.width_arcmin(),
                    fr.fov.height_arcmin(),
                    fr.arcsec_per_pixel
                )?;
                writeln!(f, "Framing: {}", fr.advice)?;
                if let Some(max) = fr.comet_max_exposure_s {
                    writeln!(f, "Comet: sub-exposures up to {:.0} s", max)?;
                }
            }
            None => writeln!(f, "FOV: {}", NO_VALUE)?,
        }

        let runtime = self.power.as_ref().map(|p| {
            if p.runtime_hours.is_finite() {
                format!("{:.1} h at {:.1} W", p.runtime_hours, p.total_watts)
            } else {
                "unlimited (no draw)".to_string()
            }
        });
        writeln!(f, "Battery: {}", or_dash(runtime))?;
        writeln!(
            f,
            "Cloud cover: {}",
            or_dash(self.cloud_cover_pct.map(|c| format!("{:.0}%", c)))
        )?;
        writeln!(
            f,
            "Imaging conditions: {}",
            or_dash(self.imaging.as_ref().map(|score| score.to_string()))
        )?;
        writeln!(f)?;
        write!(f, "{}", self.mount_text)
    }
}
