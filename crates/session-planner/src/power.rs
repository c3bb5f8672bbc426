//! Field Power Budget
//!
//! Sums the draw of the accessories on the battery and estimates how long
//! the session can run. Itemized like a link budget: each entry is kept in
//! the breakdown so the user can see which accessory dominates.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{PlanError, Result};

/// Usable fraction of the nameplate capacity
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.85;

/// How an accessory's draw counts toward the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PowerDraw {
    /// Always on (mount, camera)
    Fixed,
    /// Counted only when enabled (cooler, laptop)
    Toggle { enabled: bool },
    /// Per-unit draw times a count (dew heater bands)
    Count { count: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerItem {
    pub name: String,
    pub watts: f64,
    #[serde(flatten)]
    pub draw: PowerDraw,
}

impl PowerItem {
    pub fn fixed(name: impl Into<String>, watts: f64) -> Self {
        Self {
            name: name.into(),
            watts,
            draw: PowerDraw::Fixed,
        }
    }

    pub fn toggle(name: impl Into<String>, watts: f64, enabled: bool) -> Self {
        Self {
            name: name.into(),
            watts,
            draw: PowerDraw::Toggle { enabled },
        }
    }

    pub fn count(name: impl Into<String>, watts: f64, count: i64) -> Self {
        Self {
            name: name.into(),
            watts,
            draw: PowerDraw::Count { count },
        }
    }

    /// Effective draw in watts.
    pub fn effective_watts(&self) -> Result<f64> {
        if !self.watts.is_finite() || self.watts < 0.0 {
            return Err(PlanError::InvalidEquipment(format!(
                "'{}' draws {} W",
                self.name, self.watts
            )));
        }
        match self.draw {
            PowerDraw::Fixed => Ok(self.watts),
            PowerDraw::Toggle { enabled } => Ok(if enabled { self.watts } else { 0.0 }),
            PowerDraw::Count { count } if count < 0 => Err(PlanError::InvalidEquipment(format!(
                "'{}' has a negative count ({})",
                self.name, count
            ))),
            PowerDraw::Count { count } => {
                let watts = self.watts * count as f64;
                if watts.is_finite() {
                    Ok(watts)
                } else {
                    Err(PlanError::InvalidEquipment(format!(
                        "'{}' draws {} W x {}, beyond any battery",
                        self.name, self.watts, count
                    )))
                }
            }
        }
    }
}

/// Battery capacity and the fraction of it that is usable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Battery {
    pub capacity_wh: f64,
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,
}

fn default_safety_margin() -> f64 {
    DEFAULT_SAFETY_MARGIN
}

impl Battery {
    pub fn new(capacity_wh: f64) -> Self {
        Self {
            capacity_wh,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.capacity_wh.is_finite() || self.capacity_wh < 0.0 {
            return Err(PlanError::InvalidEquipment(format!(
                "battery capacity {} Wh",
                self.capacity_wh
            )));
        }
        if !(self.safety_margin > 0.0 && self.safety_margin <= 1.0) {
            return Err(PlanError::InvalidEquipment(format!(
                "safety margin {} outside (0, 1]",
                self.safety_margin
            )));
        }
        Ok(())
    }

    pub fn usable_wh(&self) -> f64 {
        self.capacity_wh * self.safety_margin
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self::new(268.0)
    }
}

/// Hours of operation for `total_watts` on `battery`. Zero draw never
/// empties the battery.
pub fn runtime_hours(battery: &Battery, total_watts: f64) -> Result<f64> {
    battery.validate()?;
    if !total_watts.is_finite() || total_watts < 0.0 {
        return Err(PlanError::InvalidEquipment(format!("total draw {} W", total_watts)));
    }
    if total_watts == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(battery.usable_wh() / total_watts)
}

/// Battery plus the list of accessories drawing from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PowerBudget {
    pub battery: Battery,
    #[serde(default)]
    pub items: Vec<PowerItem>,
}

/// Per-item breakdown and totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerReport {
    pub lines: Vec<(String, f64)>,
    /// Items left out of the total, with the reason
    pub rejected: Vec<(String, String)>,
    pub total_watts: f64,
    pub usable_wh: f64,
    pub runtime_hours: f64,
}

impl PowerBudget {
    /// Sum of valid items. Invalid items are skipped and reported.
    pub fn total_watts(&self) -> f64 {
        self.breakdown().0.iter().map(|(_, w)| w).sum()
    }

    fn breakdown(&self) -> (Vec<(String, f64)>, Vec<(String, String)>) {
        let mut lines = Vec::with_capacity(self.items.len());
        let mut rejected = Vec::new();
        let mut total = 0.0_f64;
        for item in &self.items {
            let watts = item.effective_watts().and_then(|w| {
                if (total + w).is_finite() {
                    Ok(w)
                } else {
                    Err(PlanError::InvalidEquipment(format!(
                        "'{}' overflows the total draw",
                        item.name
                    )))
                }
            });
            match watts {
                Ok(w) => {
                    total += w;
                    lines.push((item.name.clone(), w));
                }
                Err(e) => {
                    warn!("Excluding power item '{}': {}", item.name, e);
                    rejected.push((item.name.clone(), e.to_string()));
                }
            }
        }
        (lines, rejected)
    }

    /// Detailed report; fails only when the battery itself is invalid.
    pub fn report(&self) -> Result<PowerReport> {
        let (lines, rejected) = self.breakdown();
        let total_watts: f64 = lines.iter().map(|(_, w)| w).sum();
        let runtime_hours = runtime_hours(&self.battery, total_watts)?;
        Ok(PowerReport {
            lines,
            rejected,
            total_watts,
            usable_wh: self.battery.usable_wh(),
            runtime_hours,
        })
    }
}
