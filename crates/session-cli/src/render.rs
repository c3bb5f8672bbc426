//! Terminal rendering of the ranked catalog and the horizon profile.

use std::fmt::Write;

use session_planner::planner::NO_VALUE;
use session_planner::{CompassSector, SurveyEntry};

const NAME_WIDTH: usize = 28;

fn truncate(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(NAME_WIDTH - 1).collect();
        short.push('…');
        short
    }
}

/// One row per target: visibility flag, name, alt/az, rise and set.
pub fn survey_table(entries: &[SurveyEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "   {:<width$} {:>7} {:>7}  {:>5}  {:>5}",
        "Target",
        "Alt",
        "Az",
        "Rise",
        "Set",
        width = NAME_WIDTH
    );
    for entry in entries {
        let flag = if entry.is_visible() { "✔" } else { " " };
        match &entry.visibility {
            Some(v) => {
                let _ = writeln!(
                    out,
                    " {} {:<width$} {:>6.1}° {:>6.1}°  {:>5}  {:>5}",
                    flag,
                    truncate(&entry.name),
                    v.current_altitude_deg,
                    v.current_azimuth_deg,
                    entry.rise_local,
                    entry.set_local,
                    width = NAME_WIDTH
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    " {} {:<width$} {:>7} {:>7}  {:>5}  {:>5}  ({})",
                    flag,
                    truncate(&entry.name),
                    NO_VALUE,
                    NO_VALUE,
                    NO_VALUE,
                    NO_VALUE,
                    entry.error.as_deref().unwrap_or("unavailable"),
                    width = NAME_WIDTH
                );
            }
        }
    }
    out
}

/// Horizon limits per compass direction, e.g. `N 15°  NE 15°  E 20°`.
pub fn horizon_profile(rows: &[CompassSector]) -> String {
    rows.iter()
        .map(|r| format!("{} {:.0}°", r.label, r.limit_deg))
        .collect::<Vec<_>>()
        .join("  ")
}
