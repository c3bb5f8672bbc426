//! Mount hand-off: a text block to paste into the mount controller and a CSV
//! row per target.

use std::io::Write;

use serde::{Deserialize, Serialize};
use sky_position::{Equatorial, Horizontal};

use crate::Result;

fn tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One CSV row: RA/Dec in decimal degrees, alt/az rounded to 0.1°.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoffRow {
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub alt: f64,
    pub az: f64,
}

impl HandoffRow {
    pub fn new(name: &str, position: &Equatorial, horizontal: &Horizontal) -> Self {
        Self {
            name: name.to_string(),
            ra: position.ra_deg,
            dec: position.dec_deg,
            alt: tenth(horizontal.altitude_deg),
            az: tenth(horizontal.azimuth_deg),
        }
    }
}

/// Write rows with a `name,ra,dec,alt,az` header.
pub fn write_handoff_csv<W: Write>(rows: &[HandoffRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Plain-text block for the mount.
pub fn mount_text(name: &str, position: &Equatorial) -> String {
    format!(
        "TARGET: {}\nRA: {}\nDEC = {}",
        name,
        position.ra_string(),
        position.dec_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m31() -> (Equatorial, Horizontal) {
        (
            Equatorial {
                ra_deg: 10.684583,
                dec_deg: 41.269167,
            },
            Horizontal {
                altitude_deg: 62.4471,
                azimuth_deg: 87.96,
            },
        )
    }

    #[test]
    fn test_mount_text() {
        let (eq, _) = m31();
        assert_eq!(
            mount_text("M31", &eq),
            "TARGET: M31\nRA: 00h42m44.3s\nDEC = +41d16m09s"
        );
    }

    #[test]
    fn test_csv_rows() {
        let (eq, hz) = m31();
        let rows = vec![HandoffRow::new("M31", &eq, &hz)];
        let mut out = Vec::new();
        write_handoff_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "name,ra,dec,alt,az\nM31,10.684583,41.269167,62.4,88.0\n");
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let mut out = Vec::new();
        write_handoff_csv(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}
