//! Sexagesimal parsing and formatting for catalog coordinates.
//!
//! Right ascension strings are read in hours and declination strings in
//! degrees, the usual convention for catalog entries ("00h42m44.3s",
//! "+41d16m09s", "5 35 17.3", "-05:23:28"). A bare number is decimal hours
//! for RA and decimal degrees for Dec. Results are decimal degrees.

use crate::{Result, SkyError};

/// Split a sexagesimal string into its sign and up to three fields.
fn sexagesimal_fields(input: &str) -> Option<(bool, Vec<f64>)> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.chars().next()? {
        '-' | '\u{2212}' => (true, &trimmed[trimmed.chars().next()?.len_utf8()..]),
        '+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let normalized: String = body
        .chars()
        .map(|c| match c {
            'h' | 'H' | 'd' | 'D' | 'm' | 'M' | 's' | 'S' | ':' | '°' | '\'' | '"' | '′'
            | '″' => ' ',
            other => other,
        })
        .collect();

    let fields = normalized
        .split_whitespace()
        .map(|f| f.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0))
        .collect::<Option<Vec<f64>>>()?;

    if fields.is_empty() || fields.len() > 3 {
        return None;
    }
    if fields.iter().skip(1).any(|v| *v >= 60.0) {
        return None;
    }
    // Only the last field may carry a fraction
    if fields[..fields.len() - 1].iter().any(|v| v.fract() != 0.0) {
        return None;
    }
    Some((negative, fields))
}

fn combine(fields: &[f64]) -> f64 {
    fields
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(v, div)| v / div)
        .sum()
}

/// Parse a right ascension given in hours; returns degrees in [0, 360).
pub fn parse_ra(input: &str) -> Result<f64> {
    let (negative, fields) = sexagesimal_fields(input)
        .ok_or_else(|| SkyError::InvalidCoordinates(format!("unparsable right ascension '{}'", input)))?;
    let hours = combine(&fields);
    if negative || hours >= 24.0 {
        return Err(SkyError::InvalidCoordinates(format!(
            "right ascension '{}' outside [0h, 24h)",
            input
        )));
    }
    Ok(hours * 15.0)
}

/// Parse a declination given in degrees; returns degrees in [-90, 90].
pub fn parse_dec(input: &str) -> Result<f64> {
    let (negative, fields) = sexagesimal_fields(input)
        .ok_or_else(|| SkyError::InvalidCoordinates(format!("unparsable declination '{}'", input)))?;
    let degrees = combine(&fields);
    if degrees > 90.0 {
        return Err(SkyError::InvalidCoordinates(format!(
            "declination '{}' outside [-90°, 90°]",
            input
        )));
    }
    Ok(if negative { -degrees } else { degrees })
}

/// Right ascension as `HHhMMmSS.Ss`.
pub fn format_ra(ra_deg: f64) -> String {
    const TENTHS_PER_DAY: i64 = 24 * 36_000;
    let tenths = ((ra_deg / 15.0) * 36_000.0).round() as i64;
    let tenths = tenths.rem_euclid(TENTHS_PER_DAY);
    let hours = tenths / 36_000;
    let minutes = (tenths % 36_000) / 600;
    let sec_tenths = tenths % 600;
    format!(
        "{:02}h{:02}m{:02}.{}s",
        hours,
        minutes,
        sec_tenths / 10,
        sec_tenths % 10
    )
}

/// Declination as `±DDdMMmSSs`.
pub fn format_dec(dec_deg: f64) -> String {
    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let arcsec = (dec_deg.abs() * 3600.0).round() as i64;
    format!(
        "{}{:02}d{:02}m{:02}s",
        sign,
        arcsec / 3600,
        (arcsec % 3600) / 60,
        arcsec % 60
    )
}
