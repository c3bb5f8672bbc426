//! Imported horizon tables.
//!
//! Two numeric columns per row, azimuth then altitude, in degrees. Commas,
//! semicolons, tabs or plain whitespace separate the columns. Lines starting
//! with `#` are comments and a single non-numeric header row is allowed.
//! With semicolon or tab separators a decimal comma is accepted (`0;12,5`).

use std::borrow::Cow;
use std::io::Read;
use std::num::ParseFloatError;

use csv::{ReaderBuilder, Trim};
use tracing::info;

use crate::{HorizonMask, MaskError, Result};

fn sniff_delimiter(text: &str) -> Option<u8> {
    let sample = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))?;
    [b';', b'\t', b','].into_iter().find(|d| sample.as_bytes().contains(d))
}

fn parse_cell(cell: &str, decimal_comma: bool) -> std::result::Result<f64, ParseFloatError> {
    let cell = if decimal_comma && cell.contains(',') {
        Cow::Owned(cell.replacen(',', ".", 1))
    } else {
        Cow::Borrowed(cell)
    };
    cell.parse::<f64>()
}

/// Parse (azimuth, altitude) rows from any reader.
pub fn parse_table<R: Read>(mut reader: R) -> Result<Vec<(f64, f64)>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let (text, delimiter) = match sniff_delimiter(&text) {
        Some(d) => (text, d),
        None => {
            let joined = text
                .lines()
                .map(|l| l.split_whitespace().collect::<Vec<_>>().join(","))
                .collect::<Vec<_>>()
                .join("\n");
            (joined, b',')
        }
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let decimal_comma = delimiter != b',';

    let mut rows = Vec::new();
    let mut first_row = true;
    for record in rdr.records() {
        let record = record.map_err(|e| MaskError::InvalidMaskTable {
            line: e.position().map(|p| p.line()),
            reason: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line());

        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != 2 {
            return Err(MaskError::InvalidMaskTable {
                line,
                reason: format!("expected 2 columns, found {}", record.len()),
            });
        }

        let parsed = (
            parse_cell(&record[0], decimal_comma),
            parse_cell(&record[1], decimal_comma),
        );
        match parsed {
            (Ok(az), Ok(alt)) if az.is_finite() && alt.is_finite() => rows.push((az, alt)),
            _ if first_row && record.iter().all(|c| parse_cell(c, decimal_comma).is_err()) => {
                // Header row such as "azimuth,altitude"
            }
            _ => {
                return Err(MaskError::InvalidMaskTable {
                    line,
                    reason: format!("non-numeric row '{}'", record.iter().collect::<Vec<_>>().join(",")),
                });
            }
        }
        first_row = false;
    }

    info!("Parsed {} horizon samples", rows.len());
    Ok(rows)
}

/// Build a profile mask from table text.
pub fn from_table_str(text: &str) -> Result<HorizonMask> {
    HorizonMask::from_profile(parse_table(text.as_bytes())?)
}

impl HorizonMask {
    /// Read an imported horizon table file.
    pub fn from_table_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_profile(parse_table(file)?)
    }
}
