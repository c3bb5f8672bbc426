//! Data loading from session, catalog and horizon files

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use session_planner::catalog::{self, CatalogRecord};
use session_planner::export::{self, HandoffRow};
use session_planner::{CelestialTarget, SessionConfig};
use tracing::{info, warn};

use crate::{CliError, Result};

/// Session file, or the built-in defaults when no path is given.
pub fn load_session(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(p) => Ok(SessionConfig::from_file(p)?),
        None => {
            info!("No session file, using defaults");
            Ok(SessionConfig::default())
        }
    }
}

/// Load catalog targets from a JSON array, or an object with a `targets`
/// array. Entries that fail to resolve are skipped and counted.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<CelestialTarget>> {
    let path = path.as_ref();
    info!("Loading catalog from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: serde_json::Value = serde_json::from_reader(reader)?;

    let records: Vec<CatalogRecord> = if let Some(targets) = raw.get("targets") {
        serde_json::from_value(targets.clone())?
    } else if raw.is_array() {
        serde_json::from_value(raw)?
    } else {
        return Err(CliError::EmptyCatalog(path.display().to_string()));
    };

    let (targets, rejected) = catalog::resolve_all(&records);
    info!(
        "Loaded {} targets ({} skipped for invalid coordinates)",
        targets.len(),
        rejected.len()
    );
    if targets.is_empty() {
        return Err(CliError::EmptyCatalog(path.display().to_string()));
    }
    Ok(targets)
}

/// Import a horizon table into the session. A bad table is logged and the
/// previous mask stays in place.
pub fn apply_horizon(config: &mut SessionConfig, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match config.import_horizon_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Keeping previous horizon, cannot import {:?}: {}", path, e);
            false
        }
    }
}

/// Case-insensitive lookup by exact name, then by prefix (e.g. "M31" for
/// "M31 Andromède").
pub fn find_target<'a>(targets: &'a [CelestialTarget], name: &str) -> Result<&'a CelestialTarget> {
    let wanted = name.trim().to_lowercase();
    targets
        .iter()
        .find(|t| t.name.to_lowercase() == wanted)
        .or_else(|| {
            targets
                .iter()
                .find(|t| t.name.to_lowercase().starts_with(&wanted))
        })
        .ok_or_else(|| CliError::UnknownTarget(name.to_string()))
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    info!("Writing report to {:?}", path);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn write_handoff(path: impl AsRef<Path>, rows: &[HandoffRow]) -> Result<()> {
    let path = path.as_ref();
    info!("Writing {} hand-off rows to {:?}", rows.len(), path);
    let file = File::create(path)?;
    export::write_handoff_csv(rows, BufWriter::new(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_catalog_array() {
        let file = temp_with(
            r#"[
                {"name": "M31 Andromède", "ra": "00h42m44.3s", "dec": "+41d16m09s", "size_arcmin": 178},
                {"name": "Broken", "ra": "xx", "dec": "+10"},
                {"name": "Jupiter", "body": "jupiter"}
            ]"#,
        );
        let targets = load_catalog(file.path()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].name, "Jupiter");
    }

    #[test]
    fn test_load_catalog_wrapped() {
        let file = temp_with(r#"{"targets": [{"name": "M42", "ra": 83.82, "dec": -5.39}]}"#);
        assert_eq!(load_catalog(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_load_catalog_without_usable_targets() {
        let file = temp_with(r#"[{"name": "nothing"}]"#);
        assert!(matches!(load_catalog(file.path()), Err(CliError::EmptyCatalog(_))));

        let file = temp_with(r#"{"objects": []}"#);
        assert!(matches!(load_catalog(file.path()), Err(CliError::EmptyCatalog(_))));
    }

    #[test]
    fn test_find_target_prefix() {
        let file = temp_with(
            r#"[{"name": "M31 Andromède", "ra": 10.68, "dec": 41.27},
                {"name": "M42 Orion", "ra": 83.82, "dec": -5.39}]"#,
        );
        let targets = load_catalog(file.path()).unwrap();
        assert_eq!(find_target(&targets, "m42").unwrap().name, "M42 Orion");
        assert_eq!(find_target(&targets, "M31 ANDROMÈDE").unwrap().name, "M31 Andromède");
        assert!(matches!(find_target(&targets, "M1"), Err(CliError::UnknownTarget(_))));
    }

    #[test]
    fn test_apply_horizon_keeps_previous_on_error() {
        let mut config = SessionConfig::default();
        let before = config.horizon.clone();

        let bad = temp_with("azimuth,altitude\n0,10\n90,oops\n");
        assert!(!apply_horizon(&mut config, bad.path()));
        assert_eq!(config.horizon, before);

        let good = temp_with("azimuth,altitude\n0,10\n180,40\n");
        assert!(apply_horizon(&mut config, good.path()));
        assert!((config.horizon.limit(90.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_shipped_sample_files() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let targets = load_catalog(root.join(crate::DEFAULT_CATALOG)).unwrap();
        assert_eq!(targets.len(), 8);

        let mut config = load_session(Some(&root.join("data/session.toml"))).unwrap();
        assert_eq!(config.power_budget().total_watts(), 35.0);
        assert!(apply_horizon(&mut config, root.join("data/horizon.csv")));
        assert!((config.horizon.limit(105.0) - 28.5).abs() < 1e-9);
    }

    #[test]
    fn test_session_and_outputs() {
        let session = temp_with("utc_offset_minutes = 60\n[observer]\nlatitude = 43.6\nlongitude = 1.44\n");
        let config = load_session(Some(session.path())).unwrap();
        assert_eq!(config.observer().latitude, 43.6);
        assert_eq!(load_session(None).unwrap(), SessionConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("targets.csv");
        let rows = vec![HandoffRow {
            name: "M42".into(),
            ra: 83.82,
            dec: -5.39,
            alt: 20.1,
            az: 170.4,
        }];
        write_handoff(&csv_path, &rows).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text, "name,ra,dec,alt,az\nM42,83.82,-5.39,20.1,170.4\n");

        let json_path = dir.path().join("report.json");
        write_json(&json_path, &rows).unwrap();
        let back: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back[0]["name"], "M42");
    }
}
