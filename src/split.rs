use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::save_document;
use crate::error::{TransformError, TransformResult};

const LOADOUT_FIELDS: &[&str] = &["loadouts", "loadout"];
const RAW_TIME_FIELDS: &[&str] = &["utcStartSeconds", "utcEndSeconds", "duration"];

/// Match records under `data.matches`, or an empty slice when absent.
pub fn match_records(document: &Value) -> &[Value] {
    document
        .get("data")
        .and_then(|data| data.get("matches"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// True when the first match still carries raw numeric times.
pub fn needs_time_conversion(document: &Value) -> bool {
    let Some(sample) = match_records(document).first() else {
        return false;
    };
    RAW_TIME_FIELDS
        .iter()
        .any(|field| sample.get(*field).is_some_and(Value::is_number))
}

/// Copy of `record` without the player's loadout data.
pub fn strip_loadouts(record: &Value) -> Value {
    let mut copy = record.clone();
    if let Some(player) = copy.get_mut("player").and_then(Value::as_object_mut) {
        for field in LOADOUT_FIELDS {
            player.remove(*field);
        }
    }
    copy
}

pub fn match_file_name(index: usize) -> String {
    format!("match_{}.json", index + 1)
}

fn is_match_file(name: &str) -> bool {
    name.strip_prefix("match_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Removes `match_<n>.json` files left by an earlier split. Other files are kept.
pub fn clear_match_files(dir: &Path) -> TransformResult<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(TransformError::io(dir, err)),
    };
    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|err| TransformError::io(dir, err))?.path();
        let stale = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_match_file);
        if stale && path.is_file() {
            fs::remove_file(&path).map_err(|err| TransformError::io(&path, err))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Replaces the `match_<n>.json` files in `dir` with one per record and
/// returns the paths in record order.
pub fn write_match_files(document: &Value, dir: &Path) -> TransformResult<Vec<PathBuf>> {
    clear_match_files(dir)?;
    match_records(document)
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let path = dir.join(match_file_name(idx));
            save_document(&path, &strip_loadouts(record))?;
            Ok(path)
        })
        .collect()
}
