use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::error::{TransformError, TransformResult};

const INDENT: &[u8] = b"    ";

pub fn load_document(path: &Path) -> TransformResult<Value> {
    if !path.exists() {
        return Err(TransformError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|err| TransformError::io(path, err))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn to_pretty_vec(document: &Value) -> TransformResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut ser)?;
    Ok(out)
}

/// Four-space pretty print, swapped in through a `.json.tmp` sibling.
pub fn save_document(path: &Path, document: &Value) -> TransformResult<()> {
    let json = to_pretty_vec(document)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| TransformError::io(dir, err))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|err| TransformError::io(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| TransformError::io(path, err))?;
    Ok(())
}

/// Parses an API body; anything that is not JSON is kept as a JSON string.
pub fn coerce_document(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
