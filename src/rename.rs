use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::error::{TransformError, TransformResult};

const BUNDLED_REPLACEMENTS: &str = include_str!("../data/replacements.json");

/// Immutable code → label table applied to both keys and string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    labels: HashMap<String, String>,
}

impl RenameTable {
    /// The table shipped with the binary.
    pub fn bundled() -> TransformResult<Self> {
        Self::from_json_str(BUNDLED_REPLACEMENTS)
    }

    pub fn from_json_str(raw: &str) -> TransformResult<Self> {
        let parsed: UniqueEntries = serde_json::from_str(raw).map_err(|err| {
            // The duplicate check runs inside the visitor; surface it as its own variant.
            match duplicate_key_from(&err) {
                Some(key) => TransformError::DuplicateRename(key),
                None => TransformError::Serialization(err),
            }
        })?;
        Self::checked(parsed.0)
    }

    pub fn from_path(path: &Path) -> TransformResult<Self> {
        if !path.exists() {
            return Err(TransformError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|err| TransformError::io(path, err))?;
        Self::from_json_str(&raw)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> TransformResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut labels = HashMap::new();
        for (code, label) in pairs {
            let code = code.into();
            if labels.contains_key(&code) {
                return Err(TransformError::DuplicateRename(code));
            }
            labels.insert(code, label.into());
        }
        Self::checked(labels)
    }

    // A label that is itself a code would be relabeled again on a second pass.
    fn checked(labels: HashMap<String, String>) -> TransformResult<Self> {
        let chained = labels
            .iter()
            .filter(|(code, label)| code != label && labels.contains_key(label.as_str()))
            .min_by(|a, b| a.0.cmp(b.0));
        if let Some((code, label)) = chained {
            return Err(TransformError::ChainedRename {
                code: code.clone(),
                label: label.clone(),
            });
        }
        Ok(Self { labels })
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Label for `code`, or `code` itself when the table has no entry.
    pub fn lookup<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).unwrap_or(code)
    }

    fn relabel(&self, code: String) -> String {
        match self.labels.get(&code) {
            Some(label) => label.clone(),
            None => code,
        }
    }
}

/// Returns a renamed copy of `document`: keys and string scalars found in the
/// table are replaced by their label, everything else is kept as is.
pub fn rename_document(document: Value, table: &RenameTable) -> Value {
    match document {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (table.relabel(key), rename_document(value, table)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_document(item, table))
                .collect(),
        ),
        Value::String(s) => Value::String(table.relabel(s)),
        other => other,
    }
}

const DUPLICATE_MARKER: &str = "duplicate rename key: ";

struct UniqueEntries(HashMap<String, String>);

impl<'de> Deserialize<'de> for UniqueEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = UniqueEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of string to string")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut labels = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((code, label)) = access.next_entry::<String, String>()? {
                    if labels.contains_key(&code) {
                        return Err(de::Error::custom(format!("{DUPLICATE_MARKER}{code}")));
                    }
                    labels.insert(code, label);
                }
                Ok(UniqueEntries(labels))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn duplicate_key_from(err: &serde_json::Error) -> Option<String> {
    let msg = err.to_string();
    let rest = msg.split_once(DUPLICATE_MARKER)?.1;
    // serde_json appends " at line X column Y".
    let key = rest.rsplit_once(" at line ").map_or(rest, |(k, _)| k);
    Some(key.to_string())
}
