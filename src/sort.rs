use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TransformError;

const PROPERTIES: &str = "properties";

const WEAPON_CATEGORIES: &[&str] = &[
    "Assault Rifles",
    "Shotguns",
    "Marksman Rifles",
    "Snipers",
    "LMGs",
    "Launchers",
    "Pistols",
    "SMGs",
    "Melee",
    "Primary Melee",
];

const EQUIPMENT_CATEGORIES: &[&str] = &["Tactical Equipment", "Lethal Equipment", "Field Upgrades"];

/// How the entries of a recognized container are ranked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Entries ranked by `entry.properties.<field>`.
    Nested(String),
    /// Container holds subcategories; each subcategory is ranked by
    /// `entry.properties.<field>`.
    Grouped(String),
    /// The container's own `properties` mapping is ranked by its scalar values.
    PropertiesValue,
}

/// Container name → sort key.
#[derive(Debug, Clone)]
pub struct SortRules {
    rules: HashMap<String, SortKey>,
}

impl Default for SortRules {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert("mode".to_string(), SortKey::Nested("timePlayed".to_string()));
        for name in WEAPON_CATEGORIES {
            rules.insert(name.to_string(), SortKey::Nested("kills".to_string()));
        }
        for name in EQUIPMENT_CATEGORIES {
            rules.insert(name.to_string(), SortKey::Nested("uses".to_string()));
        }
        rules.insert(
            "Scorestreaks".to_string(),
            SortKey::Grouped("awardedCount".to_string()),
        );
        rules.insert("Accolades".to_string(), SortKey::PropertiesValue);
        Self { rules }
    }
}

impl SortRules {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, container: impl Into<String>, key: SortKey) -> Self {
        self.rules.insert(container.into(), key);
        self
    }

    pub fn get(&self, container: &str) -> Option<&SortKey> {
        self.rules.get(container)
    }
}

/// What a sort pass did.
#[derive(Debug, Default)]
pub struct SortReport {
    pub sorted: usize,
    pub skipped: Vec<TransformError>,
}

impl SortReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Reorders every recognized container in `document`, descending by its sort
/// key. Containers with a missing or non-numeric sort field keep their order
/// and are recorded in the report.
pub fn sort_document(document: &mut Value, rules: &SortRules) -> SortReport {
    let mut report = SortReport::default();
    let mut path = Vec::new();
    walk(document, rules, &mut path, &mut report);
    report
}

fn walk(value: &mut Value, rules: &SortRules, path: &mut Vec<String>, report: &mut SortReport) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                path.push(key.clone());
                match (rules.get(key), child) {
                    (Some(rule), Value::Object(container)) => {
                        apply_rule(container, rule, &path.join("."), report);
                    }
                    (_, child) => walk(child, rules, path, report),
                }
                path.pop();
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter_mut().enumerate() {
                path.push(idx.to_string());
                walk(item, rules, path, report);
                path.pop();
            }
        }
        _ => {}
    }
}

fn apply_rule(container: &mut Map<String, Value>, rule: &SortKey, at: &str, report: &mut SortReport) {
    let outcome = match rule {
        SortKey::Nested(field) => sort_by_nested(container, field, at),
        SortKey::Grouped(field) => {
            for (group, entries) in container.iter_mut() {
                let Value::Object(entries) = entries else {
                    continue;
                };
                let outcome = sort_by_nested(entries, field, &format!("{at}.{group}"));
                record(outcome, at, report);
            }
            return;
        }
        SortKey::PropertiesValue => match container.get_mut(PROPERTIES) {
            Some(Value::Object(props)) => sort_by_scalar(props, &format!("{at}.{PROPERTIES}")),
            _ => {
                debug!(container = at, "no properties to rank");
                return;
            }
        },
    };
    record(outcome, at, report);
}

fn record(outcome: Result<(), TransformError>, at: &str, report: &mut SortReport) {
    match outcome {
        Ok(()) => {
            debug!(container = at, "sorted");
            report.sorted += 1;
        }
        Err(err) => {
            debug!("skipping sort: {err}");
            report.skipped.push(err);
        }
    }
}

fn sort_by_nested(map: &mut Map<String, Value>, field: &str, at: &str) -> Result<(), TransformError> {
    let metrics = map
        .iter()
        .map(|(entry, value)| {
            value
                .get(PROPERTIES)
                .and_then(|props| props.get(field))
                .and_then(Value::as_f64)
                .ok_or_else(|| malformed(at, entry, field))
        })
        .collect::<Result<Vec<_>, _>>()?;
    reorder_desc(map, metrics);
    Ok(())
}

fn sort_by_scalar(map: &mut Map<String, Value>, at: &str) -> Result<(), TransformError> {
    let metrics = map
        .iter()
        .map(|(entry, value)| value.as_f64().ok_or_else(|| malformed(at, entry, "value")))
        .collect::<Result<Vec<_>, _>>()?;
    reorder_desc(map, metrics);
    Ok(())
}

fn reorder_desc(map: &mut Map<String, Value>, metrics: Vec<f64>) {
    let mut entries = std::mem::take(map)
        .into_iter()
        .zip(metrics)
        .collect::<Vec<_>>();
    // Stable sort: equal metrics keep their input order.
    entries.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    *map = entries.into_iter().map(|(entry, _)| entry).collect();
}

fn malformed(at: &str, entry: &str, field: &str) -> TransformError {
    TransformError::MalformedDocument {
        container: at.to_string(),
        entry: entry.to_string(),
        field: field.to_string(),
    }
}
