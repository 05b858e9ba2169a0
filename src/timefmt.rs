use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Number, Value};
use tracing::warn;

use crate::error::TransformError;

const DISPLAY_FORMAT: &str = "%A, %B %d, %Y %I:%M:%S %p";

const EPOCH_SECONDS_FIELDS: &[&str] = &["utcStartSeconds", "utcEndSeconds"];
const EPOCH_MILLIS_FIELDS: &[&str] = &["date", "updated", "originalDate"];
const ELAPSED_SECONDS_FIELDS: &[&str] = &[
    "timePlayedTotal",
    "timePlayed",
    "objTime",
    "time",
    "timeProne",
    "timeSpentAsPassenger",
    "timeSpentAsDriver",
    "timeOnPoint",
    "timeWatchingKillcams",
    "timeCrouched",
    "longestTimeSpentOnWeapon",
    "avgLifeTime",
];
const ELAPSED_MILLIS_FIELDS: &[&str] = &["duration"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeZoneCode {
    #[default]
    Gmt,
    Est,
    Cst,
    Pst,
}

impl TimeZoneCode {
    pub const ALL: [TimeZoneCode; 4] = [Self::Gmt, Self::Est, Self::Cst, Self::Pst];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gmt => "GMT",
            Self::Est => "EST",
            Self::Cst => "CST",
            Self::Pst => "PST",
        }
    }
}

impl fmt::Display for TimeZoneCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeZoneCode {
    type Err = TransformError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim();
        Self::ALL
            .into_iter()
            .find(|zone| zone.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| TransformError::UnsupportedTimezone(code.to_string()))
    }
}

/// Fixed hour offsets from UTC per timezone code. No daylight-saving rules are
/// applied; every instant of a zone is shifted by the same amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    hours: HashMap<TimeZoneCode, i32>,
}

impl Default for OffsetTable {
    fn default() -> Self {
        let hours = HashMap::from([
            (TimeZoneCode::Gmt, 0),
            (TimeZoneCode::Est, -4),
            (TimeZoneCode::Cst, -5),
            (TimeZoneCode::Pst, -8),
        ]);
        Self { hours }
    }
}

impl OffsetTable {
    pub fn with_offset(mut self, zone: TimeZoneCode, hours: i32) -> Self {
        self.hours.insert(zone, hours);
        self
    }

    pub fn offset_hours(&self, zone: TimeZoneCode) -> i32 {
        self.hours.get(&zone).copied().unwrap_or_default()
    }
}

/// How a recognized field's number is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    EpochSeconds,
    EpochMillis,
    ElapsedSeconds,
    ElapsedMillis,
}

#[derive(Debug, Clone)]
pub struct TimeFields {
    kinds: HashMap<String, FieldKind>,
}

impl Default for TimeFields {
    fn default() -> Self {
        let groups = [
            (EPOCH_SECONDS_FIELDS, FieldKind::EpochSeconds),
            (EPOCH_MILLIS_FIELDS, FieldKind::EpochMillis),
            (ELAPSED_SECONDS_FIELDS, FieldKind::ElapsedSeconds),
            (ELAPSED_MILLIS_FIELDS, FieldKind::ElapsedMillis),
        ];
        let kinds = groups
            .into_iter()
            .flat_map(|(names, kind)| names.iter().map(move |name| (name.to_string(), kind)))
            .collect();
        Self { kinds }
    }
}

impl TimeFields {
    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.kinds.get(field).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeSettings {
    pub zone: TimeZoneCode,
    pub offsets: OffsetTable,
    pub fields: TimeFields,
}

impl TimeSettings {
    pub fn new(zone: TimeZoneCode, offsets: OffsetTable) -> Self {
        Self {
            zone,
            offsets,
            fields: TimeFields::default(),
        }
    }

    fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offsets.offset_hours(self.zone) * 3600)
    }

    fn render(&self, kind: FieldKind, n: &Number) -> Option<String> {
        let whole = whole_number(n)?;
        match kind {
            FieldKind::EpochSeconds => self.format_instant(DateTime::from_timestamp(whole, 0)?),
            FieldKind::EpochMillis => self.format_instant(DateTime::from_timestamp_millis(whole)?),
            FieldKind::ElapsedSeconds => Some(convert_duration_seconds(whole)),
            FieldKind::ElapsedMillis => Some(convert_duration_milliseconds(whole)),
        }
    }

    fn format_instant(&self, instant: DateTime<Utc>) -> Option<String> {
        let local = instant.with_timezone(&self.offset()?);
        Some(format!("{}: {}", self.zone, local.format(DISPLAY_FORMAT)))
    }
}

/// `"<d> Days <h> Hours <m> Minutes <s> Seconds"`.
pub fn convert_duration_seconds(seconds: i64) -> String {
    let days = seconds.div_euclid(86_400);
    let rest = seconds.rem_euclid(86_400);
    let hours = rest / 3_600;
    let minutes = rest % 3_600 / 60;
    let secs = rest % 60;
    format!("{days} Days {hours} Hours {minutes} Minutes {secs} Seconds")
}

/// `"<m> Minutes <s> Seconds <ms> Milliseconds"`.
pub fn convert_duration_milliseconds(millis: i64) -> String {
    let total_secs = millis.div_euclid(1_000);
    let ms = millis.rem_euclid(1_000);
    let minutes = total_secs.div_euclid(60);
    let secs = total_secs.rem_euclid(60);
    format!("{minutes} Minutes {secs} Seconds {ms} Milliseconds")
}

pub fn format_epoch_seconds(seconds: i64, settings: &TimeSettings) -> Option<String> {
    settings.format_instant(DateTime::from_timestamp(seconds, 0)?)
}

pub fn format_epoch_millis(millis: i64, settings: &TimeSettings) -> Option<String> {
    settings.format_instant(DateTime::from_timestamp_millis(millis)?)
}

/// Rewrites every recognized time field holding a number into its display
/// string. Fields that already hold strings are left untouched, so running
/// this twice is harmless. Returns how many fields were converted.
pub fn normalize_times(document: &mut Value, settings: &TimeSettings) -> usize {
    match document {
        Value::Object(map) => {
            let mut converted = 0;
            for (key, child) in map.iter_mut() {
                let Some(kind) = settings.fields.kind(key) else {
                    converted += normalize_times(child, settings);
                    continue;
                };
                match child {
                    Value::Number(n) => match settings.render(kind, n) {
                        Some(text) => {
                            *child = Value::String(text);
                            converted += 1;
                        }
                        None => warn!(field = %key, value = %n, "time value out of range, left as is"),
                    },
                    Value::Object(_) | Value::Array(_) => {
                        converted += normalize_times(child, settings);
                    }
                    _ => {}
                }
            }
            converted
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| normalize_times(item, settings))
            .sum(),
        _ => 0,
    }
}

fn whole_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    let floored = f.floor();
    if floored.is_finite() && floored >= i64::MIN as f64 && floored <= i64::MAX as f64 {
        Some(floored as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(zone: TimeZoneCode) -> TimeSettings {
        TimeSettings::new(zone, OffsetTable::default())
    }

    #[test]
    fn duration_seconds_breakdown() {
        assert_eq!(
            convert_duration_seconds(90061),
            "1 Days 1 Hours 1 Minutes 1 Seconds"
        );
        assert_eq!(convert_duration_seconds(0), "0 Days 0 Hours 0 Minutes 0 Seconds");
    }

    #[test]
    fn duration_millis_breakdown() {
        assert_eq!(
            convert_duration_milliseconds(754_321),
            "12 Minutes 34 Seconds 321 Milliseconds"
        );
    }

    #[test]
    fn epoch_seconds_per_zone() {
        let ts = 1_697_528_478;
        assert_eq!(
            format_epoch_seconds(ts, &settings(TimeZoneCode::Gmt)).unwrap(),
            "GMT: Tuesday, October 17, 2023 07:41:18 AM"
        );
        assert_eq!(
            format_epoch_seconds(ts, &settings(TimeZoneCode::Est)).unwrap(),
            "EST: Tuesday, October 17, 2023 03:41:18 AM"
        );
        assert_eq!(
            format_epoch_seconds(ts, &settings(TimeZoneCode::Pst)).unwrap(),
            "PST: Monday, October 16, 2023 11:41:18 PM"
        );
    }

    #[test]
    fn epoch_millis_uses_same_format() {
        assert_eq!(
            format_epoch_millis(1_697_528_478_724, &settings(TimeZoneCode::Cst)).unwrap(),
            "CST: Tuesday, October 17, 2023 02:41:18 AM"
        );
    }

    #[test]
    fn offset_override_applies() {
        let s = TimeSettings::new(
            TimeZoneCode::Est,
            OffsetTable::default().with_offset(TimeZoneCode::Est, -5),
        );
        assert_eq!(
            format_epoch_seconds(1_697_528_478, &s).unwrap(),
            "EST: Tuesday, October 17, 2023 02:41:18 AM"
        );
    }

    #[test]
    fn parses_zone_codes() {
        assert_eq!("pst".parse::<TimeZoneCode>().unwrap(), TimeZoneCode::Pst);
        let err = "CET".parse::<TimeZoneCode>().unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedTimezone(code) if code == "CET"));
    }

    #[test]
    fn normalizes_known_fields_only() {
        let mut doc = json!({
            "matches": [{
                "utcStartSeconds": 1_697_528_478,
                "duration": 61_500,
                "playerStats": {"timePlayed": 3_725.9, "kills": 12}
            }],
            "updated": 1_697_528_478_724_i64
        });
        let converted = normalize_times(&mut doc, &settings(TimeZoneCode::Gmt));
        assert_eq!(converted, 4);
        assert_eq!(
            doc["matches"][0]["utcStartSeconds"],
            json!("GMT: Tuesday, October 17, 2023 07:41:18 AM")
        );
        assert_eq!(
            doc["matches"][0]["duration"],
            json!("1 Minutes 1 Seconds 500 Milliseconds")
        );
        assert_eq!(
            doc["matches"][0]["playerStats"]["timePlayed"],
            json!("0 Days 1 Hours 2 Minutes 5 Seconds")
        );
        assert_eq!(doc["matches"][0]["playerStats"]["kills"], json!(12));
    }

    #[test]
    fn second_pass_converts_nothing() {
        let mut doc = json!({"timePlayed": 90061, "date": 0, "time": null});
        let s = settings(TimeZoneCode::Gmt);
        assert_eq!(normalize_times(&mut doc, &s), 2);
        let once = doc.clone();
        assert_eq!(normalize_times(&mut doc, &s), 0);
        assert_eq!(doc, once);
        assert_eq!(doc["time"], Value::Null);
    }

    #[test]
    fn recognized_field_holding_mapping_is_walked() {
        let mut doc = json!({"time": {"timePlayed": 60}});
        normalize_times(&mut doc, &settings(TimeZoneCode::Gmt));
        assert_eq!(doc["time"]["timePlayed"], json!("0 Days 0 Hours 1 Minutes 0 Seconds"));
    }
}
