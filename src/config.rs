use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::rename::RenameTable;
use crate::timefmt::{OffsetTable, TimeZoneCode};

const DEFAULT_STATS_DIR: &str = "stats";
const DEFAULT_COOKIE_FILE: &str = "cookie.txt";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Settings resolved from the environment (after `.env` files are loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stats_dir: PathBuf,
    pub timezone: TimeZoneCode,
    pub offsets: OffsetTable,
    pub replacements: Option<PathBuf>,
    pub cookie_file: PathBuf,
    pub sso_token: Option<String>,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stats_dir: PathBuf::from(DEFAULT_STATS_DIR),
            timezone: TimeZoneCode::default(),
            offsets: OffsetTable::default(),
            replacements: None,
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
            sso_token: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub timezone: Option<TimeZoneCode>,
    pub stats_dir: Option<PathBuf>,
    pub replacements: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());
        let mut config = Self::default();

        config.stats_dir = match overrides.stats_dir {
            Some(dir) => dir,
            None => var("MWSTATS_STATS_DIR").map_or(config.stats_dir, |d| PathBuf::from(d.trim())),
        };
        // An overridden zone leaves MWSTATS_TIMEZONE unparsed.
        config.timezone = match (overrides.timezone, var("MWSTATS_TIMEZONE")) {
            (Some(zone), _) => zone,
            (None, Some(zone)) => zone.parse().context("MWSTATS_TIMEZONE")?,
            (None, None) => config.timezone,
        };
        if let Some(raw) = var("MWSTATS_TZ_OFFSETS") {
            config.offsets = parse_offsets(&raw, config.offsets)?;
        }
        config.replacements = overrides
            .replacements
            .or_else(|| var("MWSTATS_REPLACEMENTS").map(|p| PathBuf::from(p.trim())));
        if let Some(file) = var("MWSTATS_COOKIE_FILE") {
            config.cookie_file = PathBuf::from(file.trim());
        }
        config.sso_token = var("ACT_SSO_COOKIE").map(|t| t.trim().to_string());
        config.http_timeout = var("MWSTATS_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.http_timeout);

        Ok(config)
    }

    pub fn rename_table(&self) -> Result<RenameTable> {
        match &self.replacements {
            Some(path) => RenameTable::from_path(path)
                .with_context(|| format!("failed to load rename table {}", path.display())),
            None => RenameTable::bundled().context("bundled rename table is invalid"),
        }
    }
}

/// Parses `EST=-5,PST=-7` style overrides on top of `base`.
pub fn parse_offsets(raw: &str, base: OffsetTable) -> Result<OffsetTable> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .try_fold(base, |table, part| {
            let (code, hours) = part
                .split_once('=')
                .ok_or_else(|| anyhow!("offset `{part}` is not CODE=HOURS"))?;
            let zone: TimeZoneCode = code.parse()?;
            let hours = hours
                .trim()
                .parse::<i32>()
                .with_context(|| format!("offset hours for {zone}"))?;
            if !(-14..=14).contains(&hours) {
                return Err(anyhow!("offset {hours} for {zone} is out of range"));
            }
            Ok(table.with_offset(zone, hours))
        })
}
