use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::{load_document, save_document};
use crate::error::{TransformError, TransformResult};
use crate::feed_clean::clean_feed_file;
use crate::rename::{RenameTable, rename_document};
use crate::sort::{SortRules, sort_document};
use crate::split::{needs_time_conversion, write_match_files};
use crate::timefmt::{TimeSettings, normalize_times};

pub const STATS_FILE: &str = "stats.json";
pub const MATCH_INFO_FILE: &str = "match_info.json";
pub const FRIEND_FEED_FILE: &str = "friendFeed.json";
pub const EVENT_FEED_FILE: &str = "eventFeed.json";
pub const FEED_FILES: &[&str] = &[FRIEND_FEED_FILE, EVENT_FEED_FILE];
pub const MATCH_DIR: &str = "matches";

/// Layout of the directory holding fetched documents.
#[derive(Debug, Clone)]
pub struct StatsDir {
    root: PathBuf,
}

impl StatsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn matches_dir(&self) -> PathBuf {
        self.root.join(MATCH_DIR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Updated(PathBuf),
    Skipped(PathBuf),
}

impl FileOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    Split { files: Vec<PathBuf> },
    Skipped(PathBuf),
}

/// Applies the rename table, sort rules and time settings to the documents of
/// a stats directory.
#[derive(Debug, Clone)]
pub struct Beautifier {
    dir: StatsDir,
    table: RenameTable,
    rules: SortRules,
    time: TimeSettings,
}

impl Beautifier {
    pub fn new(dir: StatsDir, table: RenameTable, rules: SortRules, time: TimeSettings) -> Self {
        Self {
            dir,
            table,
            rules,
            time,
        }
    }

    pub fn dir(&self) -> &StatsDir {
        &self.dir
    }

    /// Rename, sort, then normalize times. Sorting has to see the raw numbers,
    /// so it runs before the time fields become strings.
    pub fn beautify_stats(&self) -> TransformResult<FileOutcome> {
        self.rewrite(&self.dir.file(STATS_FILE), |doc| {
            let mut doc = rename_document(doc, &self.table);
            let report = sort_document(&mut doc, &self.rules);
            if !report.is_clean() {
                // Expected on a second run: time metrics are already strings.
                debug!(
                    skipped = report.skipped.len(),
                    "some containers were left unsorted"
                );
            }
            normalize_times(&mut doc, &self.time);
            doc
        })
    }

    pub fn beautify_matches(&self) -> TransformResult<FileOutcome> {
        self.rewrite(&self.dir.file(MATCH_INFO_FILE), |doc| self.normalize_then_rename(doc))
    }

    pub fn beautify_feeds(&self) -> TransformResult<Vec<FileOutcome>> {
        FEED_FILES
            .iter()
            .map(|name| self.rewrite(&self.dir.file(name), |doc| self.normalize_then_rename(doc)))
            .collect()
    }

    pub fn clean_feeds(&self, names: &[&str]) -> TransformResult<Vec<FileOutcome>> {
        names
            .iter()
            .map(|name| {
                let path = self.dir.file(name);
                match clean_feed_file(&path) {
                    Ok(_) => {
                        info!(path = %path.display(), "removed feed markup");
                        Ok(FileOutcome::Updated(path))
                    }
                    Err(err) => skip_if_missing(err, path),
                }
            })
            .collect()
    }

    pub fn beautify_all(&self) -> TransformResult<Vec<FileOutcome>> {
        let mut outcomes = vec![self.beautify_stats()?, self.beautify_matches()?];
        outcomes.extend(self.beautify_feeds()?);
        outcomes.extend(self.clean_feeds(FEED_FILES)?);
        Ok(outcomes)
    }

    /// Writes one file per match under `matches/`, converting and saving the
    /// match history first when it still holds raw times.
    pub fn split_matches(&self) -> TransformResult<SplitOutcome> {
        let path = self.dir.file(MATCH_INFO_FILE);
        let mut doc = match load_document(&path) {
            Ok(doc) => doc,
            Err(err) if err.is_missing_file() => {
                warn!(path = %path.display(), "match info not found, skipping split");
                return Ok(SplitOutcome::Skipped(path));
            }
            Err(err) => return Err(err),
        };

        if needs_time_conversion(&doc) {
            info!("converting match timestamps");
            normalize_times(&mut doc, &self.time);
            save_document(&path, &doc)?;
        }

        let files = write_match_files(&doc, &self.dir.matches_dir())?;
        if files.is_empty() {
            warn!("no matches found to split");
        } else {
            info!(count = files.len(), dir = %self.dir.matches_dir().display(), "split matches");
        }
        Ok(SplitOutcome::Split { files })
    }

    fn normalize_then_rename(&self, mut doc: Value) -> Value {
        normalize_times(&mut doc, &self.time);
        rename_document(doc, &self.table)
    }

    fn rewrite(&self, path: &Path, transform: impl FnOnce(Value) -> Value) -> TransformResult<FileOutcome> {
        let doc = match load_document(path) {
            Ok(doc) => doc,
            Err(err) => return skip_if_missing(err, path.to_path_buf()),
        };
        save_document(path, &transform(doc))?;
        info!(path = %path.display(), "beautified");
        Ok(FileOutcome::Updated(path.to_path_buf()))
    }
}

fn skip_if_missing(err: TransformError, path: PathBuf) -> TransformResult<FileOutcome> {
    if err.is_missing_file() {
        warn!(path = %path.display(), "file not found, skipping");
        Ok(FileOutcome::Skipped(path))
    } else {
        Err(err)
    }
}
