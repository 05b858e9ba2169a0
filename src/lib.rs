pub mod beautify;
pub mod config;
pub mod document;
pub mod error;
pub mod feed_clean;
pub mod fetch;
pub mod http_client;
pub mod rename;
pub mod sort;
pub mod split;
pub mod timefmt;

pub use error::TransformError;
pub use rename::{RenameTable, rename_document};
pub use sort::{SortReport, SortRules, sort_document};
pub use timefmt::{
    OffsetTable, TimeSettings, TimeZoneCode, convert_duration_milliseconds,
    convert_duration_seconds, normalize_times,
};
