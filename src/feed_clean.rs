use std::borrow::Cow;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{TransformError, TransformResult};

// Escaped span markup and CSS class names the feed endpoints embed in their
// rendered text.
static FEED_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"&lt;span class=&quot;|&lt;/span&gt;|&quot;&gt;|mp-stat-items|kills-value|headshots-value|username|game-mode|kdr-value|accuracy-value",
    )
    .expect("feed markup pattern is valid")
});

pub fn clean_markup(text: &str) -> Cow<'_, str> {
    FEED_MARKUP.replace_all(text, "")
}

/// Strips feed markup from the file in place. Returns false when nothing
/// needed removing.
pub fn clean_feed_file(path: &Path) -> TransformResult<bool> {
    if !path.exists() {
        return Err(TransformError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|err| TransformError::io(path, err))?;
    let Cow::Owned(cleaned) = clean_markup(&raw) else {
        return Ok(false);
    };
    fs::write(path, cleaned).map_err(|err| TransformError::io(path, err))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_span_markup() {
        let raw = "&lt;span class=&quot;kills-value&quot;&gt;12&lt;/span&gt; kills";
        assert_eq!(clean_markup(raw), "12 kills");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(clean_markup("nothing here"), Cow::Borrowed(_)));
    }

    #[test]
    fn cleans_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friendFeed.json");
        fs::write(&path, r#"{"text": "&lt;span class=&quot;username&quot;&gt;Bob&lt;/span&gt;"}"#).unwrap();
        assert!(clean_feed_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"text": "Bob"}"#);
        assert!(!clean_feed_file(&path).unwrap());
    }
}
