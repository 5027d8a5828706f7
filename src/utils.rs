//! Text transforms, URL helpers and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - LaTeX space escaping and whitespace normalization for extracted fields
//! - Label prefix stripping for the byline spans
//! - File name derivation from image and article URLs
//! - File system validation for the asset and output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Put a backslash before every space.
///
/// The renderer treats bare spaces as insignificant, so each one has to be
/// written as `\ `. Apply once per value; a second pass doubles the
/// backslashes.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(escape_spaces("a b"), r"a\ b");
/// ```
pub fn escape_spaces(s: &str) -> String {
    s.replace(' ', r"\ ")
}

/// Trim and collapse every run of whitespace (newlines included) to one space.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Drop a fixed-length label such as `作者：` from the front of a byline value.
///
/// The value is trimmed, the first `prefix_chars` characters (not bytes)
/// removed, and the remainder trimmed again. Values shorter than the label
/// yield an empty string.
pub fn strip_label(s: &str, prefix_chars: usize) -> String {
    s.trim().chars().skip(prefix_chars).collect::<String>().trim().to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and the
/// number of dropped characters appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// The final path segment of a URL, percent-decoded, used as the local file name.
///
/// Returns `None` when the path ends in `/`, has no segments, or the decoded
/// segment is not valid UTF-8 or could escape the target directory.
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let name = urlencoding::decode(segment).ok()?.into_owned();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name)
}

/// A file-system friendly stem for an article URL.
///
/// `http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm` becomes
/// `c_1128739416`. Falls back to `"article"` when the URL has no usable name.
pub fn article_stem(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| file_name_from_url(&u))
        .map(|name| match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        })
        .unwrap_or_else(|| "article".to_string())
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    fs::File::create(&probe_path).await?;
    if let Err(e) = fs::remove_file(&probe_path).await {
        debug!(path = %probe_path, error = %e, "Could not remove write probe");
    }
    info!("Directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_spaces() {
        assert_eq!(escape_spaces("a b"), r"a\ b");
        assert_eq!(escape_spaces("no-space"), "no-space");
        assert_eq!(escape_spaces("two  spaces"), r"two\ \ spaces");
    }

    #[test]
    fn test_escape_spaces_is_not_idempotent() {
        let once = escape_spaces("a b");
        assert_eq!(escape_spaces(&once), r"a\\ b");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Sample \n\t Title  "), "Sample Title");
        assert_eq!(normalize_whitespace("one"), "one");
        assert_eq!(normalize_whitespace("全角\u{3000}空格"), "全角 空格");
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label("XXXName", 3), "Name");
        assert_eq!(strip_label("  作者：Jane ", 3), "Jane");
        assert_eq!(strip_label("来源：《求是》2022/12", 3), "《求是》2022/12");
        assert_eq!(strip_label("ab", 3), "");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 100), "short");
        let long = "字".repeat(20);
        let result = truncate_for_log(&long, 5);
        assert!(result.starts_with(&"字".repeat(5)));
        assert!(result.ends_with("…(+15 chars)"));
    }

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("http://www.qstheory.cn/dukan/qs/2022-06/15/1128739416_16551.jpg").unwrap();
        assert_eq!(file_name_from_url(&url).as_deref(), Some("1128739416_16551.jpg"));

        let dir = Url::parse("http://www.qstheory.cn/i/").unwrap();
        assert_eq!(file_name_from_url(&dir), None);
    }

    #[test]
    fn test_file_name_from_url_decodes_non_ascii() {
        let base = Url::parse("http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm").unwrap();
        let url = base.join("图 片.png").unwrap();
        assert_eq!(file_name_from_url(&url).as_deref(), Some("图 片.png"));
    }

    #[test]
    fn test_file_name_from_url_rejects_escaping_names() {
        for raw in [
            "http://www.qstheory.cn/i/a%2Fb.png",
            "http://www.qstheory.cn/i/%2E%2E",
            "http://www.qstheory.cn/i/..%5Cx.png",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(file_name_from_url(&url), None, "{raw}");
        }
    }

    #[test]
    fn test_article_stem() {
        assert_eq!(
            article_stem("http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm"),
            "c_1128739416"
        );
        assert_eq!(article_stem("http://www.qstheory.cn/"), "article");
        assert_eq!(article_stem("not a url"), "article");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("img").join("nested");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
