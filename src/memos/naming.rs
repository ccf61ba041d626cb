use std::path::Path;

use chrono::{DateTime, Local};

use crate::types::MemoExtension;

pub(crate) const FORBIDDEN_FILENAME_CHARS: &[char] =
    &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
pub(crate) const MAX_TITLE_CHARS: usize = 200;
pub(crate) const UNTITLED_TITLE: &str = "untitled";
const UNTITLED_FILENAME_PREFIX: &str = "untitled_memo";
const NEW_MEMO_TITLE_FORMAT: &str = "memo_%Y-%m-%d_%H%M";
const MAX_UNIQUE_SUFFIX: usize = 999;

fn is_forbidden(ch: char) -> bool {
    FORBIDDEN_FILENAME_CHARS.contains(&ch) || ch.is_control()
}

/// Filename stem for a title. Never empty and never hidden: leading dots are
/// dropped, and a title with nothing usable left becomes a timestamped
/// placeholder.
pub(crate) fn sanitize_filename(title: &str) -> String {
    let stripped: String = title.chars().filter(|ch| !is_forbidden(*ch)).collect();
    let visible = stripped.trim().trim_start_matches('.').trim_start();
    let truncated: String = visible.chars().take(MAX_TITLE_CHARS).collect();
    let sanitized = truncated.trim_end();
    if sanitized.is_empty() {
        placeholder_stem(Local::now())
    } else {
        sanitized.to_string()
    }
}

pub(crate) fn placeholder_stem(now: DateTime<Local>) -> String {
    format!("{UNTITLED_FILENAME_PREFIX}_{}", now.timestamp_millis())
}

/// Title from the first line of a memo body, markdown heading markers removed.
pub(crate) fn extract_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let title = first_line.trim_start_matches('#').trim();
    if title.is_empty() {
        UNTITLED_TITLE.to_string()
    } else {
        title.to_string()
    }
}

pub(crate) fn title_from_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if MemoExtension::of_filename(filename).is_some() => stem.to_string(),
        _ => filename.to_string(),
    }
}

pub(crate) fn memo_filename(stem: &str, extension: MemoExtension) -> String {
    format!("{stem}.{}", extension.as_str())
}

pub(crate) fn new_memo_title(now: DateTime<Local>) -> String {
    now.format(NEW_MEMO_TITLE_FORMAT).to_string()
}

/// `stem.ext`, or the first free `stem_N.ext` for N in 1..=999.
pub(crate) fn resolve_unique_filename(
    memo_dir: &Path,
    stem: &str,
    extension: MemoExtension,
) -> Result<String, String> {
    let candidate = memo_filename(stem, extension);
    if !memo_dir.join(&candidate).exists() {
        return Ok(candidate);
    }
    for index in 1..=MAX_UNIQUE_SUFFIX {
        let suffixed = memo_filename(&format!("{stem}_{index}"), extension);
        if !memo_dir.join(&suffixed).exists() {
            return Ok(suffixed);
        }
    }
    Err(format!("Too many files with name '{stem}'"))
}

#[cfg(test)]
mod tests {
    use super::{
        extract_title, memo_filename, new_memo_title, resolve_unique_filename, sanitize_filename,
        title_from_filename, FORBIDDEN_FILENAME_CHARS,
    };
    use crate::types::MemoExtension;
    use chrono::{Local, TimeZone};
    use uuid::Uuid;

    #[test]
    fn sanitize_removes_forbidden_characters() {
        assert_eq!(sanitize_filename("test/file"), "testfile");
        assert_eq!(sanitize_filename("test:file"), "testfile");
        assert_eq!(sanitize_filename("  test  "), "test");
        assert_eq!(sanitize_filename("Shop/List"), "ShopList");
        let noisy = "a/b\\c:d*e?f\"g<h>i|j";
        let sanitized = sanitize_filename(noisy);
        assert_eq!(sanitized, "abcdefghij");
        assert!(!sanitized.contains(FORBIDDEN_FILENAME_CHARS));
    }

    #[test]
    fn sanitize_truncates_long_titles() {
        let long = "あ".repeat(250);
        assert_eq!(sanitize_filename(&long).chars().count(), 200);
    }

    #[test]
    fn sanitize_drops_leading_dots() {
        assert_eq!(sanitize_filename(".plan"), "plan");
        assert_eq!(sanitize_filename(" .. hidden notes"), "hidden notes");
        assert_eq!(sanitize_filename("v1.2 draft."), "v1.2 draft.");
    }

    #[test]
    fn empty_titles_become_timestamped_placeholders() {
        for title in ["", "   ", "///", "?*|", ".", "...", "./."] {
            let stem = sanitize_filename(title);
            assert!(stem.starts_with("untitled_memo_"), "{stem}");
            let timestamp = stem.trim_start_matches("untitled_memo_");
            assert!(timestamp.parse::<i64>().is_ok(), "{stem}");
        }
    }

    #[test]
    fn extract_title_strips_heading_markers() {
        assert_eq!(extract_title("# My Notes\nbody"), "My Notes");
        assert_eq!(extract_title("###Plan"), "Plan");
        assert_eq!(extract_title("  plain line  \nmore"), "plain line");
        assert_eq!(extract_title("#\nbody"), "untitled");
        assert_eq!(extract_title(""), "untitled");
    }

    #[test]
    fn title_from_filename_drops_memo_extension() {
        assert_eq!(title_from_filename("Groceries.md"), "Groceries");
        assert_eq!(title_from_filename("notes.txt"), "notes");
        assert_eq!(title_from_filename("archive.tar"), "archive.tar");
    }

    #[test]
    fn new_memo_title_uses_local_minute() {
        let now = Local.with_ymd_and_hms(2026, 3, 9, 7, 5, 42).single().expect("time");
        assert_eq!(new_memo_title(now), "memo_2026-03-09_0705");
    }

    #[test]
    fn unique_filename_appends_suffix() {
        let dir = std::env::temp_dir().join(format!("memo-app-naming-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");
        assert_eq!(
            resolve_unique_filename(&dir, "notes", MemoExtension::Txt).expect("resolve"),
            "notes.txt"
        );
        std::fs::write(dir.join(memo_filename("notes", MemoExtension::Txt)), "").expect("seed");
        std::fs::write(dir.join("notes_1.txt"), "").expect("seed");
        assert_eq!(
            resolve_unique_filename(&dir, "notes", MemoExtension::Txt).expect("resolve"),
            "notes_2.txt"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
