use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::naming::title_from_filename;
use crate::storage::PinMap;
use crate::types::{MemoExtension, MemoMetadata};

/// Resolves a memo filename inside the memo directory. Anything that could
/// escape the directory or is not a memo file is rejected.
pub(crate) fn memo_path(memo_dir: &Path, filename: &str) -> Result<PathBuf, String> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed != filename
        || filename.contains(['/', '\\'])
        || filename == "."
        || filename == ".."
    {
        return Err(format!("Invalid memo filename '{filename}'"));
    }
    if MemoExtension::of_filename(filename).is_none() {
        return Err(format!("Unsupported memo file '{filename}'"));
    }
    Ok(memo_dir.join(filename))
}

pub(crate) fn ensure_dir_exists(path: &Path) -> Result<(), String> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| format!("Failed to create directory: {e}"))?;
    }
    Ok(())
}

/// Writes through a temp file in the same directory and renames it over the
/// target, so readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    let parent = path
        .parent()
        .ok_or_else(|| format!("Invalid path {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .ok_or_else(|| format!("Invalid path {}", path.display()))?;
    let temp_path = parent.join(format!(".{name}.{}.tmp", Uuid::new_v4()));
    fs::write(&temp_path, content).map_err(|e| e.to_string())?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.to_string());
    }
    Ok(())
}

fn to_rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

/// Reads a memo file and joins it with its pin state.
pub(crate) fn read_memo_file(
    path: &Path,
    filename: &str,
    pins: &PinMap,
) -> Result<MemoMetadata, String> {
    let metadata = fs::metadata(path).map_err(|e| format!("Failed to read metadata: {e}"))?;
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {e}"))?;
    let created_at = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|e| format!("Failed to get creation time: {e}"))?;
    let updated_at = metadata
        .modified()
        .map_err(|e| format!("Failed to get modification time: {e}"))?;
    let pin = pins.get(filename).filter(|entry| entry.pinned);

    Ok(MemoMetadata {
        filename: filename.to_string(),
        title: title_from_filename(filename),
        content,
        created_at: to_rfc3339(created_at),
        updated_at: to_rfc3339(updated_at),
        pinned: pin.is_some(),
        pinned_at: pin.and_then(|entry| entry.pinned_at.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::{memo_path, read_memo_file, write_atomic};
    use crate::types::PinEntry;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("memo-app-io-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn memo_path_rejects_escapes_and_foreign_files() {
        let dir = PathBuf::from("/memos");
        assert!(memo_path(&dir, "Groceries.md").is_ok());
        assert!(memo_path(&dir, "../secret.md").is_err());
        assert!(memo_path(&dir, "sub\\a.txt").is_err());
        assert!(memo_path(&dir, ".order.json").is_err());
        assert!(memo_path(&dir, " padded.md").is_err());
        assert!(memo_path(&dir, "").is_err());
    }

    #[test]
    fn write_atomic_replaces_content_without_leftovers() {
        let dir = temp_dir();
        let path = dir.join("a.md");
        write_atomic(&path, "first").expect("first write");
        write_atomic(&path, "second").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second");
        let entries = std::fs::read_dir(&dir).expect("read dir").count();
        assert_eq!(entries, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_memo_file_reports_pin_state() {
        let dir = temp_dir();
        let path = dir.join("Plan.txt");
        std::fs::write(&path, "body").expect("seed");
        let mut pins = HashMap::new();
        pins.insert(
            "Plan.txt".to_string(),
            PinEntry {
                pinned: true,
                pinned_at: Some("2026-01-01T00:00:00+00:00".to_string()),
            },
        );

        let memo = read_memo_file(&path, "Plan.txt", &pins).expect("read memo");
        assert_eq!(memo.title, "Plan");
        assert_eq!(memo.content, "body");
        assert!(memo.pinned);
        assert_eq!(memo.pinned_at.as_deref(), Some("2026-01-01T00:00:00+00:00"));

        let unpinned = read_memo_file(&path, "Plan.txt", &HashMap::new()).expect("read memo");
        assert!(!unpinned.pinned);
        assert_eq!(unpinned.pinned_at, None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
