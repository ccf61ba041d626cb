use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{Local, Utc};

use crate::memos::backend::MemoBackend;
use crate::memos::io::{ensure_dir_exists, memo_path, read_memo_file, write_atomic};
use crate::memos::naming::{
    extract_title, memo_filename, new_memo_title, resolve_unique_filename, sanitize_filename,
};
use crate::memos::order::{order_from_filenames, sort_memos};
use crate::storage::{read_order, read_pins, write_order, write_pins};
use crate::types::{MemoExtension, MemoMetadata, PinEntry};

/// Storage backend over one directory of `.md` / `.txt` files.
pub(crate) struct LocalMemoBackend {
    root: RwLock<PathBuf>,
    file_lock: Mutex<()>,
}

impl LocalMemoBackend {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: RwLock::new(root.into()),
            file_lock: Mutex::new(()),
        }
    }

    pub(crate) fn set_root(&self, root: impl Into<PathBuf>) -> Result<(), String> {
        let mut current = self
            .root
            .write()
            .map_err(|e| format!("memo directory lock poisoned: {e}"))?;
        *current = root.into();
        Ok(())
    }

    fn memo_dir(&self) -> Result<PathBuf, String> {
        let root = self
            .root
            .read()
            .map_err(|e| format!("memo directory lock poisoned: {e}"))?
            .clone();
        ensure_dir_exists(&root)?;
        Ok(root)
    }

    /// Serializes read-modify-write cycles on the memo files and sidecars.
    fn with_file_lock<T>(&self, op: impl FnOnce(&Path) -> Result<T, String>) -> Result<T, String> {
        let _guard = self
            .file_lock
            .lock()
            .map_err(|e| format!("file lock poisoned: {e}"))?;
        let memo_dir = self.memo_dir()?;
        op(&memo_dir)
    }
}

fn has_exact_entry(memo_dir: &Path, filename: &str) -> Result<bool, String> {
    let entries =
        fs::read_dir(memo_dir).map_err(|e| format!("Failed to read memo directory: {e}"))?;
    Ok(entries
        .flatten()
        .any(|entry| entry.file_name().to_str() == Some(filename)))
}

/// Carries the order index and pin state of a renamed memo over to its new name.
fn move_sidecar_entries(memo_dir: &Path, old: &str, new: &str) {
    if let Ok(mut order) = read_order(memo_dir) {
        if let Some(position) = order.remove(old) {
            order.insert(new.to_string(), position);
            if let Err(err) = write_order(memo_dir, &order) {
                log::warn!("Failed to carry order of {old} over to {new}: {err}");
            }
        }
    }
    if let Ok(mut pins) = read_pins(memo_dir) {
        if let Some(pin) = pins.remove(old) {
            pins.insert(new.to_string(), pin);
            if let Err(err) = write_pins(memo_dir, &pins) {
                log::warn!("Failed to carry pin of {old} over to {new}: {err}");
            }
        }
    }
}

fn drop_sidecar_entries(memo_dir: &Path, filename: &str) {
    if let Ok(mut order) = read_order(memo_dir) {
        if order.remove(filename).is_some() {
            let _ = write_order(memo_dir, &order);
        }
    }
    if let Ok(mut pins) = read_pins(memo_dir) {
        if pins.remove(filename).is_some() {
            let _ = write_pins(memo_dir, &pins);
        }
    }
}

fn is_pinned(memo_dir: &Path, filename: &str) -> bool {
    read_pins(memo_dir)
        .ok()
        .and_then(|pins| pins.get(filename).map(|entry| entry.pinned))
        .unwrap_or(false)
}

fn import_text(
    memo_dir: &Path,
    stem: Option<&str>,
    extension: MemoExtension,
    content: &str,
) -> Result<MemoMetadata, String> {
    let title = match stem.map(str::trim) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => extract_title(content),
    };
    let sanitized = sanitize_filename(&title);
    let target_filename = resolve_unique_filename(memo_dir, &sanitized, extension)?;
    let target_path = memo_dir.join(&target_filename);
    write_atomic(&target_path, content)
        .map_err(|e| format!("Failed to write imported file: {e}"))?;
    let pins = read_pins(memo_dir).unwrap_or_default();
    read_memo_file(&target_path, &target_filename, &pins)
}

pub(crate) fn list_memos_core(memo_dir: &Path) -> Result<Vec<MemoMetadata>, String> {
    let entries =
        fs::read_dir(memo_dir).map_err(|e| format!("Failed to read memo directory: {e}"))?;
    let pins = read_pins(memo_dir).unwrap_or_default();
    let mut memos = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {e}"))?;
        let path = entry.path();
        let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if MemoExtension::of_filename(filename).is_none() || filename.starts_with('.') {
            continue;
        }
        match read_memo_file(&path, filename, &pins) {
            Ok(memo) => memos.push(memo),
            Err(err) => log::warn!("Skipping unreadable memo {filename}: {err}"),
        }
    }

    let order = read_order(memo_dir).unwrap_or_default();
    sort_memos(&mut memos, &order);

    // Pin the current order down so later loads do not fall back to timestamps.
    if memos.iter().any(|memo| !order.contains_key(&memo.filename)) {
        let next = order_from_filenames(memos.iter().map(|memo| &memo.filename));
        if let Err(err) = write_order(memo_dir, &next) {
            log::warn!("Failed to persist memo order: {err}");
        }
    }

    Ok(memos)
}

pub(crate) fn save_memo_core(
    memo_dir: &Path,
    title: &str,
    content: &str,
    old_filename: Option<&str>,
) -> Result<String, String> {
    let old_filename = old_filename.filter(|value| !value.trim().is_empty());
    let old_path = old_filename
        .map(|old| memo_path(memo_dir, old))
        .transpose()?;
    let extension = old_filename
        .and_then(MemoExtension::of_filename)
        .unwrap_or_default();
    let stem = sanitize_filename(title);
    let mut new_filename = memo_filename(&stem, extension);

    if old_filename == Some(new_filename.as_str()) {
        write_atomic(&memo_dir.join(&new_filename), content)
            .map_err(|e| format!("Failed to write memo: {e}"))?;
        return Ok(new_filename);
    }

    if has_exact_entry(memo_dir, &new_filename)? {
        new_filename = resolve_unique_filename(memo_dir, &stem, extension)?;
    }
    let new_path = memo_dir.join(&new_filename);

    match (old_filename, old_path) {
        (Some(old), Some(old_path))
            if old.eq_ignore_ascii_case(&new_filename) && old_path.exists() =>
        {
            // Case-only rename: on case-insensitive volumes both names are one file.
            write_atomic(&old_path, content).map_err(|e| format!("Failed to write memo: {e}"))?;
            fs::rename(&old_path, &new_path)
                .map_err(|e| format!("Failed to rename memo: {e}"))?;
            move_sidecar_entries(memo_dir, old, &new_filename);
        }
        (Some(old), Some(old_path)) => {
            write_atomic(&new_path, content).map_err(|e| format!("Failed to write memo: {e}"))?;
            if old_path.exists() {
                if let Err(err) = fs::remove_file(&old_path) {
                    log::warn!("Saved {new_filename} but could not remove {old}: {err}");
                }
            }
            move_sidecar_entries(memo_dir, old, &new_filename);
        }
        _ => {
            write_atomic(&new_path, content).map_err(|e| format!("Failed to write memo: {e}"))?;
        }
    }

    Ok(new_filename)
}

pub(crate) fn create_memo_core(
    memo_dir: &Path,
    extension: MemoExtension,
) -> Result<MemoMetadata, String> {
    let now = Local::now();
    let base_title = new_memo_title(now);
    let mut title = base_title.clone();
    let mut filename = memo_filename(&sanitize_filename(&title), extension);
    let mut counter = 2;
    while memo_dir.join(&filename).exists() {
        title = format!("{base_title}_{counter}");
        filename = memo_filename(&sanitize_filename(&title), extension);
        counter += 1;
    }
    fs::write(memo_dir.join(&filename), "").map_err(|e| format!("Failed to create memo: {e}"))?;

    let created_at = Utc::now().to_rfc3339();
    Ok(MemoMetadata {
        filename,
        title,
        content: String::new(),
        created_at: created_at.clone(),
        updated_at: created_at,
        pinned: false,
        pinned_at: None,
    })
}

pub(crate) fn toggle_pin_core(memo_dir: &Path, filename: &str) -> Result<bool, String> {
    let path = memo_path(memo_dir, filename)?;
    if !path.exists() {
        return Err(format!("Memo '{filename}' not found"));
    }
    let mut pins = read_pins(memo_dir)?;
    let pinned = !pins.get(filename).map(|entry| entry.pinned).unwrap_or(false);
    if pinned {
        pins.insert(
            filename.to_string(),
            PinEntry {
                pinned: true,
                pinned_at: Some(Utc::now().to_rfc3339()),
            },
        );
    } else {
        pins.remove(filename);
    }
    write_pins(memo_dir, &pins)?;
    Ok(pinned)
}

impl MemoBackend for LocalMemoBackend {
    fn list_memos(&self) -> Result<Vec<MemoMetadata>, String> {
        self.with_file_lock(list_memos_core)
    }

    fn read_memo(&self, filename: &str) -> Result<MemoMetadata, String> {
        self.with_file_lock(|memo_dir| {
            let path = memo_path(memo_dir, filename)?;
            if !path.exists() {
                return Err(format!("Memo '{filename}' not found"));
            }
            let pins = read_pins(memo_dir).unwrap_or_default();
            read_memo_file(&path, filename, &pins)
        })
    }

    fn save_memo(
        &self,
        title: &str,
        content: &str,
        old_filename: Option<&str>,
    ) -> Result<String, String> {
        self.with_file_lock(|memo_dir| save_memo_core(memo_dir, title, content, old_filename))
    }

    fn delete_memo(&self, filename: &str) -> Result<(), String> {
        self.with_file_lock(|memo_dir| {
            let path = memo_path(memo_dir, filename)?;
            if is_pinned(memo_dir, filename) {
                return Err("Pinned memos cannot be deleted. Unpin it first.".to_string());
            }
            if path.exists() {
                fs::remove_file(&path).map_err(|e| format!("Failed to delete memo: {e}"))?;
            }
            drop_sidecar_entries(memo_dir, filename);
            Ok(())
        })
    }

    fn create_memo(&self, extension: MemoExtension) -> Result<MemoMetadata, String> {
        self.with_file_lock(|memo_dir| create_memo_core(memo_dir, extension))
    }

    fn toggle_pin(&self, filename: &str) -> Result<bool, String> {
        self.with_file_lock(|memo_dir| toggle_pin_core(memo_dir, filename))
    }

    fn update_memo_order(&self, filenames: &[String]) -> Result<(), String> {
        self.with_file_lock(|memo_dir| write_order(memo_dir, &order_from_filenames(filenames)))
    }

    fn import_memo_from_path(&self, path: &Path) -> Result<MemoMetadata, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let extension =
            MemoExtension::parse(ext).ok_or_else(|| format!("Unsupported file type: .{ext}"))?;
        let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {e}"))?;
        let stem = path.file_stem().and_then(|s| s.to_str());
        self.with_file_lock(|memo_dir| import_text(memo_dir, stem, extension, &content))
    }

    fn import_memo_from_content(
        &self,
        original_filename: &str,
        content: &str,
    ) -> Result<MemoMetadata, String> {
        let original = Path::new(original_filename);
        let extension = match original.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                MemoExtension::parse(ext).ok_or_else(|| format!("Unsupported file type: .{ext}"))?
            }
            None => MemoExtension::Md,
        };
        let stem = original.file_stem().and_then(|s| s.to_str());
        self.with_file_lock(|memo_dir| import_text(memo_dir, stem, extension, content))
    }
}
