use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use super::backend::MemoBackend;
use crate::shared::memos_core::LocalMemoBackend;
use crate::types::{MemoExtension, MemoMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveCall {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) old_filename: Option<String>,
}

/// Directory-backed backend that records saves and can be told to fail or stall.
pub(crate) struct RecordingBackend {
    inner: LocalMemoBackend,
    root: PathBuf,
    saves: Mutex<Vec<SaveCall>>,
    deletes: AtomicUsize,
    fail_saves: AtomicBool,
    fail_lists: AtomicBool,
    fail_deletes: AtomicBool,
    save_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingBackend {
    pub(crate) fn new(prefix: &str) -> Self {
        let root = std::env::temp_dir().join(format!("memo-app-{prefix}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp dir");
        Self {
            inner: LocalMemoBackend::new(root.clone()),
            root,
            saves: Mutex::new(Vec::new()),
            deletes: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            save_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Writes a memo straight through the wrapped backend, unrecorded.
    pub(crate) fn seed(&self, title: &str, content: &str) -> String {
        self.inner.save_memo(title, content, None).expect("seed memo")
    }

    pub(crate) fn file_content(&self, filename: &str) -> String {
        std::fs::read_to_string(self.root.join(filename)).expect("read memo file")
    }

    /// Memo files on disk, sorted, bypassing the wrapped backend's listing.
    pub(crate) fn disk_files(&self) -> Vec<String> {
        let mut files: Vec<String> = std::fs::read_dir(&self.root)
            .expect("read temp dir")
            .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
            .filter(|name| MemoExtension::of_filename(name).is_some())
            .collect();
        files.sort();
        files
    }

    pub(crate) fn saves(&self) -> Vec<SaveCall> {
        self.saves.lock().expect("saves lock").clone()
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub(crate) fn max_concurrent_saves(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn stall_saves(&self, delay: Duration) {
        *self.save_delay.lock().expect("delay lock") = Some(delay);
    }
}

impl Drop for RecordingBackend {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

impl MemoBackend for RecordingBackend {
    fn list_memos(&self) -> Result<Vec<MemoMetadata>, String> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err("listing disabled".to_string());
        }
        self.inner.list_memos()
    }

    fn read_memo(&self, filename: &str) -> Result<MemoMetadata, String> {
        self.inner.read_memo(filename)
    }

    fn save_memo(
        &self,
        title: &str,
        content: &str,
        old_filename: Option<&str>,
    ) -> Result<String, String> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.saves.lock().expect("saves lock").push(SaveCall {
            title: title.to_string(),
            content: content.to_string(),
            old_filename: old_filename.map(str::to_string),
        });
        let delay = *self.save_delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let result = if self.fail_saves.load(Ordering::SeqCst) {
            Err("disk full".to_string())
        } else {
            self.inner.save_memo(title, content, old_filename)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn delete_memo(&self, filename: &str) -> Result<(), String> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err("permission denied".to_string());
        }
        self.inner.delete_memo(filename)
    }

    fn create_memo(&self, extension: MemoExtension) -> Result<MemoMetadata, String> {
        self.inner.create_memo(extension)
    }

    fn toggle_pin(&self, filename: &str) -> Result<bool, String> {
        self.inner.toggle_pin(filename)
    }

    fn update_memo_order(&self, filenames: &[String]) -> Result<(), String> {
        self.inner.update_memo_order(filenames)
    }

    fn import_memo_from_path(&self, path: &Path) -> Result<MemoMetadata, String> {
        self.inner.import_memo_from_path(path)
    }

    fn import_memo_from_content(
        &self,
        original_filename: &str,
        content: &str,
    ) -> Result<MemoMetadata, String> {
        self.inner.import_memo_from_content(original_filename, content)
    }
}
