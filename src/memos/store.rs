use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task;

use super::backend::MemoBackend;
use super::order::{insert_after_pinned, keeps_pinned_prefix, move_within_partition};
use crate::types::{DroppedFile, ImportFailure, Memo, MemoExtension, MemoMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemoveOutcome {
    Removed,
    /// Pinned memos have to be unpinned before they can be deleted.
    BlockedPinned,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImportReport {
    pub(crate) imported: Vec<Memo>,
    pub(crate) failures: Vec<ImportFailure>,
    pub(crate) selected: Option<Memo>,
}

/// Ordered in-memory view of the memo directory plus the current selection.
///
/// Every call that changes disk state ends with a full reload from the
/// backend; the local list is only replaced once that reload succeeds.
pub(crate) struct MemoStore<B: MemoBackend> {
    backend: Arc<B>,
    memos: Mutex<Vec<Memo>>,
    selected: Mutex<Option<String>>,
}

impl<B: MemoBackend> MemoStore<B> {
    pub(crate) fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            memos: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
        }
    }

    async fn call<T, F>(&self, op: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T, String> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|err| format!("memo backend task failed: {err}"))?
    }

    pub(crate) async fn list(&self) -> Vec<Memo> {
        self.memos.lock().await.clone()
    }

    pub(crate) async fn get(&self, filename: &str) -> Option<Memo> {
        let memos = self.memos.lock().await;
        memos.iter().find(|memo| memo.filename == filename).cloned()
    }

    pub(crate) async fn refresh(&self) -> Result<Vec<Memo>, String> {
        let raw = self.call(|backend| backend.list_memos()).await?;
        let parsed = raw
            .into_iter()
            .map(Memo::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut memos = self.memos.lock().await;
        *memos = parsed.clone();
        Ok(parsed)
    }

    async fn refreshed_or_parsed(&self, raw: MemoMetadata) -> Result<Memo, String> {
        let filename = raw.filename.clone();
        match self.get(&filename).await {
            Some(memo) => Ok(memo),
            None => Memo::try_from(raw),
        }
    }

    /// Creates an empty memo and places it at the head of the unpinned partition.
    pub(crate) async fn create(&self, extension: MemoExtension) -> Result<Memo, String> {
        let raw = self.call(move |backend| backend.create_memo(extension)).await?;
        let current = self.list().await;
        let order = insert_after_pinned(&current, &raw.filename);
        self.call(move |backend| backend.update_memo_order(&order))
            .await?;
        self.refresh().await?;
        log::info!("Created memo {}", raw.filename);
        self.refreshed_or_parsed(raw).await
    }

    pub(crate) async fn remove(&self, filename: &str) -> Result<RemoveOutcome, String> {
        if self.get(filename).await.is_some_and(|memo| memo.pinned) {
            return Ok(RemoveOutcome::BlockedPinned);
        }
        let target = filename.to_string();
        self.call(move |backend| backend.delete_memo(&target)).await?;
        {
            let mut memos = self.memos.lock().await;
            memos.retain(|memo| memo.filename != filename);
        }
        {
            let mut selected = self.selected.lock().await;
            if selected.as_deref() == Some(filename) {
                *selected = None;
            }
        }
        log::info!("Deleted memo {filename}");
        if let Err(err) = self.refresh().await {
            log::warn!("Memo list refresh after deleting {filename} failed: {err}");
        }
        Ok(RemoveOutcome::Removed)
    }

    /// Persists a memo and returns the filename the backend settled on. A
    /// selected memo follows its own rename. Once the write has landed the
    /// filename is returned even if the follow-up listing fails.
    pub(crate) async fn save(
        &self,
        title: String,
        content: String,
        old_filename: Option<String>,
    ) -> Result<String, String> {
        let previous = old_filename.clone();
        let filename = self
            .call(move |backend| backend.save_memo(&title, &content, old_filename.as_deref()))
            .await?;
        if let Some(previous) = previous.filter(|previous| previous != &filename) {
            let mut selected = self.selected.lock().await;
            if selected.as_deref() == Some(previous.as_str()) {
                *selected = Some(filename.clone());
            }
        }
        if let Err(err) = self.refresh().await {
            log::warn!("Memo list refresh after saving {filename} failed: {err}");
        }
        Ok(filename)
    }

    pub(crate) async fn toggle_pin(&self, filename: &str) -> Result<bool, String> {
        let target = filename.to_string();
        let pinned = self.call(move |backend| backend.toggle_pin(&target)).await?;
        self.refresh().await?;
        Ok(pinned)
    }

    /// Moves `source` to the slot of `target`. Returns `false` without
    /// touching anything when the move is not allowed.
    pub(crate) async fn reorder(&self, source: &str, target: &str) -> Result<bool, String> {
        if source == target {
            return Ok(false);
        }
        let current = self.list().await;
        let Some(order) = move_within_partition(&current, source, target) else {
            log::debug!("Rejected reorder of {source} onto {target}");
            return Ok(false);
        };
        self.call(move |backend| backend.update_memo_order(&order))
            .await?;
        self.refresh().await?;
        Ok(true)
    }

    pub(crate) async fn set_order(&self, filenames: Vec<String>) -> Result<bool, String> {
        let current = self.list().await;
        if !keeps_pinned_prefix(&current, &filenames) {
            return Ok(false);
        }
        self.call(move |backend| backend.update_memo_order(&filenames))
            .await?;
        self.refresh().await?;
        Ok(true)
    }

    pub(crate) async fn import_content(
        &self,
        original_filename: String,
        content: String,
    ) -> Result<Memo, String> {
        let raw = self
            .call(move |backend| backend.import_memo_from_content(&original_filename, &content))
            .await?;
        self.refresh().await?;
        self.refreshed_or_parsed(raw).await
    }

    /// Imports every file it can, keeps going past failures and selects the
    /// last memo that made it in.
    pub(crate) async fn import_dropped(
        &self,
        files: Vec<DroppedFile>,
    ) -> Result<ImportReport, String> {
        let mut imported = Vec::new();
        let mut failures = Vec::new();
        for file in files {
            let source = file.name.clone().unwrap_or_default();
            let result = self
                .call(move |backend| {
                    backend.import_memo_from_content(
                        file.name.as_deref().unwrap_or_default(),
                        &file.content,
                    )
                })
                .await;
            match result {
                Ok(raw) => imported.push(raw),
                Err(error) => {
                    log::warn!("Failed to import dropped file {source}: {error}");
                    failures.push(ImportFailure { source, error });
                }
            }
        }
        self.finish_import(imported, failures).await
    }

    pub(crate) async fn import_from_paths(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<ImportReport, String> {
        let mut imported = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            let source = path.to_string_lossy().to_string();
            let result = self
                .call(move |backend| backend.import_memo_from_path(&path))
                .await;
            match result {
                Ok(raw) => imported.push(raw),
                Err(error) => {
                    log::warn!("Failed to import {source}: {error}");
                    failures.push(ImportFailure { source, error });
                }
            }
        }
        self.finish_import(imported, failures).await
    }

    async fn finish_import(
        &self,
        imported: Vec<MemoMetadata>,
        failures: Vec<ImportFailure>,
    ) -> Result<ImportReport, String> {
        if imported.is_empty() {
            return Ok(ImportReport {
                imported: Vec::new(),
                failures,
                selected: None,
            });
        }
        self.refresh().await?;
        let mut memos = Vec::with_capacity(imported.len());
        for raw in imported {
            memos.push(self.refreshed_or_parsed(raw).await?);
        }
        let selected = match memos.last() {
            Some(last) => self.select(&last.filename).await,
            None => None,
        };
        Ok(ImportReport {
            imported: memos,
            failures,
            selected,
        })
    }

    pub(crate) async fn select(&self, filename: &str) -> Option<Memo> {
        let memo = self.get(filename).await?;
        *self.selected.lock().await = Some(memo.filename.clone());
        Some(memo)
    }

    pub(crate) async fn selected(&self) -> Option<Memo> {
        let filename = self.selected.lock().await.clone()?;
        self.get(&filename).await
    }

    pub(crate) async fn clear_selection(&self) {
        *self.selected.lock().await = None;
    }
}
