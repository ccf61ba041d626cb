pub(crate) mod backend;
pub(crate) mod io;
pub(crate) mod naming;
pub(crate) mod order;
pub(crate) mod store;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use serde::Serialize;
use tauri::{AppHandle, State};
use tauri_plugin_dialog::DialogExt;
use tokio::task;

use self::backend::MemoBackend;
use self::store::{ImportReport, RemoveOutcome};
use crate::autosave::AutosavePhase;
use crate::state::AppState;
use crate::types::{DroppedFile, ImportFailure, Memo, MemoExtension, MemoMetadata};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportMemosResponse {
    pub(crate) imported: Vec<MemoMetadata>,
    pub(crate) failures: Vec<ImportFailure>,
    pub(crate) selected: Option<MemoMetadata>,
}

impl From<&ImportReport> for ImportMemosResponse {
    fn from(report: &ImportReport) -> Self {
        Self {
            imported: report.imported.iter().map(MemoMetadata::from).collect(),
            failures: report.failures.clone(),
            selected: report.selected.as_ref().map(MemoMetadata::from),
        }
    }
}

fn to_metadata(memos: &[Memo]) -> Vec<MemoMetadata> {
    memos.iter().map(MemoMetadata::from).collect()
}

async fn finish_import(state: &AppState, report: ImportReport) -> ImportMemosResponse {
    if let Some(memo) = report.selected.as_ref() {
        state.autosave.select(memo).await;
    }
    ImportMemosResponse::from(&report)
}

#[tauri::command]
pub(crate) async fn list_memos(state: State<'_, AppState>) -> Result<Vec<MemoMetadata>, String> {
    let memos = state.store.refresh().await?;
    Ok(to_metadata(&memos))
}

#[tauri::command]
pub(crate) async fn read_memo(
    filename: String,
    state: State<'_, AppState>,
) -> Result<MemoMetadata, String> {
    let backend = Arc::clone(&state.backend);
    task::spawn_blocking(move || backend.read_memo(&filename))
        .await
        .map_err(|err| format!("read memo task failed: {err}"))?
}

#[tauri::command]
pub(crate) async fn save_memo(
    title: String,
    content: String,
    old_filename: Option<String>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    state.store.save(title, content, old_filename).await
}

#[tauri::command]
pub(crate) async fn delete_memo(filename: String, state: State<'_, AppState>) -> Result<(), String> {
    match state.autosave.delete(&filename).await? {
        RemoveOutcome::Removed => Ok(()),
        RemoveOutcome::BlockedPinned => {
            Err("Pinned memos cannot be deleted. Unpin it first.".to_string())
        }
    }
}

#[tauri::command]
pub(crate) async fn create_memo(
    extension: Option<String>,
    state: State<'_, AppState>,
) -> Result<MemoMetadata, String> {
    let extension = match extension.as_deref() {
        Some(value) => MemoExtension::parse(value)
            .ok_or_else(|| format!("Unsupported memo extension: {value}"))?,
        None => MemoExtension::default(),
    };
    let memo = state.store.create(extension).await?;
    Ok(MemoMetadata::from(&memo))
}

#[tauri::command]
pub(crate) async fn toggle_pin(filename: String, state: State<'_, AppState>) -> Result<bool, String> {
    state.store.toggle_pin(&filename).await
}

#[tauri::command]
pub(crate) async fn update_memo_order(
    filenames: Vec<String>,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    state.store.set_order(filenames).await
}

#[tauri::command]
pub(crate) async fn reorder_memo(
    source: String,
    target: String,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    state.store.reorder(&source, &target).await
}

#[tauri::command]
pub(crate) async fn import_memo_from_dialog(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Vec<MemoMetadata>, String> {
    let picked = task::spawn_blocking(move || {
        app.dialog()
            .file()
            .add_filter("Markdown / Text", &["md", "txt"])
            .blocking_pick_files()
    })
    .await
    .map_err(|err| format!("file dialog task failed: {err}"))?;
    let Some(picked) = picked else {
        return Ok(Vec::new());
    };

    let mut paths = Vec::with_capacity(picked.len());
    for file in picked {
        match file.into_path() {
            Ok(path) => paths.push(path),
            Err(err) => log::warn!("Skipping non-local file from dialog: {err}"),
        }
    }
    let report = state.store.import_from_paths(paths).await?;
    Ok(finish_import(&state, report).await.imported)
}

#[tauri::command]
pub(crate) async fn import_memo_from_content(
    original_filename: String,
    content: String,
    state: State<'_, AppState>,
) -> Result<MemoMetadata, String> {
    let memo = state.store.import_content(original_filename, content).await?;
    Ok(MemoMetadata::from(&memo))
}

#[tauri::command]
pub(crate) async fn import_memos_from_drop(
    files: Vec<DroppedFile>,
    state: State<'_, AppState>,
) -> Result<ImportMemosResponse, String> {
    let report = state.store.import_dropped(files).await?;
    Ok(finish_import(&state, report).await)
}

#[tauri::command]
pub(crate) async fn select_memo(
    filename: String,
    state: State<'_, AppState>,
) -> Result<MemoMetadata, String> {
    let editing = state.autosave.editing_filename().await;
    if editing.as_deref() != Some(filename.as_str()) {
        let memo = state
            .store
            .get(&filename)
            .await
            .ok_or_else(|| format!("Memo '{filename}' not found"))?;
        state.autosave.select(&memo).await;
    }
    let memo = state
        .store
        .select(&filename)
        .await
        .ok_or_else(|| format!("Memo '{filename}' not found"))?;
    Ok(MemoMetadata::from(&memo))
}

#[tauri::command]
pub(crate) async fn get_selected_memo(
    state: State<'_, AppState>,
) -> Result<Option<MemoMetadata>, String> {
    Ok(state.store.selected().await.as_ref().map(MemoMetadata::from))
}

#[tauri::command]
pub(crate) async fn set_editing_title(title: String, state: State<'_, AppState>) -> Result<(), String> {
    state.autosave.set_title(title).await;
    Ok(())
}

#[tauri::command]
pub(crate) async fn set_editing_content(
    content: String,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state.autosave.content_changed(content).await;
    Ok(())
}

#[tauri::command]
pub(crate) async fn save_current_memo(state: State<'_, AppState>) -> Result<String, String> {
    state.autosave.save_now().await
}

#[tauri::command]
pub(crate) async fn get_autosave_phase(state: State<'_, AppState>) -> Result<AutosavePhase, String> {
    Ok(state.autosave.phase().await)
}
