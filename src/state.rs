use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tauri::AppHandle;
use tokio::sync::Mutex;

use crate::autosave::AutosaveCoordinator;
use crate::event_sink::TauriEventSink;
use crate::memos::store::MemoStore;
use crate::shared::memos_core::LocalMemoBackend;
use crate::storage::{config_path, read_config};
use crate::types::AppConfig;

pub(crate) struct AppState {
    pub(crate) config_path: PathBuf,
    pub(crate) config: Mutex<AppConfig>,
    pub(crate) backend: Arc<LocalMemoBackend>,
    pub(crate) store: Arc<MemoStore<LocalMemoBackend>>,
    pub(crate) autosave: AutosaveCoordinator<LocalMemoBackend, TauriEventSink>,
}

impl AppState {
    pub(crate) fn load(app: &AppHandle) -> Self {
        let config_path = config_path().unwrap_or_else(|_| {
            std::env::current_dir()
                .unwrap_or_else(|_| ".".into())
                .join("config.json")
        });
        let config = read_config(&config_path).unwrap_or_else(|err| {
            log::warn!("Falling back to default config: {err}");
            AppConfig::default()
        });
        let backend = Arc::new(LocalMemoBackend::new(config.memo_directory.clone()));
        let store = Arc::new(MemoStore::new(Arc::clone(&backend)));
        let autosave = AutosaveCoordinator::start(
            Arc::clone(&store),
            TauriEventSink::new(app.clone()),
            Duration::from_millis(u64::from(config.auto_save_delay)),
        );
        Self {
            config_path,
            config: Mutex::new(config),
            backend,
            store,
            autosave,
        }
    }
}
