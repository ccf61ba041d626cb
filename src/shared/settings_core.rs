use std::path::Path;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::storage::write_config;
use crate::types::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ConfigChange {
    pub(crate) directory: bool,
    pub(crate) delay: bool,
}

pub(crate) async fn get_config_core(config: &Mutex<AppConfig>) -> AppConfig {
    config.lock().await.clone()
}

/// Overlays `memoDirectory` / `autoSaveDelay` from a partial JSON object.
/// Fields of the wrong type are ignored.
pub(crate) fn merge_partial_config(current: &AppConfig, partial: &Value) -> AppConfig {
    let mut merged = current.clone();
    if let Some(directory) = partial.get("memoDirectory").and_then(Value::as_str) {
        merged.memo_directory = directory.to_string();
    }
    if let Some(delay) = partial.get("autoSaveDelay").and_then(Value::as_u64) {
        merged.auto_save_delay = u32::try_from(delay).unwrap_or(u32::MAX);
    }
    merged
}

pub(crate) async fn save_config_core(
    config: AppConfig,
    current: &Mutex<AppConfig>,
    config_path: &Path,
) -> Result<ConfigChange, String> {
    if config.memo_directory.trim().is_empty() {
        return Err("Memo directory cannot be empty".to_string());
    }
    write_config(config_path, &config)?;
    let mut current = current.lock().await;
    let change = ConfigChange {
        directory: current.memo_directory != config.memo_directory,
        delay: current.auto_save_delay != config.auto_save_delay,
    };
    *current = config;
    Ok(change)
}
