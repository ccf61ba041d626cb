use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::memos::io::write_atomic;
use crate::types::{AppConfig, PinEntry};

pub(crate) const PINS_FILENAME: &str = ".pins.json";
pub(crate) const ORDER_FILENAME: &str = ".order.json";

pub(crate) type PinMap = HashMap<String, PinEntry>;
pub(crate) type OrderMap = HashMap<String, usize>;

pub(crate) fn config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Unable to resolve home directory")?;
    Ok(home.join(".memo-app"))
}

pub(crate) fn config_path() -> Result<PathBuf, String> {
    Ok(config_dir()?.join("config.json"))
}

pub(crate) fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file: {e}"))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse config: {e}"))
}

pub(crate) fn write_config(path: &Path, config: &AppConfig) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let data = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    std::fs::write(path, data).map_err(|e| format!("Failed to write config file: {e}"))
}

/// Sidecars are advisory: a corrupt file reads as empty instead of hiding every memo.
fn read_sidecar<T: DeserializeOwned + Default>(path: &Path) -> Result<T, String> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str(&data) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            log::warn!("Ignoring unreadable {}: {err}", path.display());
            Ok(T::default())
        }
    }
}

fn write_sidecar<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let data = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    write_atomic(path, &data)
}

pub(crate) fn read_pins(memo_dir: &Path) -> Result<PinMap, String> {
    read_sidecar(&memo_dir.join(PINS_FILENAME))
        .map_err(|e| format!("Failed to read pins file: {e}"))
}

pub(crate) fn write_pins(memo_dir: &Path, pins: &PinMap) -> Result<(), String> {
    write_sidecar(&memo_dir.join(PINS_FILENAME), pins)
        .map_err(|e| format!("Failed to write pins file: {e}"))
}

pub(crate) fn read_order(memo_dir: &Path) -> Result<OrderMap, String> {
    read_sidecar(&memo_dir.join(ORDER_FILENAME))
        .map_err(|e| format!("Failed to read order file: {e}"))
}

pub(crate) fn write_order(memo_dir: &Path, order: &OrderMap) -> Result<(), String> {
    write_sidecar(&memo_dir.join(ORDER_FILENAME), order)
        .map_err(|e| format!("Failed to write order file: {e}"))
}
