use std::path::Path;

use crate::types::{MemoExtension, MemoMetadata};

/// Storage operations the memo store and the autosave coordinator rely on.
///
/// Calls are blocking; async callers run them on the blocking pool.
pub(crate) trait MemoBackend: Send + Sync + 'static {
    fn list_memos(&self) -> Result<Vec<MemoMetadata>, String>;

    fn read_memo(&self, filename: &str) -> Result<MemoMetadata, String>;

    /// Writes `content` under a filename derived from `title` and returns the
    /// filename actually used. The extension of `old_filename` is kept.
    fn save_memo(
        &self,
        title: &str,
        content: &str,
        old_filename: Option<&str>,
    ) -> Result<String, String>;

    fn delete_memo(&self, filename: &str) -> Result<(), String>;

    fn create_memo(&self, extension: MemoExtension) -> Result<MemoMetadata, String>;

    /// Returns the new pinned state.
    fn toggle_pin(&self, filename: &str) -> Result<bool, String>;

    fn update_memo_order(&self, filenames: &[String]) -> Result<(), String>;

    fn import_memo_from_path(&self, path: &Path) -> Result<MemoMetadata, String>;

    fn import_memo_from_content(
        &self,
        original_filename: &str,
        content: &str,
    ) -> Result<MemoMetadata, String>;
}
