pub(crate) mod memos_core;
pub(crate) mod settings_core;
