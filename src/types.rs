use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppConfig {
    pub(crate) memo_directory: String,
    #[serde(default = "default_auto_save_delay")]
    pub(crate) auto_save_delay: u32,
}

fn default_auto_save_delay() -> u32 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let memo_directory = home.join("Documents").join("Memos");
        Self {
            memo_directory: memo_directory.to_string_lossy().to_string(),
            auto_save_delay: DEFAULT_AUTO_SAVE_DELAY_MS,
        }
    }
}

/// Memo as it crosses the command boundary. Timestamps are RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemoMetadata {
    pub(crate) filename: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) pinned: bool,
    #[serde(default)]
    pub(crate) pinned_at: Option<String>,
}

/// Memo held by the store, with timestamps parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Memo {
    pub(crate) filename: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) pinned: bool,
    pub(crate) pinned_at: Option<DateTime<Utc>>,
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("Invalid {field} timestamp '{value}': {err}"))
}

impl TryFrom<MemoMetadata> for Memo {
    type Error = String;

    fn try_from(metadata: MemoMetadata) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp("createdAt", &metadata.created_at)?;
        let updated_at = parse_timestamp("updatedAt", &metadata.updated_at)?;
        let pinned_at = match metadata.pinned_at.as_deref() {
            Some(value) if !value.trim().is_empty() => match parse_timestamp("pinnedAt", value) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    log::warn!("Ignoring pin time of {}: {err}", metadata.filename);
                    None
                }
            },
            _ => None,
        };
        // A pinned memo always carries a pin time; an unpinned one never does.
        let pinned_at = if metadata.pinned {
            Some(pinned_at.unwrap_or(updated_at))
        } else {
            None
        };
        Ok(Self {
            filename: metadata.filename,
            title: metadata.title,
            content: metadata.content,
            created_at,
            updated_at,
            pinned: metadata.pinned,
            pinned_at,
        })
    }
}

impl From<&Memo> for MemoMetadata {
    fn from(memo: &Memo) -> Self {
        Self {
            filename: memo.filename.clone(),
            title: memo.title.clone(),
            content: memo.content.clone(),
            created_at: memo.created_at.to_rfc3339(),
            updated_at: memo.updated_at.to_rfc3339(),
            pinned: memo.pinned,
            pinned_at: memo.pinned_at.map(|value| value.to_rfc3339()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MemoExtension {
    #[default]
    Md,
    Txt,
}

impl MemoExtension {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            MemoExtension::Md => "md",
            MemoExtension::Txt => "txt",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim().trim_start_matches('.');
        if trimmed.eq_ignore_ascii_case("md") {
            Some(MemoExtension::Md)
        } else if trimmed.eq_ignore_ascii_case("txt") {
            Some(MemoExtension::Txt)
        } else {
            None
        }
    }

    /// Extension of an existing memo filename, `None` for anything that is not a memo.
    pub(crate) fn of_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::parse(ext)
    }
}

/// Entry of the `.pins.json` sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PinEntry {
    pub(crate) pinned: bool,
    #[serde(default)]
    pub(crate) pinned_at: Option<String>,
}

/// A file handed over by a drag and drop, already read by the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DroppedFile {
    #[serde(default)]
    pub(crate) name: Option<String>,
    pub(crate) content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportFailure {
    pub(crate) source: String,
    pub(crate) error: String,
}
