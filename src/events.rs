use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum AutosaveEvent {
    #[serde(rename_all = "camelCase")]
    Saved {
        previous_filename: String,
        filename: String,
        manual: bool,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        filename: String,
        error: String,
        manual: bool,
    },
}

impl AutosaveEvent {
    pub(crate) fn renamed(&self) -> bool {
        match self {
            AutosaveEvent::Saved {
                previous_filename,
                filename,
                ..
            } => previous_filename != filename,
            AutosaveEvent::Failed { .. } => false,
        }
    }
}

pub(crate) trait EventSink: Send + Sync + 'static {
    fn emit_autosave_event(&self, event: AutosaveEvent);
}

#[cfg(test)]
mod tests {
    use super::AutosaveEvent;
    use serde_json::json;

    #[test]
    fn saved_event_serializes_with_type_tag() {
        let event = AutosaveEvent::Saved {
            previous_filename: "a.md".to_string(),
            filename: "b.md".to_string(),
            manual: false,
        };
        assert!(event.renamed());
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({
                "type": "saved",
                "previousFilename": "a.md",
                "filename": "b.md",
                "manual": false
            })
        );
    }
}
