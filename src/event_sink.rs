use tauri::{AppHandle, Emitter};

use crate::events::{AutosaveEvent, EventSink};

#[derive(Clone)]
pub(crate) struct TauriEventSink {
    app: AppHandle,
}

impl TauriEventSink {
    pub(crate) fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl EventSink for TauriEventSink {
    fn emit_autosave_event(&self, event: AutosaveEvent) {
        let _ = self.app.emit("autosave-event", event);
    }
}
