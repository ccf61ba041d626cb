use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::events::{AutosaveEvent, EventSink};
use crate::memos::backend::MemoBackend;
use crate::memos::naming::UNTITLED_TITLE;
use crate::memos::store::{MemoStore, RemoveOutcome};
use crate::types::Memo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AutosavePhase {
    Idle,
    Pending,
    Saving,
}

/// What a save writes, captured when the save is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveSnapshot {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) filename: String,
}

struct EditingSession {
    filename: String,
    title: String,
    saved_title: String,
    baseline: String,
    editing: String,
}

impl EditingSession {
    fn for_memo(memo: &Memo) -> Self {
        Self {
            filename: memo.filename.clone(),
            title: memo.title.clone(),
            saved_title: memo.title.clone(),
            baseline: memo.content.clone(),
            editing: memo.content.clone(),
        }
    }

    fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            title: effective_title(&self.title),
            content: self.editing.clone(),
            filename: self.filename.clone(),
        }
    }

    fn is_dirty(&self) -> bool {
        self.editing != self.baseline || effective_title(&self.title) != self.saved_title
    }
}

struct PendingSave {
    generation: u64,
    snapshot: SaveSnapshot,
    handle: JoinHandle<()>,
}

struct CoordinatorState {
    session: Option<EditingSession>,
    pending: Option<PendingSave>,
    saving: usize,
    generation: u64,
    delay: Duration,
    /// Renames performed by completed saves, so queued saves land on the new file.
    forwarded: HashMap<String, String>,
    /// Last save that failed, keyed by the filename it was written against.
    failed: Option<SaveSnapshot>,
    closed: bool,
}

impl CoordinatorState {
    fn cancel_pending(&mut self) -> Option<SaveSnapshot> {
        let pending = self.pending.take()?;
        pending.handle.abort();
        Some(pending.snapshot)
    }

    fn already_failed(&self, snapshot: &SaveSnapshot) -> bool {
        self.failed.as_ref().is_some_and(|failed| {
            failed.title == snapshot.title
                && failed.content == snapshot.content
                && failed.filename == resolve_forwarded(&self.forwarded, &snapshot.filename)
        })
    }
}

struct Inner<B: MemoBackend, S: EventSink> {
    store: Arc<MemoStore<B>>,
    sink: S,
    state: Mutex<CoordinatorState>,
    save_lock: Mutex<()>,
}

/// Debounced autosave for the memo being edited.
///
/// Every content change restarts the timer; when it runs out the snapshot
/// captured at scheduling time is written. Saves, manual or automatic, go
/// through one lock and complete in the order they were started.
pub(crate) struct AutosaveCoordinator<B: MemoBackend, S: EventSink> {
    inner: Arc<Inner<B, S>>,
}

impl<B: MemoBackend, S: EventSink> Clone for AutosaveCoordinator<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn effective_title(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED_TITLE.to_string()
    } else {
        title.to_string()
    }
}

fn resolve_forwarded(forwarded: &HashMap<String, String>, filename: &str) -> String {
    let mut current = filename.to_string();
    // Bounded so a cycle in the map cannot spin forever.
    for _ in 0..=forwarded.len() {
        match forwarded.get(&current) {
            Some(next) if next != &current => current = next.clone(),
            _ => break,
        }
    }
    current
}

impl<B: MemoBackend, S: EventSink> AutosaveCoordinator<B, S> {
    pub(crate) fn start(store: Arc<MemoStore<B>>, sink: S, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                state: Mutex::new(CoordinatorState {
                    session: None,
                    pending: None,
                    saving: 0,
                    generation: 0,
                    delay,
                    forwarded: HashMap::new(),
                    failed: None,
                    closed: false,
                }),
                save_lock: Mutex::new(()),
            }),
        }
    }

    async fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner.state.lock().await
    }

    pub(crate) async fn phase(&self) -> AutosavePhase {
        let state = self.state().await;
        if state.pending.is_some() {
            AutosavePhase::Pending
        } else if state.saving > 0 {
            AutosavePhase::Saving
        } else {
            AutosavePhase::Idle
        }
    }

    pub(crate) async fn editing_filename(&self) -> Option<String> {
        let state = self.state().await;
        state.session.as_ref().map(|session| session.filename.clone())
    }

    pub(crate) async fn set_delay(&self, delay: Duration) {
        self.state().await.delay = delay;
    }

    /// Starts editing `memo`. Whatever is outstanding for the previous memo is
    /// written to the previous memo first.
    pub(crate) async fn select(&self, memo: &Memo) {
        self.flush().await;
        let mut state = self.state().await;
        if state.closed {
            return;
        }
        state.session = Some(EditingSession::for_memo(memo));
        state.forwarded.clear();
        state.failed = None;
    }

    /// Stops editing `filename` if it is the current memo, dropping any pending save.
    pub(crate) async fn deselect(&self, filename: &str) {
        let mut state = self.state().await;
        let current = state
            .session
            .as_ref()
            .is_some_and(|session| session.filename == filename);
        if current {
            state.cancel_pending();
            state.session = None;
        }
    }

    /// Deletes `filename`. Outstanding edits are written first and the editing
    /// session is only dropped once the file is actually gone.
    pub(crate) async fn delete(&self, filename: &str) -> Result<RemoveOutcome, String> {
        self.flush().await;
        let outcome = {
            let _guard = self.inner.save_lock.lock().await;
            self.inner.store.remove(filename).await?
        };
        if outcome == RemoveOutcome::Removed {
            self.deselect(filename).await;
        }
        Ok(outcome)
    }

    pub(crate) async fn set_title(&self, title: String) {
        let mut state = self.state().await;
        if let Some(session) = state.session.as_mut() {
            session.title = title;
        }
    }

    pub(crate) async fn content_changed(&self, content: String) {
        let mut state = self.state().await;
        if state.closed {
            return;
        }
        let Some(session) = state.session.as_mut() else {
            return;
        };
        session.editing = content;
        let skip = session.editing == session.baseline || session.editing.trim().is_empty();
        let snapshot = session.snapshot();
        state.cancel_pending();
        if skip {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        let delay = state.delay;
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.fire(generation).await;
        });
        state.pending = Some(PendingSave {
            generation,
            snapshot,
            handle,
        });
    }

    async fn fire(&self, generation: u64) {
        let snapshot = {
            let mut state = self.state().await;
            match state.pending.take() {
                Some(pending) if pending.generation == generation => {
                    state.saving += 1;
                    pending.snapshot
                }
                other => {
                    state.pending = other;
                    return;
                }
            }
        };
        let _ = self.run_save(snapshot, false).await;
    }

    /// Writes the current editing state right away. Empty content is allowed here.
    pub(crate) async fn save_now(&self) -> Result<String, String> {
        let snapshot = {
            let mut state = self.state().await;
            let snapshot = state
                .session
                .as_ref()
                .map(EditingSession::snapshot)
                .ok_or("No memo is selected")?;
            state.cancel_pending();
            state.saving += 1;
            snapshot
        };
        self.run_save(snapshot, true).await
    }

    /// Runs a pending save immediately, saves leftover edits of the current
    /// memo and waits until nothing is in flight. Edits whose last save
    /// failed are not written again.
    pub(crate) async fn flush(&self) {
        let pending = {
            let mut state = self.state().await;
            let pending = state.cancel_pending();
            if pending.is_some() {
                state.saving += 1;
            }
            pending
        };
        if let Some(snapshot) = pending {
            let _ = self.run_save(snapshot, false).await;
        }
        self.wait_idle().await;

        let leftover = {
            let mut state = self.state().await;
            let snapshot = state
                .session
                .as_ref()
                .filter(|session| session.is_dirty() && !session.editing.trim().is_empty())
                .map(EditingSession::snapshot)
                .filter(|snapshot| !state.already_failed(snapshot));
            if snapshot.is_some() {
                state.saving += 1;
            }
            snapshot
        };
        if let Some(snapshot) = leftover {
            let _ = self.run_save(snapshot, false).await;
        }
    }

    async fn wait_idle(&self) {
        loop {
            drop(self.inner.save_lock.lock().await);
            if self.state().await.saving == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Cancels pending work and stops accepting edits. In-flight saves finish.
    pub(crate) async fn teardown(&self) {
        let mut state = self.state().await;
        state.closed = true;
        if state.cancel_pending().is_some() {
            log::debug!("Dropped pending autosave on teardown");
        }
        state.session = None;
    }

    async fn run_save(&self, snapshot: SaveSnapshot, manual: bool) -> Result<String, String> {
        let _guard = self.inner.save_lock.lock().await;
        let target = {
            let state = self.state().await;
            resolve_forwarded(&state.forwarded, &snapshot.filename)
        };
        let result = self
            .inner
            .store
            .save(
                snapshot.title.clone(),
                snapshot.content.clone(),
                Some(target.clone()),
            )
            .await;

        let mut state = self.state().await;
        state.saving = state.saving.saturating_sub(1);
        match &result {
            Ok(filename) => {
                state.failed = None;
                if filename != &target {
                    state.forwarded.insert(target.clone(), filename.clone());
                }
                if let Some(session) = state
                    .session
                    .as_mut()
                    .filter(|session| session.filename == target)
                {
                    session.filename = filename.clone();
                    session.baseline = snapshot.content;
                    session.saved_title = snapshot.title;
                }
                drop(state);
                let event = AutosaveEvent::Saved {
                    previous_filename: target,
                    filename: filename.clone(),
                    manual,
                };
                if event.renamed() {
                    log::info!("Saved memo {filename} (renamed)");
                } else {
                    log::debug!("Saved memo {filename}");
                }
                self.inner.sink.emit_autosave_event(event);
            }
            Err(error) => {
                state.failed = Some(SaveSnapshot {
                    filename: target.clone(),
                    ..snapshot
                });
                drop(state);
                log::error!("Failed to save memo {target}: {error}");
                self.inner.sink.emit_autosave_event(AutosaveEvent::Failed {
                    filename: target,
                    error: error.clone(),
                    manual,
                });
            }
        }
        result
    }
}
