//! Debounced, coalescing autosave
//!
//! The coordinator keeps at most one snapshot waiting, at most one write in
//! flight and at most one follow-up write queued behind it. Its phases:
//!
//! - `Idle`: nothing scheduled
//! - `Pending`: a change arrived and the debounce timer is running
//! - `InFlight`: a write is running
//! - `InFlightQueued`: a write is running and the newest snapshot will be
//!   written as soon as it completes
//!
//! Every change replaces the waiting snapshot and restarts the timer, so the
//! store only ever sees the newest state and never sees states out of order.
//! A document switch drops the timer and the waiting snapshot; an in-flight
//! write is allowed to finish but nothing follows it.

use crate::codec::GenogramDocument;
use crate::editor::{ChangeCause, EditorEvent};
use crate::errors::GenogramResult;
use crate::infrastructure::GenogramStore;
use crate::value_objects::DocumentId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Autosave settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before a write starts
    pub debounce_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 3000 }
    }
}

impl AutosaveConfig {
    /// The debounce delay
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// State machine phase of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosavePhase {
    Idle,
    Pending,
    InFlight,
    InFlightQueued,
}

/// Save indicator surfaced to the document's caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// The store holds the newest state
    Saved,
    /// Changes are waiting to be written
    Unsaved,
    /// A write is running
    Saving,
    /// The last write failed; its snapshot is kept for the next attempt
    Failed,
}

/// A write about to start
struct WriteJob {
    document: DocumentId,
    snapshot: Arc<GenogramDocument>,
    epoch: u64,
}

#[derive(Default)]
struct State {
    document: Option<DocumentId>,
    /// Newest snapshot not yet handed to the store
    latest: Option<Arc<GenogramDocument>>,
    timer: Option<JoinHandle<()>>,
    /// Identifies the live timer; bumped on every restart or cancel
    timer_seq: u64,
    in_flight: bool,
    /// Epoch of the running write
    writing_epoch: u64,
    queued: bool,
    /// Bumped on document switch; completions from older epochs are ignored
    epoch: u64,
}

impl State {
    fn phase(&self) -> AutosavePhase {
        match (self.in_flight, self.queued) {
            (true, true) => AutosavePhase::InFlightQueued,
            (true, false) => AutosavePhase::InFlight,
            (false, _) if self.timer.is_some() => AutosavePhase::Pending,
            _ => AutosavePhase::Idle,
        }
    }

    fn cancel_timer(&mut self) {
        self.timer_seq += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Whether the running write belongs to a document switched away from
    fn writing_stale(&self) -> bool {
        self.in_flight && self.writing_epoch != self.epoch
    }

    fn begin_write(&mut self) -> Option<WriteJob> {
        let document = self.document?;
        let snapshot = self.latest.take()?;
        self.in_flight = true;
        self.writing_epoch = self.epoch;
        Some(WriteJob {
            document,
            snapshot,
            epoch: self.epoch,
        })
    }
}

struct Shared {
    store: Arc<dyn GenogramStore>,
    config: AutosaveConfig,
    state: Mutex<State>,
    status: watch::Sender<SaveStatus>,
}

/// Drives debounced persistence of one active document
///
/// Cloning yields another handle to the same coordinator. Methods that schedule
/// work must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    shared: Arc<Shared>,
}

impl AutosaveCoordinator {
    /// Create a coordinator with no active document
    pub fn new(store: Arc<dyn GenogramStore>, config: AutosaveConfig) -> Self {
        let (status, _) = watch::channel(SaveStatus::Saved);
        Self {
            shared: Arc::new(Shared {
                store,
                config,
                state: Mutex::new(State::default()),
                status,
            }),
        }
    }

    /// The active document
    pub fn document(&self) -> Option<DocumentId> {
        self.shared.state.lock().document
    }

    /// Current state machine phase
    pub fn phase(&self) -> AutosavePhase {
        self.shared.state.lock().phase()
    }

    /// Current save indicator
    pub fn status(&self) -> SaveStatus {
        *self.shared.status.borrow()
    }

    /// Watch the save indicator
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// Whether some change has not reached the store yet
    pub fn has_unsaved_changes(&self) -> bool {
        let state = self.shared.state.lock();
        state.latest.is_some() || (state.in_flight && !state.writing_stale())
    }

    /// Make `document` the active document
    ///
    /// Drops the pending timer, the waiting snapshot and any queued follow-up
    /// without writing them. A write already running finishes first; changes to
    /// the new document queue behind it.
    pub fn switch_document(&self, document: DocumentId) {
        let discarded = {
            let mut state = self.shared.state.lock();
            state.cancel_timer();
            let discarded = state.latest.take().is_some() || state.queued;
            state.queued = false;
            state.epoch += 1;
            state.document = Some(document);
            discarded
        };
        if discarded {
            tracing::warn!(document = %document, "Document switched; unsaved changes discarded");
        } else {
            tracing::debug!(document = %document, "Document switched");
        }
        self.shared.status.send_replace(SaveStatus::Saved);
    }

    /// Switch to `document` and read its latest snapshot from the store
    pub async fn load(&self, document: DocumentId) -> GenogramResult<Option<GenogramDocument>> {
        self.switch_document(document);
        match self.shared.store.load(document).await {
            Ok(snapshot) => {
                tracing::info!(document = %document, found = snapshot.is_some(), "Snapshot loaded");
                Ok(snapshot)
            }
            Err(error) => {
                tracing::warn!(document = %document, error = %error, "Snapshot load failed");
                Err(error)
            }
        }
    }

    /// Record a new snapshot and restart the debounce timer
    pub fn notify(&self, snapshot: Arc<GenogramDocument>) {
        let saving = {
            let mut state = self.shared.state.lock();
            if state.document.is_none() {
                tracing::warn!("Change ignored; no active document");
                return;
            }
            state.latest = Some(snapshot);
            self.start_timer(&mut state);
            state.in_flight && !state.writing_stale()
        };
        if !saving {
            self.shared.status.send_replace(SaveStatus::Unsaved);
        }
    }

    /// Forward editor changes to `notify` until the editor goes away
    ///
    /// Loads are skipped since a loaded snapshot already matches storage.
    pub fn attach(&self, mut events: broadcast::Receiver<EditorEvent>) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.cause == ChangeCause::Load => {}
                    Ok(event) => coordinator.notify(event.snapshot),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Autosave skipped superseded editor events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Write the newest snapshot now, bypassing the debounce
    ///
    /// If a write is already running the snapshot is queued behind it and this
    /// returns immediately. Otherwise returns the outcome of the write.
    pub async fn save_now(&self) -> GenogramResult<()> {
        let job = {
            let mut state = self.shared.state.lock();
            state.cancel_timer();
            if state.in_flight {
                if state.latest.is_some() {
                    state.queued = true;
                }
                return Ok(());
            }
            match state.begin_write() {
                Some(job) => job,
                None => return Ok(()),
            }
        };
        self.drain(job).await
    }

    fn start_timer(&self, state: &mut State) {
        state.cancel_timer();
        let seq = state.timer_seq;
        let delay = self.shared.config.debounce();
        let coordinator = self.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.on_timer(seq);
        }));
    }

    fn on_timer(&self, seq: u64) {
        let job = {
            let mut state = self.shared.state.lock();
            if state.timer_seq != seq {
                return;
            }
            state.timer = None;
            if state.in_flight {
                if state.latest.is_some() {
                    state.queued = true;
                }
                return;
            }
            match state.begin_write() {
                Some(job) => job,
                None => return,
            }
        };
        let coordinator = self.clone();
        tokio::spawn(async move {
            // Failures are logged and reflected in the status.
            let _ = coordinator.drain(job).await;
        });
    }

    /// Run a write and any follow-ups queued behind it; returns the last outcome
    async fn drain(&self, mut job: WriteJob) -> GenogramResult<()> {
        loop {
            self.shared.status.send_replace(SaveStatus::Saving);
            let result = self.shared.store.save(job.document, &job.snapshot).await;
            match &result {
                Ok(()) => tracing::info!(document = %job.document, "Snapshot saved"),
                Err(error) => {
                    tracing::warn!(document = %job.document, error = %error, "Snapshot save failed")
                }
            }
            match self.finish_write(&job, &result) {
                Some(follow_up) => job = follow_up,
                None => return result,
            }
        }
    }

    fn finish_write(&self, job: &WriteJob, result: &GenogramResult<()>) -> Option<WriteJob> {
        let mut state = self.shared.state.lock();
        let stale = state.epoch != job.epoch;
        if stale {
            tracing::debug!(document = %job.document, "Write for a previous document completed");
        } else if result.is_err() && state.latest.is_none() {
            state.latest = Some(job.snapshot.clone());
        }
        let next = if state.queued {
            state.queued = false;
            state.cancel_timer();
            state.begin_write()
        } else {
            None
        };
        if next.is_none() {
            state.in_flight = false;
        }
        let status = match (result, next.is_some()) {
            (_, true) => SaveStatus::Saving,
            (_, false) if stale && state.latest.is_some() => SaveStatus::Unsaved,
            (_, false) if stale => SaveStatus::Saved,
            (Err(_), false) => SaveStatus::Failed,
            (Ok(()), false) if state.latest.is_some() => SaveStatus::Unsaved,
            (Ok(()), false) => SaveStatus::Saved,
        };
        self.shared.status.send_replace(status);
        next
    }
}
