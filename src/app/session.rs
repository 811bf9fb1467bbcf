//! Upload session: owns the item collection and every background task that
//! feeds it.
//!
//! Background work (batch submissions, stage timers, polls) never touches
//! state directly. Each task sends a [`SessionEvent`] on the session channel
//! and [`UploadSession::pump`] applies them in arrival order on the owning
//! thread. Dropping the session cancels every outstanding task.
//!
//! Poll results carry the polling epoch they were requested under; stopping
//! the pollers bumps the epoch so results already queued are discarded.
//! File list results also carry a request sequence number and an older
//! response never replaces a newer one.

use super::state::SessionState;
use crate::config::AppConfig;
use crate::error::TransportError;
use crate::status::{
    spawn_poll, ActivityEntry, HealthReport, PollSchedule, PollerHandle, RemoteFileRecord,
};
use crate::upload::{
    apply, Batch, BatchId, BatchResult, FileCategory, FilePayload, ItemEvent, ItemId, ItemUpdate,
    NotificationKind, ProcessingObserver, TimerRegistry, UploadBackend, UploadSubmitter,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

#[derive(Debug)]
pub enum SessionEvent {
    BatchSettled {
        batch_id: BatchId,
        category: FileCategory,
        item_ids: Vec<ItemId>,
        outcome: Result<BatchResult, TransportError>,
    },
    Stage(ItemUpdate),
    Health {
        epoch: u64,
        result: Result<HealthReport, TransportError>,
    },
    Activity {
        epoch: u64,
        result: Result<Vec<ActivityEntry>, TransportError>,
    },
    Files {
        epoch: u64,
        seq: u64,
        result: Result<Vec<RemoteFileRecord>, TransportError>,
    },
}

impl From<ItemUpdate> for SessionEvent {
    fn from(update: ItemUpdate) -> Self {
        SessionEvent::Stage(update)
    }
}

pub struct UploadSession {
    runtime: Handle,
    config: AppConfig,
    backend: Arc<dyn UploadBackend>,
    submitter: UploadSubmitter,
    observer: Arc<dyn ProcessingObserver>,
    state: SessionState,
    timers: TimerRegistry<SessionEvent>,
    pollers: Vec<PollerHandle>,
    poll_epoch: u64,
    files_seq: Arc<AtomicU64>,
    files_applied: u64,
    closed: bool,
    root: CancellationToken,
    sender: UnboundedSender<SessionEvent>,
    receiver: UnboundedReceiver<SessionEvent>,
}

impl UploadSession {
    pub fn new(
        runtime: Handle,
        backend: Arc<dyn UploadBackend>,
        observer: Arc<dyn ProcessingObserver>,
        config: AppConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            timers: TimerRegistry::new(runtime.clone(), sender.clone()),
            submitter: UploadSubmitter::new(backend.clone()),
            state: SessionState::new(config.notification_timeout()),
            runtime,
            config,
            backend,
            observer,
            pollers: Vec::new(),
            poll_epoch: 0,
            files_seq: Arc::new(AtomicU64::new(0)),
            files_applied: 0,
            closed: false,
            root: CancellationToken::new(),
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn is_polling(&self) -> bool {
        !self.pollers.is_empty()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    /// Submit one batch for `category`. Empty drops do nothing.
    pub fn drop_files(&mut self, category: FileCategory, files: Vec<FilePayload>) -> Option<BatchId> {
        let batch = match Batch::new(category, files) {
            Ok(batch) => batch,
            Err(e) => {
                debug!("Ignoring drop: {}", e);
                return None;
            }
        };

        let batch_id = batch.id.clone();
        self.state.items = self.state.items.append(batch.items());
        self.state.batches_in_flight += 1;

        let submitter = self.submitter.clone();
        let sender = self.sender.clone();
        let token = self.root.child_token();
        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = submitter.submit(&batch) => outcome,
            };
            let _ = sender.send(SessionEvent::BatchSettled {
                batch_id: batch.id.clone(),
                category: batch.category,
                item_ids: batch.item_ids(),
                outcome,
            });
        });

        Some(batch_id)
    }

    /// Apply everything background tasks have reported since the last call.
    /// Returns true when the visible state changed.
    pub fn pump(&mut self) -> bool {
        if self.closed {
            while self.receiver.try_recv().is_ok() {}
            return false;
        }

        let mut changed = self.state.notifier.prune();
        while let Ok(event) = self.receiver.try_recv() {
            self.handle(event);
            changed = true;
        }
        changed
    }

    /// Remove completed items. Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.state.items.len();
        self.state.items = self.state.items.clear_completed();
        before - self.state.items.len()
    }

    pub fn start_polling(&mut self) {
        if self.is_polling() {
            return;
        }
        let polling = self.config.polling.clone();
        let epoch = self.poll_epoch;

        let backend = self.backend.clone();
        let sender = self.sender.clone();
        self.pollers.push(spawn_poll(
            &self.runtime,
            PollSchedule {
                name: "health",
                cadence: polling.health_cadence(),
            },
            self.root.child_token(),
            move || {
                let backend = backend.clone();
                let sender = sender.clone();
                async move {
                    let result = backend.fetch_health().await;
                    let _ = sender.send(SessionEvent::Health { epoch, result });
                }
            },
        ));

        let backend = self.backend.clone();
        let sender = self.sender.clone();
        let limit = polling.activity_limit;
        self.pollers.push(spawn_poll(
            &self.runtime,
            PollSchedule {
                name: "activity",
                cadence: polling.activity_cadence(),
            },
            self.root.child_token(),
            move || {
                let backend = backend.clone();
                let sender = sender.clone();
                async move {
                    let result = backend.fetch_activity_history(limit).await;
                    let _ = sender.send(SessionEvent::Activity { epoch, result });
                }
            },
        ));

        let backend = self.backend.clone();
        let sender = self.sender.clone();
        let files_seq = self.files_seq.clone();
        let limit = polling.files_limit;
        self.pollers.push(spawn_poll(
            &self.runtime,
            PollSchedule {
                name: "files",
                cadence: polling.files_cadence(),
            },
            self.root.child_token(),
            move || {
                let backend = backend.clone();
                let sender = sender.clone();
                let seq = files_seq.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    let result = backend.fetch_file_list(limit).await;
                    let _ = sender.send(SessionEvent::Files { epoch, seq, result });
                }
            },
        ));

        info!("Started {} pollers", self.pollers.len());
    }

    pub fn stop_polling(&mut self) {
        for poller in self.pollers.drain(..) {
            debug!("Stopping {} poller", poller.name());
            poller.stop();
        }
        self.poll_epoch += 1;
    }

    /// One-off file list fetch outside the regular cadence.
    pub fn refresh_files(&self) {
        let backend = self.backend.clone();
        let sender = self.sender.clone();
        let token = self.root.child_token();
        let limit = self.config.polling.files_limit;
        let epoch = self.poll_epoch;
        let seq = self.files_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = backend.fetch_file_list(limit) => {
                    let _ = sender.send(SessionEvent::Files { epoch, seq, result });
                }
            }
        });
    }

    /// Stop every poller, timer and pending submission. Events still queued
    /// are discarded.
    pub fn shutdown(&mut self) {
        self.stop_polling();
        self.timers.cancel_all();
        self.root.cancel();
        self.closed = true;
        while self.receiver.try_recv().is_ok() {}
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::BatchSettled {
                batch_id,
                category,
                item_ids,
                outcome,
            } => self.settle_batch(batch_id, category, item_ids, outcome),
            SessionEvent::Stage(update) => self.apply_update(update),
            SessionEvent::Health { epoch, .. }
            | SessionEvent::Activity { epoch, .. }
            | SessionEvent::Files { epoch, .. }
                if epoch != self.poll_epoch =>
            {
                trace!("Dropped poll result from epoch {}", epoch);
            }
            SessionEvent::Health { result, .. } => match result {
                Ok(report) => self.state.system.apply_health(&report),
                Err(e) => {
                    warn!("Backend offline: {}", e);
                    self.state.system.mark_offline();
                }
            },
            SessionEvent::Activity { result, .. } => match result {
                Ok(entries) => self.state.activity = entries,
                Err(e) => warn!("Failed to fetch activity: {}", e),
            },
            SessionEvent::Files { seq, result, .. } => self.apply_files(seq, result),
        }
    }

    fn apply_files(&mut self, seq: u64, result: Result<Vec<RemoteFileRecord>, TransportError>) {
        if seq <= self.files_applied {
            trace!("Dropped stale file list #{}", seq);
            return;
        }
        self.files_applied = seq;

        match result {
            Ok(files) => {
                self.state.remote_files = files;
                self.state.files_error = None;
            }
            Err(e) => {
                warn!("Failed to fetch files: {}", e);
                self.state.files_error = Some(format!("Failed to load files: {}", e.user_message()));
            }
        }
    }

    fn settle_batch(
        &mut self,
        batch_id: BatchId,
        category: FileCategory,
        item_ids: Vec<ItemId>,
        outcome: Result<BatchResult, TransportError>,
    ) {
        self.state.batches_in_flight = self.state.batches_in_flight.saturating_sub(1);

        match outcome {
            Ok(result) => {
                let follow_up = match category {
                    FileCategory::Media => "Processing in background...",
                    FileCategory::Structured => "Analyzing schema...",
                };
                self.state.notifier.emit(
                    format!(
                        "Successfully uploaded {} {} file(s)! {}",
                        result.accepted_count,
                        category.label(),
                        follow_up
                    ),
                    NotificationKind::Success,
                );

                let delay = self.observer.acceptance_delay();
                for item_id in item_ids {
                    self.timers.schedule(
                        ItemUpdate {
                            batch_id: batch_id.clone(),
                            item_id,
                            event: ItemEvent::Accepted,
                        },
                        delay,
                    );
                }
            }
            Err(e) => {
                warn!("Batch {} failed: {}", batch_id, e);
                self.state.notifier.emit(
                    format!("Upload failed: {}", e.user_message()),
                    NotificationKind::Error,
                );
                for item_id in item_ids {
                    self.apply_update(ItemUpdate {
                        batch_id: batch_id.clone(),
                        item_id,
                        event: ItemEvent::Rejected,
                    });
                }
            }
        }
    }

    fn apply_update(&mut self, update: ItemUpdate) {
        let next = apply(&self.state.items, &update);
        if next.same_as(&self.state.items) {
            trace!("Dropped {:?} for {}", update.event, update.item_id);
            return;
        }
        self.state.items = next;

        let Some(item) = self.state.items.get(&update.item_id).cloned() else {
            return;
        };

        if item.status.is_terminal() {
            debug!("{} finished as {:?}", item.payload.name, item.status);
            self.timers.release(&item.id);
            return;
        }

        if let Some(scheduled) = self.observer.next_stage(&item) {
            self.timers.schedule(
                ItemUpdate {
                    batch_id: item.batch_id.clone(),
                    item_id: item.id.clone(),
                    event: scheduled.event,
                },
                scheduled.delay,
            );
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
