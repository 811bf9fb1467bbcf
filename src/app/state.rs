use crate::status::{ActivityEntry, RemoteFileRecord, SystemStatus};
use crate::upload::{ItemCollection, Notifier, SkippedFile, UploadStatus};
use std::time::Duration;

/// Everything the view reads. Mutated only by the session on its own thread.
#[derive(Debug)]
pub struct SessionState {
    pub items: ItemCollection,
    pub notifier: Notifier,
    pub system: SystemStatus,
    pub activity: Vec<ActivityEntry>,
    pub remote_files: Vec<RemoteFileRecord>,
    pub files_error: Option<String>,
    pub skipped: Vec<SkippedFile>,
    pub batches_in_flight: usize,
}

impl SessionState {
    pub fn new(notification_timeout: Duration) -> Self {
        Self {
            items: ItemCollection::new(),
            notifier: Notifier::new(notification_timeout),
            system: SystemStatus::default(),
            activity: Vec::new(),
            remote_files: Vec::new(),
            files_error: None,
            skipped: Vec::new(),
            batches_in_flight: 0,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.batches_in_flight > 0
    }

    pub fn get_progress_percentage(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        let settled = self.items.iter().filter(|i| i.status.is_terminal()).count();
        settled as f32 / self.items.len() as f32
    }

    pub fn get_status_text(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        format!(
            "Processing Files ({}) | ✅ Completed: {} | ⏳ In progress: {} | ❌ Failed: {}",
            self.items.len(),
            self.items.count_with(UploadStatus::Completed),
            self.items.pending_count(),
            self.items.count_with(UploadStatus::Failed)
        )
    }
}
