use crate::utils::time_ago::{deserialize_lenient_timestamp, format_time_ago};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Checking,
    Healthy,
    Degraded,
    Down,
}

impl Severity {
    pub fn hex(&self) -> &'static str {
        match self {
            Severity::Checking => "#9ca3af",
            Severity::Healthy => "#4ade80",
            Severity::Degraded => "#facc15",
            Severity::Down => "#f87171",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubStatus {
    pub label: String,
    pub severity: Severity,
}

impl SubStatus {
    fn new(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            label: label.into(),
            severity,
        }
    }

    fn offline() -> Self {
        Self::new("Offline", Severity::Down)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub processing: SubStatus,
    pub storage: SubStatus,
    pub queue: SubStatus,
    pub online: bool,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            processing: SubStatus::new("Checking...", Severity::Checking),
            storage: SubStatus::new("Checking...", Severity::Checking),
            queue: SubStatus::new("0 pending", Severity::Checking),
            online: false,
        }
    }
}

impl SystemStatus {
    pub fn apply_health(&mut self, report: &HealthReport) {
        self.online = true;
        self.processing = SubStatus::new("Ready", Severity::Healthy);
        self.storage = if report.firebase {
            SubStatus::new("Connected", Severity::Healthy)
        } else {
            SubStatus::new("Mock Mode", Severity::Degraded)
        };
        self.queue = SubStatus::new(
            format!("{} pending", report.queue_depth.unwrap_or(0)),
            Severity::Healthy,
        );
    }

    pub fn mark_offline(&mut self) {
        self.online = false;
        self.processing = SubStatus::offline();
        self.storage = SubStatus::offline();
        self.queue = SubStatus::offline();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub firebase: bool,
    #[serde(default, alias = "queue")]
    pub queue_depth: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Media,
    Json,
    #[serde(other)]
    Other,
}

/// One line of the backend's upload history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub filename: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActivityEntry {
    pub fn summary(&self) -> String {
        match self.kind {
            RecordKind::Media => {
                let tags = if self.tags.is_empty() {
                    "none".to_string()
                } else {
                    self.tags.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
                };
                format!("Uploaded \"{}\" with tags: {}", self.filename, tags)
            }
            _ => format!(
                "Processed \"{}\" → {}",
                self.filename,
                self.db_type.as_deref().unwrap_or("unknown")
            ),
        }
    }

    /// Computed on every read; never cached.
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        format_time_ago(self.timestamp, now)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityHistory {
    #[serde(default)]
    pub logs: Vec<ActivityEntry>,
}

/// Server-side view of a stored file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteFileRecord {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub record_count: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub storage_provider: Option<String>,
}

impl RemoteFileRecord {
    /// First three tags plus the number left out.
    pub fn tag_preview(&self) -> (&[String], usize) {
        let shown = self.tags.len().min(3);
        (&self.tags[..shown], self.tags.len() - shown)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<RemoteFileRecord>,
}
