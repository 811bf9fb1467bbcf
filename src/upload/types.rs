use super::id::{BatchId, ItemId};
use crate::error::ValidationError;
use derivative::Derivative;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Media,
    Structured,
}

impl FileCategory {
    /// Classify a file by content type, falling back to the `.json` suffix
    /// when the content type is missing or generic.
    pub fn detect(name: &str, content_type: Option<&str>) -> Option<Self> {
        if let Some(content_type) = content_type {
            let content_type = content_type.to_ascii_lowercase();
            if content_type.starts_with("image/") || content_type.starts_with("video/") {
                return Some(FileCategory::Media);
            }
            if content_type == "application/json" {
                return Some(FileCategory::Structured);
            }
        }

        if name.to_ascii_lowercase().ends_with(".json") {
            return Some(FileCategory::Structured);
        }

        None
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Media => "media",
            FileCategory::Structured => "JSON",
        }
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct FilePayload {
    pub name: String,
    pub path: Option<PathBuf>,
    pub content_type: Option<String>,
    pub size: u64,
    #[derivative(Debug = "ignore")]
    pub bytes: Arc<[u8]>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            path: None,
            content_type,
            size: bytes.len() as u64,
            bytes,
        }
    }

    pub fn category(&self) -> Option<FileCategory> {
        FileCategory::detect(&self.name, self.content_type.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Analyzing,
    Tagging,
    Storing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }

    pub fn progress_percent(&self) -> u8 {
        match self {
            UploadStatus::Uploading => 20,
            UploadStatus::Analyzing => 40,
            UploadStatus::Tagging => 60,
            UploadStatus::Storing => 80,
            UploadStatus::Completed => 100,
            UploadStatus::Failed => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "Uploading to server...",
            UploadStatus::Analyzing => "Analyzing...",
            UploadStatus::Tagging => "Detected tags",
            UploadStatus::Storing => "Storing in",
            UploadStatus::Completed => "Processing Complete",
            UploadStatus::Failed => "Upload Failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: ItemId,
    pub batch_id: BatchId,
    pub payload: FilePayload,
    pub category: FileCategory,
    pub status: UploadStatus,
    pub derived_tags: Option<Vec<String>>,
    pub derived_target: Option<String>,
    pub created_at: Instant,
}

/// Files submitted together in one call. Membership is fixed at creation.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: BatchId,
    pub category: FileCategory,
    members: Vec<(ItemId, FilePayload)>,
}

impl Batch {
    pub fn new(category: FileCategory, files: Vec<FilePayload>) -> Result<Self, ValidationError> {
        if files.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let members = files
            .into_iter()
            .map(|file| (ItemId::generate(), file))
            .collect();

        Ok(Self {
            id: BatchId::generate(),
            category,
            members,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.members.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn files(&self) -> impl Iterator<Item = &FilePayload> {
        self.members.iter().map(|(_, file)| file)
    }

    /// Items in their initial `Uploading` state, in drop order.
    pub fn items(&self) -> Vec<UploadItem> {
        let now = Instant::now();
        self.members
            .iter()
            .map(|(id, file)| UploadItem {
                id: id.clone(),
                batch_id: self.id.clone(),
                payload: file.clone(),
                category: self.category,
                status: UploadStatus::Uploading,
                derived_tags: None,
                derived_target: None,
                created_at: now,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> FilePayload {
        FilePayload::new(name, None, Arc::from(&b"{}"[..]))
    }

    #[test]
    fn detects_media_by_content_type() {
        assert_eq!(
            FileCategory::detect("photo.bin", Some("image/png")),
            Some(FileCategory::Media)
        );
        assert_eq!(
            FileCategory::detect("clip", Some("video/mp4")),
            Some(FileCategory::Media)
        );
    }

    #[test]
    fn detects_structured_by_type_or_suffix() {
        assert_eq!(
            FileCategory::detect("data", Some("application/json")),
            Some(FileCategory::Structured)
        );
        assert_eq!(
            FileCategory::detect("Export.JSON", Some("application/octet-stream")),
            Some(FileCategory::Structured)
        );
        assert_eq!(
            FileCategory::detect("records.json", None),
            Some(FileCategory::Structured)
        );
    }

    #[test]
    fn rejects_unsupported_files() {
        assert_eq!(FileCategory::detect("notes.txt", Some("text/plain")), None);
        assert_eq!(FileCategory::detect("archive.zip", None), None);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = Batch::new(FileCategory::Media, Vec::new()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyBatch);
    }

    #[tokio::test]
    async fn batch_items_start_uploading_with_distinct_ids() {
        let batch = Batch::new(
            FileCategory::Structured,
            vec![payload("a.json"), payload("b.json")],
        )
        .unwrap();

        let items = batch.items();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        assert!(items.iter().all(|i| i.batch_id == batch.id));
        assert!(items.iter().all(|i| i.status == UploadStatus::Uploading));
        assert_eq!(batch.item_ids(), vec![items[0].id.clone(), items[1].id.clone()]);
    }

    #[test]
    fn terminal_states() {
        assert!(UploadStatus::Completed.is_terminal());
        assert!(UploadStatus::Failed.is_terminal());
        assert!(!UploadStatus::Storing.is_terminal());
        assert_eq!(UploadStatus::Failed.progress_percent(), 0);
    }
}
