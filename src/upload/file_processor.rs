use super::types::{FileCategory, FilePayload};
use ignore::Walk;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Files from one drop, split by category.
#[derive(Debug, Default)]
pub struct DropSorting {
    pub media: Vec<FilePayload>,
    pub structured: Vec<FilePayload>,
    pub skipped: Vec<SkippedFile>,
}

impl DropSorting {
    pub fn push(&mut self, payload: FilePayload) {
        match payload.category() {
            Some(FileCategory::Media) => self.media.push(payload),
            Some(FileCategory::Structured) => self.structured.push(payload),
            None => self.skipped.push(SkippedFile {
                name: payload.name,
                reason: "Unsupported file type".to_string(),
            }),
        }
    }

    /// Non-empty groups, one per future batch.
    pub fn into_groups(self) -> Vec<(FileCategory, Vec<FilePayload>)> {
        let mut groups = Vec::new();
        if !self.media.is_empty() {
            groups.push((FileCategory::Media, self.media));
        }
        if !self.structured.is_empty() {
            groups.push((FileCategory::Structured, self.structured));
        }
        groups
    }
}

/// Turns dropped paths (files or folders) into categorised payloads.
#[derive(Debug, Default, Clone)]
pub struct FileCollector;

impl FileCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn collect(&self, paths: &[PathBuf]) -> DropSorting {
        let mut sorting = DropSorting::default();

        for path in paths {
            if path.is_dir() {
                for entry in Walk::new(path).flatten() {
                    let entry_path = entry.path();
                    if entry_path.is_file() {
                        self.collect_file(entry_path, &mut sorting);
                    }
                }
            } else {
                self.collect_file(path, &mut sorting);
            }
        }

        debug!(
            "Collected {} media, {} structured, {} skipped",
            sorting.media.len(),
            sorting.structured.len(),
            sorting.skipped.len()
        );
        sorting
    }

    fn collect_file(&self, path: &Path, sorting: &mut DropSorting) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        if IGNORED_FILES.contains(&name.as_str()) {
            return;
        }

        match fs::read(path) {
            Ok(bytes) => {
                let mut payload = Self::from_bytes(name, Arc::from(bytes));
                payload.path = Some(path.to_path_buf());
                sorting.push(payload);
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                sorting.skipped.push(SkippedFile {
                    name,
                    reason: format!("Failed to read file: {}", e),
                });
            }
        }
    }

    /// Build a payload from in-memory bytes, sniffing the content type.
    pub fn from_bytes(name: String, bytes: Arc<[u8]>) -> FilePayload {
        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| {
                name.to_ascii_lowercase()
                    .ends_with(".json")
                    .then(|| "application/json".to_string())
            });
        FilePayload::new(name, content_type, bytes)
    }
}
