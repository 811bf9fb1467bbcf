mod client;
mod file_processor;
mod id;
mod machine;
mod notifier;
mod observer;
mod reconciler;
mod timers;
mod types;

pub use client::{BatchResult, HttpBackend, UploadBackend, UploadSubmitter};
pub use file_processor::{DropSorting, FileCollector, SkippedFile};
pub use id::{BatchId, ItemId};
pub use machine::ItemEvent;
#[cfg(test)]
pub use machine::storage_path;
pub use notifier::{NotificationKind, Notifier};
pub use observer::{ProcessingObserver, SimulatedObserver};
pub use reconciler::{apply, ItemCollection, ItemUpdate};
pub use timers::TimerRegistry;
pub use types::{Batch, FileCategory, FilePayload, UploadItem, UploadStatus};
