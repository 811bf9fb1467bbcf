use super::machine::ItemEvent;
use super::types::{FileCategory, UploadItem, UploadStatus};
use crate::config::StageTimings;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Vocabulary of the image classifier.
const TAG_VOCABULARY: &[&str] = &[
    "people",
    "animals",
    "nature",
    "urban",
    "food",
    "indoor",
    "outdoor",
    "sports",
    "technology",
    "vehicles",
    "architecture",
    "art",
    "landscape",
    "portrait",
    "wildlife",
];

const ENGINES: &[&str] = &["PostgreSQL", "MongoDB"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub delay: Duration,
    pub event: ItemEvent,
}

/// Source of stage-completion events for accepted items.
///
/// The session only asks "what happens next to this item, and when"; whether
/// the answer comes from local timing or a backend status feed is up to the
/// implementation.
pub trait ProcessingObserver: Send + Sync {
    /// Delay between the batch acknowledgement and the start of analysis.
    fn acceptance_delay(&self) -> Duration;

    /// Next event for an item that has just entered its current state.
    fn next_stage(&self, item: &UploadItem) -> Option<ScheduledEvent>;
}

#[derive(Debug, Clone)]
pub struct SimulatedObserver {
    timings: StageTimings,
}

impl SimulatedObserver {
    pub fn new(timings: StageTimings) -> Self {
        Self { timings }
    }

    fn classify() -> Vec<String> {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(2..=4);
        TAG_VOCABULARY
            .choose_multiple(&mut rng, count)
            .map(|t| t.to_string())
            .collect()
    }

    fn pick_engine() -> Option<String> {
        ENGINES
            .choose(&mut rand::thread_rng())
            .map(|e| e.to_string())
    }
}

impl ProcessingObserver for SimulatedObserver {
    fn acceptance_delay(&self) -> Duration {
        Duration::from_millis(self.timings.accept_delay_ms)
    }

    fn next_stage(&self, item: &UploadItem) -> Option<ScheduledEvent> {
        let t = &self.timings;
        let (delay_ms, event) = match (item.category, item.status) {
            (FileCategory::Media, UploadStatus::Analyzing) => (
                t.media_analyzing_ms,
                ItemEvent::Tagged {
                    tags: Self::classify(),
                },
            ),
            (FileCategory::Media, UploadStatus::Tagging) => {
                (t.media_tagging_ms, ItemEvent::Stored { engine: None })
            }
            (FileCategory::Media, UploadStatus::Storing) => {
                (t.media_storing_ms, ItemEvent::Finished)
            }
            (FileCategory::Structured, UploadStatus::Analyzing) => (
                t.structured_analyzing_ms,
                ItemEvent::Stored {
                    engine: Self::pick_engine(),
                },
            ),
            (FileCategory::Structured, UploadStatus::Storing) => {
                (t.structured_storing_ms, ItemEvent::Finished)
            }
            _ => return None,
        };

        Some(ScheduledEvent {
            delay: Duration::from_millis(delay_ms),
            event,
        })
    }
}
