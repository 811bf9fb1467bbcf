//! Per-file lifecycle.
//!
//! Media:      Uploading -> Analyzing -> Tagging -> Storing -> Completed
//! Structured: Uploading -> Analyzing -> Storing -> Completed
//!
//! `Failed` is reachable from every non-terminal state. Events that do not
//! match an outgoing edge of the current state are dropped.

use super::types::{FileCategory, UploadItem, UploadStatus};

const DEFAULT_PRIMARY: &str = "Uncategorized";
const DEFAULT_SECONDARY: &str = "General";
const UNASSIGNED_ENGINE: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEvent {
    /// Backend acknowledged the batch.
    Accepted,
    /// Backend rejected the batch or the transport failed.
    Rejected,
    /// Classification finished with these tags.
    Tagged { tags: Vec<String> },
    /// Storage destination chosen. `engine` is reported for structured data.
    Stored { engine: Option<String> },
    Finished,
}

/// Next state of `item` under `event`, or `None` when the event is dropped.
pub fn try_advance(item: &UploadItem, event: &ItemEvent) -> Option<UploadItem> {
    use UploadStatus::*;

    if item.status.is_terminal() {
        return None;
    }

    let mut next = item.clone();
    match (item.category, item.status, event) {
        (_, _, ItemEvent::Rejected) => {
            next.status = Failed;
        }
        (_, Uploading, ItemEvent::Accepted) => {
            next.status = Analyzing;
        }
        (FileCategory::Media, Analyzing, ItemEvent::Tagged { tags }) => {
            next.status = Tagging;
            next.derived_tags = Some(dedup_tags(tags));
        }
        (FileCategory::Media, Tagging, ItemEvent::Stored { .. }) => {
            next.status = Storing;
            next.derived_target = Some(storage_path(
                item.derived_tags.as_deref().unwrap_or_default(),
            ));
        }
        (FileCategory::Structured, Analyzing, ItemEvent::Stored { engine }) => {
            next.status = Storing;
            next.derived_target = Some(
                engine
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED_ENGINE.to_string()),
            );
        }
        (_, Storing, ItemEvent::Finished) => {
            next.status = Completed;
        }
        _ => return None,
    }

    Some(next)
}

/// Like [`try_advance`] but returns the item unchanged for dropped events.
pub fn advance(item: &UploadItem, event: &ItemEvent) -> UploadItem {
    try_advance(item, event).unwrap_or_else(|| item.clone())
}

/// `"{Primary}/{Secondary}/"` from the first two tags.
pub fn storage_path(tags: &[String]) -> String {
    let primary = tags
        .first()
        .map(|t| capitalize(t))
        .unwrap_or_else(|| DEFAULT_PRIMARY.to_string());
    let secondary = tags
        .get(1)
        .map(|t| capitalize(t))
        .unwrap_or_else(|| DEFAULT_SECONDARY.to_string());
    format!("{}/{}/", primary, secondary)
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !seen.iter().any(|t: &String| t == tag) {
            seen.push(tag.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::{Batch, FilePayload};
    use std::sync::Arc;

    fn item(category: FileCategory) -> UploadItem {
        let name = match category {
            FileCategory::Media => "dog.png",
            FileCategory::Structured => "rows.json",
        };
        let payload = FilePayload::new(name, None, Arc::from(&b"x"[..]));
        Batch::new(category, vec![payload]).unwrap().items().remove(0)
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn media_walks_the_full_pipeline() {
        let mut it = item(FileCategory::Media);

        it = advance(&it, &ItemEvent::Accepted);
        assert_eq!(it.status, UploadStatus::Analyzing);

        it = advance(&it, &ItemEvent::Tagged { tags: tags(&["animals", "outdoor", "pets"]) });
        assert_eq!(it.status, UploadStatus::Tagging);
        assert_eq!(it.derived_tags.as_deref(), Some(&tags(&["animals", "outdoor", "pets"])[..]));

        it = advance(&it, &ItemEvent::Stored { engine: None });
        assert_eq!(it.status, UploadStatus::Storing);
        assert_eq!(it.derived_target.as_deref(), Some("Animals/Outdoor/"));

        it = advance(&it, &ItemEvent::Finished);
        assert_eq!(it.status, UploadStatus::Completed);
    }

    #[test]
    fn structured_skips_tagging_and_uses_engine() {
        let mut it = item(FileCategory::Structured);
        it = advance(&it, &ItemEvent::Accepted);

        assert!(try_advance(&it, &ItemEvent::Tagged { tags: tags(&["a", "b"]) }).is_none());

        it = advance(&it, &ItemEvent::Stored { engine: Some("MongoDB".to_string()) });
        assert_eq!(it.status, UploadStatus::Storing);
        assert_eq!(it.derived_target.as_deref(), Some("MongoDB"));
        assert!(it.derived_tags.is_none());

        it = advance(&it, &ItemEvent::Finished);
        assert_eq!(it.status, UploadStatus::Completed);
    }

    #[test]
    fn structured_without_engine_is_unassigned() {
        let it = advance(&item(FileCategory::Structured), &ItemEvent::Accepted);
        let it = advance(&it, &ItemEvent::Stored { engine: None });
        assert_eq!(it.derived_target.as_deref(), Some("Unassigned"));
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let it = item(FileCategory::Media);
        assert!(try_advance(&it, &ItemEvent::Finished).is_none());
        assert!(try_advance(&it, &ItemEvent::Stored { engine: None }).is_none());

        let analyzing = advance(&it, &ItemEvent::Accepted);
        assert!(try_advance(&analyzing, &ItemEvent::Stored { engine: None }).is_none());
        assert!(try_advance(&analyzing, &ItemEvent::Accepted).is_none());
    }

    #[test]
    fn rejection_fails_any_non_terminal_state() {
        let uploading = item(FileCategory::Media);
        assert_eq!(advance(&uploading, &ItemEvent::Rejected).status, UploadStatus::Failed);

        let tagging = advance(
            &advance(&uploading, &ItemEvent::Accepted),
            &ItemEvent::Tagged { tags: tags(&["food"]) },
        );
        assert_eq!(advance(&tagging, &ItemEvent::Rejected).status, UploadStatus::Failed);
    }

    #[test]
    fn terminal_states_ignore_everything() {
        let failed = advance(&item(FileCategory::Structured), &ItemEvent::Rejected);
        for event in [
            ItemEvent::Accepted,
            ItemEvent::Rejected,
            ItemEvent::Stored { engine: None },
            ItemEvent::Finished,
        ] {
            assert!(try_advance(&failed, &event).is_none());
            assert_eq!(advance(&failed, &event).status, UploadStatus::Failed);
        }
    }

    #[test]
    fn storage_path_defaults() {
        assert_eq!(storage_path(&[]), "Uncategorized/General/");
        assert_eq!(storage_path(&tags(&["nature"])), "Nature/General/");
        assert_eq!(storage_path(&tags(&["urban", "architecture"])), "Urban/Architecture/");
    }

    #[test]
    fn duplicate_tags_are_collapsed_in_order() {
        let it = advance(&item(FileCategory::Media), &ItemEvent::Accepted);
        let it = advance(&it, &ItemEvent::Tagged { tags: tags(&["city", "city", " ", "urban"]) });
        assert_eq!(it.derived_tags, Some(tags(&["city", "urban"])));
    }
}
