use super::id::{BatchId, ItemId};
use super::machine::{try_advance, ItemEvent};
use super::types::{UploadItem, UploadStatus};
use std::sync::Arc;

/// One state-machine event addressed to a single item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub batch_id: BatchId,
    pub item_id: ItemId,
    pub event: ItemEvent,
}

/// Ordered, persistent collection of the items shown in the view.
///
/// Every merge produces a new collection; entries that were not touched keep
/// pointer identity, so `Arc::ptr_eq` is a valid change check.
#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    items: Arc<Vec<Arc<UploadItem>>>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<UploadItem>> {
        self.items.iter()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Arc<UploadItem>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn same_as(&self, other: &ItemCollection) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|i| !i.status.is_terminal()).count()
    }

    pub fn count_with(&self, status: UploadStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn append(&self, new_items: Vec<UploadItem>) -> Self {
        if new_items.is_empty() {
            return self.clone();
        }
        let mut items = Vec::with_capacity(self.items.len() + new_items.len());
        items.extend(self.items.iter().cloned());
        items.extend(new_items.into_iter().map(Arc::new));
        Self {
            items: Arc::new(items),
        }
    }

    /// Drop every `Completed` item; failed and in-flight items stay.
    pub fn clear_completed(&self) -> Self {
        if self.count_with(UploadStatus::Completed) == 0 {
            return self.clone();
        }
        let items = self
            .items
            .iter()
            .filter(|i| i.status != UploadStatus::Completed)
            .cloned()
            .collect();
        Self {
            items: Arc::new(items),
        }
    }
}

/// Fold `update` into `collection`.
///
/// The target must match both the item id and its originating batch. When
/// nothing matches, or the state machine drops the event, the input
/// collection is returned as-is.
pub fn apply(collection: &ItemCollection, update: &ItemUpdate) -> ItemCollection {
    let Some(position) = collection
        .items
        .iter()
        .position(|i| i.id == update.item_id && i.batch_id == update.batch_id)
    else {
        return collection.clone();
    };

    let Some(next) = try_advance(&collection.items[position], &update.event) else {
        return collection.clone();
    };

    let mut items: Vec<Arc<UploadItem>> = collection.items.iter().cloned().collect();
    items[position] = Arc::new(next);
    ItemCollection {
        items: Arc::new(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::{Batch, FileCategory, FilePayload};

    fn batch(category: FileCategory, names: &[&str]) -> Batch {
        let files = names
            .iter()
            .map(|n| FilePayload::new(*n, None, Arc::from(&b"x"[..])))
            .collect();
        Batch::new(category, files).unwrap()
    }

    fn update(batch: &Batch, index: usize, event: ItemEvent) -> ItemUpdate {
        ItemUpdate {
            batch_id: batch.id.clone(),
            item_id: batch.item_ids()[index].clone(),
            event,
        }
    }

    #[test]
    fn only_the_target_item_changes() {
        let b = batch(FileCategory::Media, &["a.png", "b.png", "c.png"]);
        let before = ItemCollection::new().append(b.items());

        let after = apply(&before, &update(&b, 1, ItemEvent::Accepted));

        let old: Vec<_> = before.iter().collect();
        let new: Vec<_> = after.iter().collect();
        assert!(Arc::ptr_eq(old[0], new[0]));
        assert!(!Arc::ptr_eq(old[1], new[1]));
        assert!(Arc::ptr_eq(old[2], new[2]));
        assert_eq!(new[1].status, UploadStatus::Analyzing);
        assert_eq!(old[1].status, UploadStatus::Uploading);
    }

    #[test]
    fn applying_twice_is_the_same_as_once() {
        let b = batch(FileCategory::Structured, &["a.json"]);
        let start = ItemCollection::new().append(b.items());
        let u = update(&b, 0, ItemEvent::Accepted);

        let once = apply(&start, &u);
        let twice = apply(&once, &u);

        assert!(twice.same_as(&once));
        assert_eq!(twice.get(&u.item_id).unwrap().status, UploadStatus::Analyzing);
    }

    #[test]
    fn concurrent_batches_are_isolated() {
        let b1 = batch(FileCategory::Media, &["one.png", "two.png"]);
        let b2 = batch(FileCategory::Media, &["one.png", "two.png"]);
        let start = ItemCollection::new().append(b1.items()).append(b2.items());

        let mut current = start.clone();
        for i in 0..2 {
            current = apply(&current, &update(&b1, i, ItemEvent::Rejected));
        }

        for id in b2.item_ids() {
            let before = start.get(&id).unwrap();
            let after = current.get(&id).unwrap();
            assert!(Arc::ptr_eq(before, after));
            assert_eq!(after.status, UploadStatus::Uploading);
        }
        assert_eq!(current.count_with(UploadStatus::Failed), 2);
    }

    #[test]
    fn mismatched_batch_id_is_ignored() {
        let b1 = batch(FileCategory::Media, &["a.png"]);
        let b2 = batch(FileCategory::Media, &["b.png"]);
        let start = ItemCollection::new().append(b1.items()).append(b2.items());

        let crossed = ItemUpdate {
            batch_id: b2.id.clone(),
            item_id: b1.item_ids()[0].clone(),
            event: ItemEvent::Rejected,
        };
        assert!(apply(&start, &crossed).same_as(&start));
    }

    #[test]
    fn clear_completed_keeps_everything_else() {
        let b = batch(FileCategory::Structured, &["a.json", "b.json", "c.json"]);
        let mut current = ItemCollection::new().append(b.items());
        for event in [
            ItemEvent::Accepted,
            ItemEvent::Stored { engine: None },
            ItemEvent::Finished,
        ] {
            current = apply(&current, &update(&b, 0, event));
        }
        current = apply(&current, &update(&b, 1, ItemEvent::Rejected));

        let cleared = current.clear_completed();
        assert_eq!(cleared.len(), 2);
        assert!(cleared.get(&b.item_ids()[0]).is_none());
        assert_eq!(cleared.count_with(UploadStatus::Failed), 1);
        assert_eq!(cleared.pending_count(), 1);
    }
}
