use super::id::ItemId;
use super::reconciler::ItemUpdate;
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Delayed stage events, keyed by item.
///
/// Each pending event is a task that sleeps and then delivers its update on
/// the session channel. Tasks belonging to an item share one child token of
/// the registry's root token, so an item can be released on its own and the
/// whole registry is torn down by cancelling the root (also done on drop).
pub struct TimerRegistry<E> {
    runtime: Handle,
    root: CancellationToken,
    pending: HashMap<ItemId, CancellationToken>,
    sender: UnboundedSender<E>,
}

impl<E> TimerRegistry<E>
where
    E: From<ItemUpdate> + Send + 'static,
{
    pub fn new(runtime: Handle, sender: UnboundedSender<E>) -> Self {
        Self {
            runtime,
            root: CancellationToken::new(),
            pending: HashMap::new(),
            sender,
        }
    }

    pub fn schedule(&mut self, update: ItemUpdate, delay: Duration) {
        if self.root.is_cancelled() {
            return;
        }

        let token = self
            .pending
            .entry(update.item_id.clone())
            .or_insert_with(|| self.root.child_token())
            .clone();
        let sender = self.sender.clone();

        trace!("Scheduling {:?} for {} in {:?}", update.event, update.item_id, delay);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = sender.send(E::from(update));
                }
            }
        });
    }

    /// Cancel everything still pending for `item_id`.
    pub fn release(&mut self, item_id: &ItemId) {
        if let Some(token) = self.pending.remove(item_id) {
            token.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        self.root.cancel();
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<E> Drop for TimerRegistry<E> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::id::BatchId;
    use crate::upload::machine::ItemEvent;
    use tokio::sync::mpsc;

    fn update(item_id: &ItemId, event: ItemEvent) -> ItemUpdate {
        ItemUpdate {
            batch_id: BatchId::generate(),
            item_id: item_id.clone(),
            event,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ItemUpdate>();
        let mut timers = TimerRegistry::new(Handle::current(), tx);
        let id = ItemId::generate();

        timers.schedule(update(&id, ItemEvent::Finished), Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let fired = rx.try_recv().unwrap();
        assert_eq!(fired.item_id, id);
        assert_eq!(fired.event, ItemEvent::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn release_cancels_only_that_item() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ItemUpdate>();
        let mut timers = TimerRegistry::new(Handle::current(), tx);
        let kept = ItemId::generate();
        let released = ItemId::generate();

        timers.schedule(update(&kept, ItemEvent::Accepted), Duration::from_secs(1));
        timers.schedule(update(&released, ItemEvent::Accepted), Duration::from_secs(1));
        timers.release(&released);
        assert_eq!(timers.pending_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap().item_id, kept);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_registry_cancels_everything() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ItemUpdate>();
        let mut timers = TimerRegistry::new(Handle::current(), tx);
        for _ in 0..3 {
            timers.schedule(update(&ItemId::generate(), ItemEvent::Accepted), Duration::from_secs(1));
        }
        drop(timers);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_scheduled_after_cancel_all() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ItemUpdate>();
        let mut timers = TimerRegistry::new(Handle::current(), tx);
        timers.cancel_all();
        timers.schedule(update(&ItemId::generate(), ItemEvent::Accepted), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timers.pending_count(), 0);
    }
}
