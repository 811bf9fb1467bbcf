use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MIN_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub name: &'static str,
    pub cadence: Duration,
}

/// A running poll loop. Stopped explicitly or when dropped.
pub struct PollerHandle {
    name: &'static str,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `poll` immediately and then once per cadence until `token` fires.
///
/// A slow poll delays the next one instead of overlapping with it. Cadences
/// below one second are raised to one second.
pub fn spawn_poll<F, Fut>(
    runtime: &Handle,
    schedule: PollSchedule,
    token: CancellationToken,
    mut poll: F,
) -> PollerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let cadence = if schedule.cadence < MIN_CADENCE {
        warn!(
            "{} poller cadence {:?} is too short, using {:?}",
            schedule.name, schedule.cadence, MIN_CADENCE
        );
        MIN_CADENCE
    } else {
        schedule.cadence
    };

    let loop_token = token.clone();
    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = poll() => {}
            }
        }
        debug!("{} poller stopped", schedule.name);
    });

    PollerHandle {
        name: schedule.name,
        token,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::pin::Pin;
    use std::sync::Arc;

    type PollFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn counting(counter: &Arc<AtomicUsize>, work: Duration) -> impl FnMut() -> PollFuture + Send + 'static {
        let counter = counter.clone();
        move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(work).await;
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_cadence() {
        let count = Arc::new(AtomicUsize::new(0));
        let schedule = PollSchedule {
            name: "test",
            cadence: Duration::from_secs(5),
        };
        let _handle = spawn_poll(
            &Handle::current(),
            schedule,
            CancellationToken::new(),
            counting(&count, Duration::ZERO),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_cadence_keeps_polling_once_per_second() {
        let count = Arc::new(AtomicUsize::new(0));
        let schedule = PollSchedule {
            name: "zero",
            cadence: Duration::ZERO,
        };
        let handle = spawn_poll(
            &Handle::current(),
            schedule,
            CancellationToken::new(),
            counting(&count, Duration::ZERO),
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_polls_never_overlap() {
        let count = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let schedule = PollSchedule {
            name: "slow",
            cadence: Duration::from_secs(1),
        };

        let (c, f, m) = (count.clone(), in_flight.clone(), max_seen.clone());
        let _handle = spawn_poll(&Handle::current(), schedule, CancellationToken::new(), move || {
            let (c, f, m) = (c.clone(), f.clone(), m.clone());
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3)).await;
                f.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(count.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_and_drop_end_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let schedule = PollSchedule {
            name: "stopped",
            cadence: Duration::from_secs(1),
        };
        let handle = spawn_poll(
            &Handle::current(),
            schedule,
            CancellationToken::new(),
            counting(&count, Duration::ZERO),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());

        let dropped = spawn_poll(
            &Handle::current(),
            schedule,
            CancellationToken::new(),
            counting(&count, Duration::ZERO),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(dropped);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
