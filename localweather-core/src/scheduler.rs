//! Recurring refresh timer.

use std::{future::Future, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(6000);

#[derive(Debug)]
enum SchedulerState {
    Idle,
    Active {
        cancel: CancellationToken,
        timer: JoinHandle<()>,
    },
}

/// Fires a callback every `interval` until stopped.
///
/// The first tick comes one full interval after [`start`](Self::start). Each tick's future runs
/// as its own task, so a slow attempt never holds back the next tick. Stopping abandons any
/// attempt still in flight.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    state: SchedulerState,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!("refresh interval of zero requested; using 1ms");
            Duration::from_millis(1)
        } else {
            interval
        };

        Self { interval, state: SchedulerState::Idle }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SchedulerState::Active { .. })
    }

    /// Arm the timer. Returns `false` (and does nothing) if it is already armed.
    ///
    /// Must be called from within a tokio runtime. `on_tick` receives the 1-based tick number.
    pub fn start<F, Fut>(&mut self, mut on_tick: F) -> bool
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_active() {
            tracing::warn!("refresh scheduler already active");
            return false;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.interval;

        let timer = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0u64;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tick += 1;
                tracing::trace!(tick, "refresh tick");

                let attempt = on_tick(tick);
                let token = token.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {}
                        _ = attempt => {}
                    }
                });
            }
        });

        tracing::info!(interval_ms = period.as_millis() as u64, "refresh scheduler started");
        self.state = SchedulerState::Active { cancel, timer };
        true
    }

    /// Cancel the timer and any in-flight attempt. Safe to call more than once.
    pub fn stop(&mut self) {
        if let SchedulerState::Active { cancel, timer } =
            std::mem::replace(&mut self.state, SchedulerState::Idle)
        {
            cancel.cancel();
            timer.abort();
            tracing::info!("refresh scheduler stopped");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    };

    const T: Duration = Duration::from_millis(6000);

    fn counting(scheduler: &mut RefreshScheduler) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = count.clone();
        assert!(scheduler.start(move |_| {
            let ticks = ticks.clone();
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }));
        count
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_each_multiple_of_interval() {
        let mut scheduler = RefreshScheduler::new(T);
        let count = counting(&mut scheduler);

        time::sleep(T / 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        for expected in 1..=4 {
            time::sleep(T).await;
            assert_eq!(count.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let mut scheduler = RefreshScheduler::new(T);
        let count = counting(&mut scheduler);

        time::sleep(T * 2 + T / 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        scheduler.stop();
        assert!(!scheduler.is_active());
        scheduler.stop();

        time::sleep(T * 10).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_timer() {
        let mut scheduler = RefreshScheduler::new(T);
        let count = counting(&mut scheduler);
        drop(scheduler);

        time::sleep(T * 5).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let mut scheduler = RefreshScheduler::new(T);
        let _count = counting(&mut scheduler);

        assert!(!scheduler.start(|_| async {}));
        assert!(scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_does_not_delay_next_tick() {
        let mut scheduler = RefreshScheduler::new(T);
        let started = Arc::new(AtomicU64::new(0));
        let seen = started.clone();

        scheduler.start(move |tick| {
            seen.store(tick, Ordering::SeqCst);
            async move {
                time::sleep(T * 3).await;
            }
        });

        time::sleep(T * 3 + T / 2).await;
        assert_eq!(started.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_abandons_in_flight_attempt() {
        let mut scheduler = RefreshScheduler::new(T);
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();

        scheduler.start(move |_| {
            let done = done.clone();
            async move {
                time::sleep(T / 2).await;
                done.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(T + T / 4).await;
        scheduler.stop();
        time::sleep(T).await;

        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_interval_is_clamped() {
        assert_eq!(RefreshScheduler::new(Duration::ZERO).interval(), Duration::from_millis(1));
    }
}
