//! Startup sequence and held weather state.

use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::watch;

use crate::{
    error::WeatherFetchError,
    location::{LocationSource, PositionResolver, Resolution},
    model::{Coordinate, WeatherSnapshot, WeatherState},
    notify::{Notice, Notifier},
    provider::WeatherProvider,
    scheduler::RefreshScheduler,
};

#[derive(Debug, Default)]
struct Held {
    coordinate: Option<Coordinate>,
    applied_seq: u64,
    disposed: bool,
}

/// State shared between the controller and its timer ticks.
struct Shared {
    provider: Arc<dyn WeatherProvider>,
    held: Mutex<Held>,
    next_seq: AtomicU64,
    state: watch::Sender<WeatherState>,
}

impl Shared {
    /// Fetch for the held coordinate and publish the result if it is still the newest.
    ///
    /// `Ok(false)` means nothing was applied: no coordinate yet, a newer result already landed,
    /// or the controller was disposed.
    async fn refresh(&self) -> Result<bool, WeatherFetchError> {
        let coordinate = {
            let held = self.held.lock();
            if held.disposed {
                return Ok(false);
            }
            held.coordinate
        };
        let Some(coordinate) = coordinate else {
            return Ok(false);
        };
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = self.provider.fetch(coordinate).await?;
        Ok(self.publish(seq, snapshot))
    }

    fn publish(&self, seq: u64, snapshot: WeatherSnapshot) -> bool {
        // The disposed flag is only written under this lock, so nothing lands after dispose.
        let mut held = self.held.lock();
        if held.disposed {
            tracing::debug!(seq, "discarding weather result after dispose");
            return false;
        }
        if seq <= held.applied_seq {
            tracing::debug!(seq, applied = held.applied_seq, "discarding stale weather result");
            return false;
        }
        held.applied_seq = seq;
        self.state.send_replace(WeatherState::Ready(Arc::new(snapshot)));
        true
    }

    fn is_disposed(&self) -> bool {
        self.held.lock().disposed
    }

    /// Returns `true` the first time.
    fn dispose(&self) -> bool {
        let mut held = self.held.lock();
        !std::mem::replace(&mut held.disposed, true)
    }

    async fn refresh_logged(&self) {
        match self.refresh().await {
            Ok(true) => tracing::debug!("weather snapshot updated"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "weather fetch failed; keeping previous snapshot"),
        }
    }
}

/// Composition root: resolves a position, fetches weather for it and keeps it fresh.
pub struct LocationWeatherController<S> {
    resolver: PositionResolver<S>,
    notifier: Arc<dyn Notifier>,
    scheduler: RefreshScheduler,
    shared: Arc<Shared>,
    started: bool,
}

impl<S: LocationSource> LocationWeatherController<S> {
    pub fn new(
        resolver: PositionResolver<S>,
        provider: Arc<dyn WeatherProvider>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WeatherState::Loading);

        Self {
            resolver,
            notifier,
            scheduler: RefreshScheduler::new(interval),
            shared: Arc::new(Shared {
                provider,
                held: Mutex::new(Held::default()),
                next_seq: AtomicU64::new(0),
                state,
            }),
            started: false,
        }
    }

    /// Resolve, fetch once, then arm the refresh timer.
    ///
    /// Never fails: a missing geolocation capability ends in [`WeatherState::Unavailable`],
    /// a failed first fetch leaves [`WeatherState::Loading`] until a tick succeeds.
    pub async fn start(&mut self) -> WeatherState {
        if self.started || self.shared.is_disposed() {
            tracing::warn!("controller already started or disposed");
            return self.state();
        }
        self.started = true;

        let coordinate = match self.resolver.resolve().await {
            Ok(Resolution::Located(coordinate)) => coordinate,
            Ok(Resolution::Fallback { coordinate, .. }) => {
                self.notifier.notify(Notice::LocationFallbackUsed);
                coordinate
            }
            Err(e) => {
                tracing::warn!(error = %e, "no position; weather will not be fetched");
                self.notifier.notify(Notice::LocationUnavailable);
                self.shared.state.send_replace(WeatherState::Unavailable);
                return WeatherState::Unavailable;
            }
        };

        self.shared.held.lock().coordinate = Some(coordinate);
        self.shared.refresh_logged().await;

        let shared = self.shared.clone();
        self.scheduler.start(move |_tick| {
            let shared = shared.clone();
            async move { shared.refresh_logged().await }
        });

        self.state()
    }

    pub fn state(&self) -> WeatherState {
        self.shared.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<WeatherSnapshot>> {
        self.shared.state.borrow().snapshot().cloned()
    }

    /// Follow state changes. The receiver sees the current state immediately.
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.shared.state.subscribe()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.shared.held.lock().coordinate
    }

    /// Change the coordinate later ticks fetch for. Does not fetch by itself.
    pub fn set_coordinate(&self, coordinate: Coordinate) {
        self.shared.held.lock().coordinate = Some(coordinate);
    }

    /// Fetch immediately outside the timer. A disposed controller does nothing.
    pub async fn refresh_now(&self) -> Result<bool, WeatherFetchError> {
        self.shared.refresh().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Stop refreshing. Results still in flight are discarded. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.shared.dispose() {
            tracing::info!("disposing location weather controller");
        }
        self.scheduler.stop();
    }
}

impl<S> Drop for LocationWeatherController<S> {
    fn drop(&mut self) {
        self.shared.dispose();
        self.scheduler.stop();
    }
}
