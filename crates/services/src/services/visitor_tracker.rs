//! Client-side visitor tracking.
//!
//! A [`VisitorTracker`] turns user interactions into counter increments and
//! keeps a locally displayed count fresh:
//!
//! - an accepted interaction (at most one per throttle window) issues one
//!   increment followed by one refresh, whatever the increment's outcome
//! - a timer refreshes the count every `refresh_interval` so increments from
//!   other sessions show up without local activity
//! - network failures are logged and swallowed; the displayed count simply
//!   stays where it was until the next successful refresh
//!
//! The event loop, the timer and the interaction queue share one
//! [`CancellationToken`]. Disposing the tracker stops all three together.
//! Calls already in flight are allowed to finish but their results are
//! dropped.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::counter_api::CounterApi;

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(1000);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// User activity that counts as a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Click,
    KeyPress,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum spacing between two accepted interactions
    pub throttle: Duration,
    /// Period of the background refresh; the first one fires a full period after attach
    pub refresh_interval: Duration,
    /// Fetch the count once right after attaching
    pub refresh_on_attach: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_on_attach: false,
        }
    }
}

/// Drops events that arrive less than `window` after the last accepted one.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, at: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if at.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(at);
        true
    }
}

/// Shared by the event loop and every detached call it spawns.
#[derive(Clone)]
struct RefreshContext {
    api: Arc<dyn CounterApi>,
    count: Arc<watch::Sender<Option<i64>>>,
    cancel: CancellationToken,
}

impl RefreshContext {
    fn spawn_report(&self) {
        let ctx = self.clone();
        tokio::spawn(async move {
            if ctx.cancel.is_cancelled() {
                return;
            }
            if let Err(e) = ctx.api.increment().await {
                debug!(error = %e, "Visitor increment failed");
            }
            ctx.refresh().await;
        });
    }

    fn spawn_refresh(&self) {
        let ctx = self.clone();
        tokio::spawn(async move {
            ctx.refresh().await;
        });
    }

    async fn refresh(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        match self.api.fetch_count().await {
            Ok(count) if !self.cancel.is_cancelled() => {
                self.count.send_replace(Some(count));
            }
            Ok(count) => trace!(count, "Discarding count fetched after teardown"),
            Err(e) => debug!(error = %e, "Visitor count refresh failed"),
        }
    }
}

/// Handle to an attached tracker. Dropping it detaches the tracker.
pub struct VisitorTracker {
    events: mpsc::UnboundedSender<(Interaction, Instant)>,
    count: watch::Receiver<Option<i64>>,
    cancel: CancellationToken,
}

impl VisitorTracker {
    /// Start tracking. Must be called from within a tokio runtime.
    pub fn attach(api: Arc<dyn CounterApi>, config: TrackerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (count_tx, count_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let ctx = RefreshContext {
            api,
            count: Arc::new(count_tx),
            cancel: cancel.clone(),
        };
        tokio::spawn(run_event_loop(ctx, events_rx, config));

        Self {
            events: events_tx,
            count: count_rx,
            cancel,
        }
    }

    /// Feed one user interaction. Ignored once the tracker is disposed.
    pub fn interact(&self, interaction: Interaction) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.events.send((interaction, Instant::now())).is_err() {
            trace!(?interaction, "Interaction after event loop exit");
        }
    }

    /// Last successfully fetched count, `None` before the first refresh
    pub fn count(&self) -> Option<i64> {
        *self.count.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<i64>> {
        self.count.clone()
    }

    /// Stop the timer and detach interaction handling.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for VisitorTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_event_loop(
    ctx: RefreshContext,
    mut events: mpsc::UnboundedReceiver<(Interaction, Instant)>,
    config: TrackerConfig,
) {
    let mut throttle = Throttle::new(config.throttle);
    let mut ticker = interval_at(
        Instant::now() + config.refresh_interval,
        config.refresh_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        "Visitor tracker attached with throttle {:?}, refresh interval {:?}",
        config.throttle, config.refresh_interval
    );

    if config.refresh_on_attach {
        ctx.spawn_refresh();
    }

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            event = events.recv() => match event {
                Some((interaction, at)) => {
                    if throttle.accept(at) {
                        trace!(?interaction, "Interaction accepted");
                        ctx.spawn_report();
                    } else {
                        trace!(?interaction, "Interaction throttled");
                    }
                }
                None => break,
            },
            _ = ticker.tick() => ctx.spawn_refresh(),
        }
    }

    debug!("Visitor tracker detached");
}
