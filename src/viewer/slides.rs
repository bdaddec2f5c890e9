//! Timed slide rotation for the hero carousel.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const SLIDE_INTERVAL: Duration = Duration::from_millis(5000);

/// The slide on screen and whether its image has finished loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub index: usize,
    pub loaded: bool,
}

/// Advances a wrapping index once per period until cancelled or dropped.
///
/// Must be started inside a tokio runtime.
pub struct SlideAdvancer {
    len: usize,
    slide: Arc<watch::Sender<Slide>>,
    cancel: CancellationToken,
}

impl SlideAdvancer {
    /// `None` for an empty carousel: no timer is started.
    pub fn start(len: usize, period: Duration) -> Option<Self> {
        if len == 0 {
            return None;
        }

        let (tx, _) = watch::channel(Slide {
            index: 0,
            loaded: false,
        });
        let slide = Arc::new(tx);
        let cancel = CancellationToken::new();

        tokio::spawn(run(len, period, Arc::clone(&slide), cancel.clone()));

        Some(Self { len, slide, cancel })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> Slide {
        *self.slide.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Slide> {
        self.slide.subscribe()
    }

    /// Jump to `index` (wrapped). The rotation cadence is left alone.
    pub fn select(&self, index: usize) {
        let index = index % self.len;
        self.slide.send_modify(|slide| {
            slide.index = index;
            slide.loaded = false;
        });
    }

    /// The current slide's image finished loading.
    pub fn mark_loaded(&self) {
        self.slide.send_if_modified(|slide| !std::mem::replace(&mut slide.loaded, true));
    }

    /// Stop rotating. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SlideAdvancer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    len: usize,
    period: Duration,
    slide: Arc<watch::Sender<Slide>>,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                slide.send_modify(|s| {
                    s.index = (s.index + 1) % len;
                    s.loaded = false;
                });
            }
        }
    }
    tracing::debug!("Slide rotation stopped");
}
