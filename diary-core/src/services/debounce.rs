//! Debounce controller
//!
//! Turns a rapidly changing content stream into at most one analysis call
//! per pause in typing. Each edit aborts the armed timer task and arms a
//! new one; a timer that has been aborted never fires. Once a timer fires
//! the request runs in its own task, so later edits never abort a call that
//! has already started.
//!
//! Every arm and every clear bumps a generation; a timer only starts its
//! request if its generation is still current when it wakes. Every fired
//! request carries a sequence number. Completions that are no longer the
//! latest (a newer request fired, or the content dropped below the
//! threshold) are discarded.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{char_count, trimmed_len, AnalysisRequestState, AnalysisView, MoodAnalysis};
use crate::services::analysis::MoodAnalyzer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Upper bound on how long `settle` sleeps between checks
const SETTLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct DebounceSettings {
    pub delay: Duration,
    pub min_chars: usize,
}

impl From<&ClientConfig> for DebounceSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            delay: config.debounce_delay,
            min_chars: config.min_analysis_chars,
        }
    }
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// State shared between the controller and its spawned tasks.
///
/// Both counters only change inside a `watch` send closure, so every
/// check and bump below is serialized by the channel's lock.
struct Shared {
    view: watch::Sender<AnalysisView>,
    /// Generation of the most recent arm or clear
    armed: AtomicU64,
    /// Sequence number of the request whose answer may still be shown
    latest: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        let (view, _) = watch::channel(AnalysisView::default());
        Self {
            view,
            armed: AtomicU64::new(0),
            latest: AtomicU64::new(0),
        }
    }

    /// Enter `PendingDebounce` and return the generation the new timer owns
    fn arm(&self, count: usize) -> u64 {
        let mut generation = 0;
        self.view.send_modify(|view| {
            generation = self.armed.fetch_add(1, Ordering::SeqCst) + 1;
            view.char_count = count;
            view.state = AnalysisRequestState::PendingDebounce;
        });
        generation
    }

    /// Back to `Idle`: disarms any timer and invalidates outstanding requests
    fn clear(&self, count: usize) {
        self.view.send_modify(|view| {
            self.armed.fetch_add(1, Ordering::SeqCst);
            self.latest.fetch_add(1, Ordering::SeqCst);
            view.char_count = count;
            view.state = AnalysisRequestState::Idle;
            view.analysis = None;
        });
    }

    /// Start the request for `generation`, or `None` if a later arm or
    /// clear has superseded it
    fn begin_request(&self, generation: u64) -> Option<u64> {
        let mut seq = None;
        self.view.send_if_modified(|view| {
            if self
                .armed
                .compare_exchange(generation, generation, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                tracing::debug!("Timer generation {} superseded, not firing", generation);
                return false;
            }

            seq = Some(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
            view.state = AnalysisRequestState::InFlight;
            view.in_flight += 1;
            true
        });
        seq
    }

    fn complete(&self, seq: u64, outcome: Result<MoodAnalysis>) {
        self.view.send_modify(|view| {
            view.in_flight = view.in_flight.saturating_sub(1);

            if self.latest.load(Ordering::SeqCst) != seq {
                tracing::debug!("Dropping stale analysis response #{}", seq);
                return;
            }

            match outcome {
                Ok(analysis) => {
                    view.state = AnalysisRequestState::Resolved(analysis.clone());
                    view.analysis = Some(analysis);
                }
                Err(e) => {
                    tracing::debug!("Analysis #{} failed: {}", seq, e);
                    view.state = AnalysisRequestState::Failed;
                    view.analysis = None;
                }
            }
        });
    }
}

pub struct DebounceController<A: MoodAnalyzer> {
    analyzer: Arc<A>,
    settings: DebounceSettings,
    shared: Arc<Shared>,
    pending: Option<JoinHandle<()>>,
}

impl<A: MoodAnalyzer> DebounceController<A> {
    pub fn new(analyzer: Arc<A>, settings: DebounceSettings) -> Self {
        Self {
            analyzer,
            settings,
            shared: Arc::new(Shared::new()),
            pending: None,
        }
    }

    pub fn settings(&self) -> DebounceSettings {
        self.settings
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisView> {
        self.shared.view.subscribe()
    }

    pub fn view(&self) -> AnalysisView {
        self.shared.view.borrow().clone()
    }

    /// Whether a timer is armed and has not fired yet
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Abort the armed timer, if any. Requests already in flight are unaffected.
    pub fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling pending analysis");
            }
            handle.abort();
        }
    }

    /// Wait until no timer is armed and every started request has been
    /// answered, then return the view at that point
    pub async fn settle(&self) -> AnalysisView {
        let mut views = self.subscribe();
        loop {
            {
                // The borrow blocks `begin_request`, so a finished timer has
                // already counted its request in `in_flight`
                let view = views.borrow_and_update();
                if !self.has_pending() && !view.is_loading() {
                    return view.clone();
                }
            }
            let _ = tokio::time::timeout(SETTLE_POLL, views.changed()).await;
        }
    }

    /// Feed the latest editor content. Must be called from within a Tokio runtime.
    pub fn on_change(&mut self, content: &str) {
        self.cancel_pending();

        let count = char_count(content);

        if trimmed_len(content) < self.settings.min_chars {
            self.shared.clear(count);
            return;
        }

        let generation = self.shared.arm(count);

        let shared = Arc::clone(&self.shared);
        let analyzer = Arc::clone(&self.analyzer);
        let delay = self.settings.delay;
        let content = content.to_string();

        tracing::debug!("Analysis armed for {:?}", delay);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(seq) = shared.begin_request(generation) else {
                return;
            };
            tokio::spawn(async move {
                let outcome = analyzer.analyze(&content).await;
                shared.complete(seq, outcome);
            });
        }));
    }
}

impl<A: MoodAnalyzer> Drop for DebounceController<A> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
