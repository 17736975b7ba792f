use ledgerflow_core::config::deep_merge_value;
use serde_json::Value;
use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Merges bursts of configuration changes into one update.
///
/// Every [`UpdateCoalescer::push`] restarts the quiet period. Once nothing has arrived for that
/// long, [`UpdateCoalescer::take_ready`] hands out the deep-merged options exactly once.
#[derive(Debug, Clone)]
pub struct UpdateCoalescer {
    quiet: Duration,
    pending: Option<Value>,
    last_push: Option<Instant>,
    merged: usize,
}

impl Default for UpdateCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl UpdateCoalescer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_push: None,
            merged: 0,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn push(&mut self, options: &Value, now: Instant) {
        match &mut self.pending {
            Some(pending) => deep_merge_value(pending, options),
            None => self.pending = Some(options.clone()),
        }
        self.last_push = Some(now);
        self.merged += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of requests folded into the pending update.
    pub fn pending_count(&self) -> usize {
        if self.pending.is_some() { self.merged } else { 0 }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match (self.pending.is_some(), self.last_push) {
            (true, Some(last)) => now.saturating_duration_since(last) >= self.quiet,
            _ => false,
        }
    }

    pub fn take_ready(&mut self, now: Instant) -> Option<Value> {
        if self.is_ready(now) { self.take() } else { None }
    }

    /// Releases whatever is pending, ignoring the quiet period.
    pub fn take(&mut self) -> Option<Value> {
        let pending = self.pending.take()?;
        if self.merged > 1 {
            tracing::debug!(requests = self.merged, "coalesced configuration updates");
        }
        self.last_push = None;
        self.merged = 0;
        Some(pending)
    }
}
