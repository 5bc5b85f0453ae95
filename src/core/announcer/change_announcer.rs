use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::utils::guard::contain;
use crate::AnnouncerConfig;
use crate::OutputSink;
use crate::SinkError;
use crate::ANNOUNCEMENT_METRIC;

const SECOND: Duration = Duration::from_secs(1);

/// What happened to one `say` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SayOutcome {
    /// Accepted and forwarded (or bookkept when the sink is away)
    Spoken,
    Empty,
    /// Same text inside the dedup window
    Deduplicated,
    /// Inside the minimum spacing of the previous accepted call
    TooSoon,
    /// Per-second cap reached
    RateLimited,
}

impl SayOutcome {
    pub fn is_spoken(&self) -> bool {
        matches!(self, SayOutcome::Spoken)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SayOutcome::Spoken => "spoken",
            SayOutcome::Empty => "empty",
            SayOutcome::Deduplicated => "deduplicated",
            SayOutcome::TooSoon => "too_soon",
            SayOutcome::RateLimited => "rate_limited",
        }
    }
}

/// Process-wide bookkeeping of accepted announcements. Only ever moved forward
/// by [`ChangeAnnouncer`].
#[derive(Clone, Debug, Default)]
pub struct AnnouncementRecord {
    pub last_text: Option<String>,
    pub last_timestamp: Option<Instant>,
    pub last_call_timestamp: Option<Instant>,
    pub calls_this_second: u32,
    pub second_window_start: Option<Instant>,
}

/// Deduplicating, rate-limited front of the output sink.
pub struct ChangeAnnouncer {
    sink: Box<dyn OutputSink>,
    dedup_window: Duration,
    min_call_interval: Duration,
    max_calls_per_second: u32,
    record: AnnouncementRecord,
}

impl ChangeAnnouncer {
    pub fn new(
        sink: Box<dyn OutputSink>,
        config: &AnnouncerConfig,
    ) -> Self {
        Self {
            sink,
            dedup_window: config.dedup_window(),
            min_call_interval: config.min_call_interval(),
            max_calls_per_second: config.max_calls_per_second,
            record: AnnouncementRecord::default(),
        }
    }

    /// Announce `text`, cutting off whatever the sink is currently saying
    /// when `interrupt` is set.
    pub fn say(
        &mut self,
        text: &str,
        interrupt: bool,
    ) -> SayOutcome {
        let outcome = self.admit(text);
        if outcome.is_spoken() {
            self.forward(text, Some(interrupt));
        }
        ANNOUNCEMENT_METRIC.with_label_values(&[outcome.as_str()]).inc();
        outcome
    }

    /// Announce after whatever is already being spoken.
    pub fn say_queued(
        &mut self,
        text: &str,
    ) -> SayOutcome {
        let outcome = self.admit(text);
        if outcome.is_spoken() {
            self.forward(text, None);
        }
        ANNOUNCEMENT_METRIC.with_label_values(&[outcome.as_str()]).inc();
        outcome
    }

    /// Say the last accepted announcement again. Same gates as [`Self::say`].
    pub fn repeat_last(&mut self) -> Option<SayOutcome> {
        let text = self.record.last_text.clone()?;
        Some(self.say(&text, true))
    }

    pub fn silence(&self) {
        match contain(|| self.sink.silence()) {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("silence failed: {}", e),
            None => warn!("silence panicked"),
        }
    }

    pub fn last_announcement(&self) -> Option<&str> {
        self.record.last_text.as_deref()
    }

    pub fn record(&self) -> &AnnouncementRecord {
        &self.record
    }

    pub fn is_sink_available(&self) -> bool {
        contain(|| self.sink.is_available()).unwrap_or(false)
    }

    /// Run the gates and, on acceptance, move the record forward.
    fn admit(
        &mut self,
        text: &str,
    ) -> SayOutcome {
        if text.is_empty() {
            return SayOutcome::Empty;
        }

        let now = Instant::now();
        let record = &mut self.record;

        if record.last_text.as_deref() == Some(text) {
            if let Some(at) = record.last_timestamp {
                if now.saturating_duration_since(at) < self.dedup_window {
                    debug!("dedup: {}", text);
                    return SayOutcome::Deduplicated;
                }
            }
        }

        if let Some(at) = record.last_call_timestamp {
            if now.saturating_duration_since(at) < self.min_call_interval {
                debug!("too soon, dropped: {}", text);
                return SayOutcome::TooSoon;
            }
        }

        match record.second_window_start {
            Some(start) if now.saturating_duration_since(start) < SECOND => {}
            _ => {
                record.second_window_start = Some(now);
                record.calls_this_second = 0;
            }
        }
        if record.calls_this_second >= self.max_calls_per_second {
            debug!(
                "rate limited ({} calls this second), dropped: {}",
                record.calls_this_second, text
            );
            return SayOutcome::RateLimited;
        }

        record.calls_this_second += 1;
        record.last_call_timestamp = Some(now);
        record.last_timestamp = Some(now);
        record.last_text = Some(text.to_string());
        SayOutcome::Spoken
    }

    /// `interrupt = None` queues. Failures end here.
    fn forward(
        &self,
        text: &str,
        interrupt: Option<bool>,
    ) {
        if !self.is_sink_available() {
            debug!("sink unavailable, not spoken: {}", text);
            return;
        }

        let result = contain(|| match interrupt {
            Some(interrupt) => self.sink.say(text, interrupt),
            None => self.sink.say_queued(text),
        })
        .unwrap_or_else(|| Err(SinkError::Backend("sink panicked".into())));

        match result {
            Ok(()) => debug!("[SR] {}", text),
            Err(e) => warn!("output sink failed for {:?}: {}", text, e),
        }
    }
}

impl std::fmt::Debug for ChangeAnnouncer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChangeAnnouncer")
            .field("dedup_window", &self.dedup_window)
            .field("min_call_interval", &self.min_call_interval)
            .field("max_calls_per_second", &self.max_calls_per_second)
            .field("record", &self.record)
            .finish()
    }
}
