use tracing::trace;

use crate::StalenessConfig;

/// Upper bound of the stale counter on handlers that never reach a permanent
/// stop. The read schedule runs on its own phase and keeps cycling past it.
const STALE_COUNT_CEILING: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StalenessState {
    Fresh,
    Stale,
    DeepStale,
    PermanentStop,
}

/// How much of the schema a read should touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Every schema field
    Full,
    /// Only the fields that detect a change, while stale
    StaleProbe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadDecision {
    Read(ReadMode),
    /// No foreign access this tick
    Skip,
    /// Terminal: no foreign access for the rest of the session
    Stopped,
}

/// Adaptive polling frequency of one handler.
///
/// The counter grows by one per unchanged read while fresh and by one per
/// tick once stale. Ticks that are skipped never reset it.
#[derive(Clone, Debug)]
pub struct StalenessController {
    config: StalenessConfig,
    stale_count: u32,
    /// Position inside the current read interval, 0 = read
    read_phase: u32,
    /// Interval `read_phase` counts against, 0 = resync from `stale_count`
    phase_interval: u32,
    stopped: bool,
}

impl StalenessController {
    pub fn new(config: StalenessConfig) -> Self {
        Self {
            config,
            stale_count: 0,
            read_phase: 0,
            phase_interval: 0,
            stopped: false,
        }
    }

    pub fn state(&self) -> StalenessState {
        if self.stopped {
            return StalenessState::PermanentStop;
        }
        if matches!(self.config.deep_stale_limit, Some(deep) if self.stale_count >= deep) {
            return StalenessState::DeepStale;
        }
        if self.stale_count >= self.config.stale_limit {
            return StalenessState::Stale;
        }
        StalenessState::Fresh
    }

    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn config(&self) -> &StalenessConfig {
        &self.config
    }

    /// Decide whether this tick may touch foreign memory.
    ///
    /// `probe_interval_override` replaces the configured STALE interval for
    /// handlers that adjust it at runtime.
    pub fn poll(
        &mut self,
        probe_interval_override: Option<u32>,
    ) -> ReadDecision {
        match self.state() {
            StalenessState::PermanentStop => ReadDecision::Stopped,
            StalenessState::Fresh => ReadDecision::Read(ReadMode::Full),
            state @ (StalenessState::Stale | StalenessState::DeepStale) => {
                let interval = match state {
                    StalenessState::DeepStale => self.config.deep_probe_interval,
                    _ => probe_interval_override.unwrap_or(self.config.probe_interval),
                }
                .max(1);
                if interval != self.phase_interval {
                    self.phase_interval = interval;
                    self.read_phase = self.stale_count % interval;
                }

                self.stale_count = self.stale_count.saturating_add(1).min(STALE_COUNT_CEILING);
                self.read_phase = (self.read_phase + 1) % interval;

                if matches!(self.config.permanent_stop, Some(stop) if self.stale_count >= stop) {
                    self.stopped = true;
                    return ReadDecision::Stopped;
                }

                if self.read_phase == 0 {
                    ReadDecision::Read(ReadMode::StaleProbe)
                } else {
                    ReadDecision::Skip
                }
            }
        }
    }

    /// Record the outcome of a read. A change returns the machine to FRESH.
    pub fn observe(
        &mut self,
        changed: bool,
    ) {
        if self.stopped {
            return;
        }
        if changed {
            if self.stale_count > 0 {
                trace!(stale_count = self.stale_count, "schema changed, back to fresh");
            }
            self.stale_count = 0;
            self.phase_interval = 0;
            return;
        }
        if self.state() == StalenessState::Fresh {
            self.stale_count += 1;
            self.phase_interval = 0;
        }
    }

    /// Clear the counter. A permanent stop survives.
    pub fn reset(&mut self) {
        self.stale_count = 0;
        self.phase_interval = 0;
    }

    pub fn force_stop(&mut self) {
        self.stopped = true;
    }

    /// Leave PERMANENT_STOP. Only a new session does this.
    pub fn rearm(&mut self) {
        self.stopped = false;
        self.stale_count = 0;
        self.phase_interval = 0;
    }
}
