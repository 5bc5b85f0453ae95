use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::Announcement;
use super::Feature;
use super::PollContext;
use crate::utils::guard::contain_with_message;
use crate::ChangeAnnouncer;
use crate::FeatureConfig;
use crate::ForeignError;
use crate::ForeignHandle;
use crate::ReadDecision;
use crate::ReadMode;
use crate::Schema;
use crate::StalenessController;
use crate::StalenessState;
use crate::HANDLER_DISABLED_METRIC;
use crate::HANDLER_FAULT_METRIC;
use crate::HANDLER_RELEASE_METRIC;

/// Mutable state of one handler.
#[derive(Clone, Debug, Default)]
pub struct HandlerState {
    pub cached_handle: Option<ForeignHandle>,
    pub last_observed_schema: Schema,
    /// Monotonic within a session
    pub fault_count: u32,
    /// Replaces the configured STALE probe interval when set
    pub probe_interval_override: Option<u32>,
    /// The next read is the first one after binding
    pub first_read_pending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerPhase {
    Unbound,
    Bound,
    /// Staleness ceiling reached
    Stopped,
    /// Fault ceiling reached
    Disabled,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Unbound and nothing to bind
    Idle,
    /// Acquired a handle and captured the first read
    Bound,
    /// Bound, but staleness skipped the read
    Skipped,
    /// Read without an announcement
    Polled,
    /// Read and announced this many lines
    Announced(usize),
    /// Handle failed validation and was dropped
    Released,
    Faulted,
    Stopped,
    Disabled,
}

/// Object-safe face of a handler, as seen by the driver.
pub trait PollTarget {
    fn name(&self) -> &'static str;

    fn needs_discovery(&self) -> bool;

    fn discovery_slot(&self) -> Option<usize>;

    fn assign_discovery_slot(
        &mut self,
        slot: usize,
    );

    fn tick(
        &mut self,
        ctx: &PollContext<'_>,
        announcer: &mut ChangeAnnouncer,
    ) -> TickOutcome;

    fn phase(&self) -> HandlerPhase;

    fn fault_count(&self) -> u32;

    /// Drop the handle and tracked schema. Fault count and a permanent stop
    /// survive.
    fn release(&mut self);

    /// Start over for a new session.
    fn reset_session(&mut self);

    fn collect_review_items(
        &self,
        items: &mut Vec<String>,
    );
}

/// Drives one [`Feature`] through UNBOUND -> BOUND -> ... -> RELEASED.
pub struct FeatureHandler<F: Feature> {
    feature: F,
    config: FeatureConfig,
    state: HandlerState,
    staleness: StalenessController,
    discovery_slot: Option<usize>,
    last_announcement: Option<String>,
    disabled: bool,
}

impl<F: Feature> FeatureHandler<F> {
    pub fn new(
        feature: F,
        config: FeatureConfig,
    ) -> Self {
        let staleness = StalenessController::new(config.staleness.clone());
        Self {
            feature,
            config,
            state: HandlerState::default(),
            staleness,
            discovery_slot: None,
            last_announcement: None,
            disabled: false,
        }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    pub fn state(&self) -> &HandlerState {
        &self.state
    }

    pub fn stale_count(&self) -> u32 {
        self.staleness.stale_count()
    }

    pub fn staleness_state(&self) -> StalenessState {
        self.staleness.state()
    }

    pub fn last_announcement(&self) -> Option<&str> {
        self.last_announcement.as_deref()
    }

    pub fn set_probe_interval_override(
        &mut self,
        interval: Option<u32>,
    ) {
        self.state.probe_interval_override = interval.filter(|i| *i > 0);
    }

    fn tick_inner(
        &mut self,
        ctx: &PollContext<'_>,
        announcer: &mut ChangeAnnouncer,
    ) -> Result<TickOutcome, ForeignError> {
        let (handle, just_bound) = match self.state.cached_handle {
            Some(handle) => {
                let usable = if self.config.probe_on_poll {
                    ctx.gate.is_usable(&handle, true)
                } else {
                    ctx.gate.is_usable_fast(&handle)
                };
                if !usable {
                    debug!("{}: cached handle {} unusable, releasing", self.feature.name(), handle.addr);
                    HANDLER_RELEASE_METRIC.with_label_values(&[self.feature.name()]).inc();
                    self.release_state();
                    return Ok(TickOutcome::Released);
                }
                (handle, false)
            }
            None => match self.bind(ctx) {
                Some(handle) => (handle, true),
                None => return Ok(TickOutcome::Idle),
            },
        };

        let mode = if just_bound {
            ReadMode::Full
        } else {
            match self.staleness.poll(self.state.probe_interval_override) {
                ReadDecision::Read(mode) => mode,
                ReadDecision::Skip => return Ok(TickOutcome::Skipped),
                ReadDecision::Stopped => {
                    warn!(
                        "{}: no change for {} ticks, stopping for this session",
                        self.feature.name(),
                        self.staleness.stale_count()
                    );
                    HANDLER_DISABLED_METRIC
                        .with_label_values(&[self.feature.name(), "stale"])
                        .inc();
                    self.release_state();
                    return Ok(TickOutcome::Stopped);
                }
            }
        };

        let mut current = self.feature.read(ctx, handle, mode)?;
        current.carry_forward(&self.state.last_observed_schema);
        let previous = std::mem::replace(&mut self.state.last_observed_schema, current.clone());

        let announcement = if self.state.first_read_pending {
            self.state.first_read_pending = false;
            trace!("{}: first read {:?}", self.feature.name(), current);
            self.feature.on_first_read(ctx, handle, &current)
        } else {
            self.staleness.observe(current != previous);
            if self.feature.has_changed(&previous, &current) {
                self.feature.describe(ctx, handle, &previous, &current)
            } else {
                None
            }
        };

        let outcome = match announcement {
            Some(announcement) => self.announce(announcement, announcer),
            None => TickOutcome::Polled,
        };

        Ok(match (just_bound, outcome) {
            (true, TickOutcome::Polled) => TickOutcome::Bound,
            (_, outcome) => outcome,
        })
    }

    /// Acquire and validate a handle. Any failure leaves the handler unbound.
    fn bind(
        &mut self,
        ctx: &PollContext<'_>,
    ) -> Option<ForeignHandle> {
        if self.feature.needs_discovery() && !ctx.may_search {
            return None;
        }

        let handle = match self.feature.acquire(ctx) {
            Ok(Some(handle)) => handle,
            Ok(None) => return None,
            Err(e) => {
                trace!("{}: acquire failed: {}", self.feature.name(), e);
                return None;
            }
        };

        if !ctx.gate.is_usable(&handle, true) {
            trace!("{}: acquired handle {} is unusable", self.feature.name(), handle.addr);
            return None;
        }

        debug!("{}: bound to {}", self.feature.name(), handle.addr);
        self.state.cached_handle = Some(handle);
        self.state.last_observed_schema = Schema::new();
        self.state.first_read_pending = true;
        self.staleness.reset();
        Some(handle)
    }

    fn announce(
        &mut self,
        announcement: Announcement,
        announcer: &mut ChangeAnnouncer,
    ) -> TickOutcome {
        if announcement.is_empty() {
            return TickOutcome::Polled;
        }
        let text = announcement.text();
        let lines = text.lines().count();

        info!("{}: {}", self.feature.name(), text);
        if announcement.interrupt {
            announcer.say(&text, true);
        } else {
            announcer.say_queued(&text);
        }
        self.last_announcement = Some(text);
        TickOutcome::Announced(lines)
    }

    fn fault(
        &mut self,
        reason: &str,
    ) -> TickOutcome {
        self.state.fault_count += 1;
        HANDLER_FAULT_METRIC.with_label_values(&[self.feature.name()]).inc();
        error!("{}: FAULT #{}: {}", self.feature.name(), self.state.fault_count, reason);

        self.release_state();

        if self.state.fault_count >= self.config.max_faults {
            self.disabled = true;
            HANDLER_DISABLED_METRIC
                .with_label_values(&[self.feature.name(), "faults"])
                .inc();
            error!(
                "{}: disabled for this session after {} faults",
                self.feature.name(),
                self.state.fault_count
            );
            return TickOutcome::Disabled;
        }
        TickOutcome::Faulted
    }

    fn release_state(&mut self) {
        self.state.cached_handle = None;
        self.state.last_observed_schema = Schema::new();
        self.state.first_read_pending = false;
        self.staleness.reset();
        if let Err(msg) = contain_with_message(|| self.feature.on_release()) {
            warn!("{}: on_release panicked: {}", self.feature.name(), msg);
        }
    }
}

impl<F: Feature> PollTarget for FeatureHandler<F> {
    fn name(&self) -> &'static str {
        self.feature.name()
    }

    fn needs_discovery(&self) -> bool {
        self.feature.needs_discovery()
    }

    fn discovery_slot(&self) -> Option<usize> {
        self.discovery_slot
    }

    fn assign_discovery_slot(
        &mut self,
        slot: usize,
    ) {
        self.discovery_slot = Some(slot);
    }

    fn tick(
        &mut self,
        ctx: &PollContext<'_>,
        announcer: &mut ChangeAnnouncer,
    ) -> TickOutcome {
        if self.disabled {
            return TickOutcome::Disabled;
        }
        if self.staleness.is_stopped() {
            return TickOutcome::Stopped;
        }

        match contain_with_message(|| self.tick_inner(ctx, announcer)) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_transient() => {
                debug!("{}: handle went away: {}", self.feature.name(), e);
                HANDLER_RELEASE_METRIC.with_label_values(&[self.feature.name()]).inc();
                self.release_state();
                TickOutcome::Released
            }
            Ok(Err(e)) => self.fault(&e.to_string()),
            Err(panic) => self.fault(&panic),
        }
    }

    fn phase(&self) -> HandlerPhase {
        if self.disabled {
            HandlerPhase::Disabled
        } else if self.staleness.is_stopped() {
            HandlerPhase::Stopped
        } else if self.state.cached_handle.is_some() {
            HandlerPhase::Bound
        } else {
            HandlerPhase::Unbound
        }
    }

    fn fault_count(&self) -> u32 {
        self.state.fault_count
    }

    fn release(&mut self) {
        self.release_state();
    }

    fn reset_session(&mut self) {
        self.release_state();
        self.state.fault_count = 0;
        self.disabled = false;
        self.staleness.rearm();
    }

    fn collect_review_items(
        &self,
        items: &mut Vec<String>,
    ) {
        if let Some(text) = self.last_announcement.as_deref() {
            if !text.trim().is_empty() {
                items.push(text.to_string());
            }
        }
    }
}
