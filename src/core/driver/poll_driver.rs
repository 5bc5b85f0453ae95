use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ChangeAnnouncer;
use crate::DiscoveryScheduler;
use crate::ForeignGraph;
use crate::HandlerPhase;
use crate::Localizer;
use crate::MemoryProbe;
use crate::NameResolver;
use crate::NoNameResolver;
use crate::PollConfig;
use crate::PollContext;
use crate::PollTarget;
use crate::SayOutcome;
use crate::StringTable;
use crate::TickOutcome;
use crate::ValidityGate;
use crate::WatchConfig;

/// Shortest pause between two ticks.
const MIN_NAP: Duration = Duration::from_millis(1);

/// Single-threaded poll loop over all feature handlers.
///
/// Everything it owns is touched from one task only. [`PollDriver::run`] is
/// therefore not `Send` and belongs on a current-thread runtime or a
/// `LocalSet`.
pub struct PollDriver {
    graph: Arc<dyn ForeignGraph>,
    gate: ValidityGate,
    localizer: Box<dyn Localizer>,
    resolver: Box<dyn NameResolver>,
    announcer: ChangeAnnouncer,
    scheduler: DiscoveryScheduler,
    handlers: Vec<Box<dyn PollTarget>>,
    poll: PollConfig,
    cooldown_after_release: u32,
    tick_count: u64,
}

impl PollDriver {
    /// Driver with a wrapper/address-only gate, the built-in string table in
    /// the configured language and no name registry.
    pub fn new(
        graph: Arc<dyn ForeignGraph>,
        announcer: ChangeAnnouncer,
        config: &WatchConfig,
    ) -> Self {
        Self {
            graph,
            gate: ValidityGate::without_probe(),
            localizer: Box::new(StringTable::new(config.localization.language)),
            resolver: Box::new(NoNameResolver),
            announcer,
            scheduler: DiscoveryScheduler::new(),
            handlers: Vec::new(),
            poll: config.poll.clone(),
            cooldown_after_release: config.discovery.cooldown_after_release,
            tick_count: 0,
        }
    }

    pub fn with_probe(
        mut self,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        self.gate = ValidityGate::new(Some(probe));
        self
    }

    pub fn with_localizer(
        mut self,
        localizer: Box<dyn Localizer>,
    ) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_resolver(
        mut self,
        resolver: Box<dyn NameResolver>,
    ) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register a handler. Handlers that discover get the next round-robin
    /// slot. Handlers tick in registration order.
    pub fn add_handler(
        &mut self,
        mut handler: Box<dyn PollTarget>,
    ) {
        if handler.needs_discovery() {
            let slot = self.scheduler.register();
            handler.assign_discovery_slot(slot);
            debug!("{}: discovery slot {}", handler.name(), slot);
        }
        self.handlers.push(handler);
    }

    pub fn with_handlers(
        mut self,
        handlers: Vec<Box<dyn PollTarget>>,
    ) -> Self {
        for handler in handlers {
            self.add_handler(handler);
        }
        self
    }

    /// Run one poll cycle. Returns each handler's outcome in registration
    /// order.
    pub fn tick(&mut self) -> Vec<TickOutcome> {
        self.tick_count += 1;
        self.scheduler.begin_tick();

        let mut outcomes = Vec::with_capacity(self.handlers.len());
        let mut lost_handle = false;

        for handler in self.handlers.iter_mut() {
            let may_search = handler
                .discovery_slot()
                .is_some_and(|slot| self.scheduler.may_search(slot));
            let ctx = PollContext {
                graph: self.graph.as_ref(),
                gate: &self.gate,
                localizer: self.localizer.as_ref(),
                resolver: self.resolver.as_ref(),
                may_search,
            };

            let outcome = handler.tick(&ctx, &mut self.announcer);
            if matches!(outcome, TickOutcome::Released | TickOutcome::Faulted) {
                lost_handle = true;
            }
            outcomes.push(outcome);
        }

        if lost_handle && self.cooldown_after_release > 0 {
            debug!(
                "handle lost, no discovery for {} cycles",
                self.cooldown_after_release
            );
            self.scheduler.impose_cooldown(self.cooldown_after_release);
        }

        if self.poll.heartbeat_interval > 0 && self.tick_count % self.poll.heartbeat_interval == 0 {
            self.heartbeat();
        }

        outcomes
    }

    /// Tick every `interval_ms` until `shutdown` fires or its sender is
    /// dropped. Between ticks the foreign runtime gets a safe point every
    /// `sleep_chunk_ms`. A tick that overruns the interval still passes
    /// through one short nap, so shutdown and safe points are never starved.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<()>,
    ) {
        let interval = Duration::from_millis(self.poll.interval_ms);
        let chunk = Duration::from_millis(self.poll.sleep_chunk_ms.max(1));
        info!(
            "poll driver started: {} handlers, every {:?}",
            self.handlers.len(),
            interval
        );

        loop {
            if !matches!(shutdown.has_changed(), Ok(false)) {
                warn!("poll driver: shutdown before tick {}.", self.tick_count + 1);
                return;
            }

            let deadline = Instant::now() + interval;
            self.tick();

            loop {
                let nap = chunk
                    .min(deadline.saturating_duration_since(Instant::now()))
                    .max(MIN_NAP);

                tokio::select! {
                    biased;
                    _ = shutdown.changed() => {
                        warn!("poll driver: shutdown signal received after {} ticks.", self.tick_count);
                        return;
                    }
                    _ = tokio::time::sleep(nap) => {
                        self.graph.safe_point();
                    }
                }

                if Instant::now() >= deadline {
                    break;
                }
            }
        }
    }

    /// Drop every cached handle, e.g. on a scene change.
    pub fn release_all(&mut self) {
        for handler in self.handlers.iter_mut() {
            handler.release();
        }
        self.scheduler.impose_cooldown(self.cooldown_after_release);
    }

    /// New session: clears fault counts, disablement and staleness stops.
    pub fn reset_session(&mut self) {
        info!("poll driver: new session");
        for handler in self.handlers.iter_mut() {
            handler.reset_session();
        }
    }

    /// Last announcements of all handlers, for screen review.
    pub fn review_items(&self) -> Vec<String> {
        let mut items = Vec::new();
        for handler in &self.handlers {
            handler.collect_review_items(&mut items);
        }
        items
    }

    pub fn repeat_last(&mut self) -> Option<SayOutcome> {
        self.announcer.repeat_last()
    }

    pub fn silence(&self) {
        self.announcer.silence();
    }

    pub fn announcer(&self) -> &ChangeAnnouncer {
        &self.announcer
    }

    pub fn handlers(&self) -> &[Box<dyn PollTarget>] {
        &self.handlers
    }

    pub fn scheduler(&self) -> &DiscoveryScheduler {
        &self.scheduler
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn heartbeat(&self) {
        let count = |phase: HandlerPhase| self.handlers.iter().filter(|h| h.phase() == phase).count();
        info!(
            "heartbeat: tick={} bound={} unbound={} stopped={} disabled={} sink_available={}",
            self.tick_count,
            count(HandlerPhase::Bound),
            count(HandlerPhase::Unbound),
            count(HandlerPhase::Stopped),
            count(HandlerPhase::Disabled),
            self.announcer.is_sink_available()
        );
    }
}
