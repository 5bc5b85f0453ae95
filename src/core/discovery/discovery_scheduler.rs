use tracing::trace;

/// Position of the round-robin over discovery slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryBudget {
    pub slot_index: usize,
    pub total_slots: usize,
}

/// Lets at most one feature per tick run an expensive instance scan.
///
/// The rotation advances exactly once per tick whether or not the slot owner
/// needs discovery, so a starving feature waits at most `total_slots` ticks.
#[derive(Debug, Default)]
pub struct DiscoveryScheduler {
    budget: DiscoveryBudget,
    started: bool,
    /// Ticks still to suppress, not counting the current one
    cooldown: u32,
    suppressed: bool,
}

impl DiscoveryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next slot. Slots are dense and start at 0.
    pub fn register(&mut self) -> usize {
        let slot = self.budget.total_slots;
        self.budget.total_slots += 1;
        slot
    }

    /// Advance the rotation. Called once at the start of every outer tick.
    pub fn begin_tick(&mut self) {
        if self.budget.total_slots == 0 {
            return;
        }

        if self.started {
            self.budget.slot_index = (self.budget.slot_index + 1) % self.budget.total_slots;
        } else {
            self.started = true;
            self.budget.slot_index = 0;
        }

        self.suppressed = self.cooldown > 0;
        if self.suppressed {
            self.cooldown -= 1;
            trace!(remaining = self.cooldown, "discovery cooling down");
        }
    }

    pub fn may_search(
        &self,
        slot: usize,
    ) -> bool {
        self.started && !self.suppressed && slot == self.budget.slot_index && slot < self.budget.total_slots
    }

    /// Suppress every grant for the next `ticks` ticks. An active, longer
    /// cooldown wins.
    pub fn impose_cooldown(
        &mut self,
        ticks: u32,
    ) {
        self.cooldown = self.cooldown.max(ticks);
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }

    pub fn budget(&self) -> DiscoveryBudget {
        self.budget
    }
}
