use std::sync::Arc;

use tracing::trace;

use crate::utils::guard::contain;
use crate::ForeignHandle;
use crate::MemoryProbe;

/// Decides whether a foreign handle is currently safe to dereference.
///
/// Pure query: no state, and nothing raised inside a probe ever leaves
/// [`ValidityGate::is_usable`].
#[derive(Clone, Default)]
pub struct ValidityGate {
    probe: Option<Arc<dyn MemoryProbe>>,
}

impl ValidityGate {
    pub fn new(probe: Option<Arc<dyn MemoryProbe>>) -> Self {
        Self { probe }
    }

    /// Gate without a live-ness probe: only wrapper and address are checked.
    pub fn without_probe() -> Self {
        Self { probe: None }
    }

    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// `probe = true` additionally asks the foreign side whether the address
    /// is still live, when that capability exists. A failing or panicking
    /// probe means unusable.
    pub fn is_usable(
        &self,
        handle: &ForeignHandle,
        probe: bool,
    ) -> bool {
        if !self.is_usable_fast(handle) {
            return false;
        }
        if !probe {
            return true;
        }
        let Some(prober) = &self.probe else {
            return true;
        };

        match contain(|| prober.probe(handle.addr)) {
            Some(Ok(true)) => true,
            Some(Ok(false)) => {
                trace!(addr = %handle.addr, "probe reports object gone");
                false
            }
            Some(Err(e)) => {
                trace!(addr = %handle.addr, error = %e, "probe failed");
                false
            }
            None => {
                trace!(addr = %handle.addr, "probe panicked");
                false
            }
        }
    }

    /// Hot-path variant: wrapper and address only. The caller accepts the
    /// residual risk of a freed object at a non-null address.
    pub fn is_usable_fast(
        &self,
        handle: &ForeignHandle,
    ) -> bool {
        !handle.is_null()
    }

    /// Convenience for optional cached handles.
    pub fn check(
        &self,
        handle: Option<&ForeignHandle>,
        probe: bool,
    ) -> bool {
        handle.is_some_and(|h| self.is_usable(h, probe))
    }
}

impl std::fmt::Debug for ValidityGate {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ValidityGate").field("has_probe", &self.has_probe()).finish()
    }
}
