use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::ForeignAddr;
use crate::ForeignError;
use crate::ForeignGraph;
use crate::ForeignHandle;
use crate::ForeignValue;
use crate::MemoryProbe;

const FIRST_ADDR: usize = 0x1000;
const ADDR_STRIDE: usize = 0x100;

struct SimObject {
    class: String,
    fields: HashMap<String, ForeignValue>,
    live: bool,
}

#[derive(Default)]
struct SimState {
    objects: BTreeMap<ForeignAddr, SimObject>,
    next_addr: usize,
    root: Option<ForeignHandle>,
    failing: HashSet<(ForeignAddr, String)>,
    panicking: HashSet<(ForeignAddr, String)>,
    discovery_fails: bool,
    reads: usize,
    searches: usize,
    safe_points: usize,
}

/// In-memory foreign object graph. Objects can be freed behind the
/// observer's back, single fields can fail or panic, and discovery can be
/// made to fail.
pub struct SimGraph {
    state: Mutex<SimState>,
}

impl Default for SimGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGraph {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_addr: FIRST_ADDR,
                ..Default::default()
            }),
        }
    }

    // A panic injected by `panic_on_field` happens after the guard is
    // dropped, but recover from poisoning anyway.
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn alloc(
        &self,
        class: &str,
    ) -> ForeignHandle {
        let mut state = self.state();
        let addr = state.next_addr;
        state.next_addr += ADDR_STRIDE;
        state.objects.insert(
            ForeignAddr(addr),
            SimObject {
                class: class.to_string(),
                fields: HashMap::new(),
                live: true,
            },
        );
        ForeignHandle::new(addr)
    }

    pub fn set(
        &self,
        handle: ForeignHandle,
        field: &str,
        value: impl Into<ForeignValue>,
    ) {
        let mut state = self.state();
        let object = state
            .objects
            .get_mut(&handle.addr)
            .unwrap_or_else(|| panic!("no object at {}", handle.addr));
        object.fields.insert(field.to_string(), value.into());
    }

    pub fn set_root(
        &self,
        handle: ForeignHandle,
    ) {
        self.state().root = Some(handle);
    }

    /// The foreign runtime destroys the object. Existing handles keep their
    /// address.
    pub fn free(
        &self,
        handle: ForeignHandle,
    ) {
        if let Some(object) = self.state().objects.get_mut(&handle.addr) {
            object.live = false;
        }
    }

    pub fn is_live(
        &self,
        handle: ForeignHandle,
    ) -> bool {
        self.state().objects.get(&handle.addr).is_some_and(|o| o.live)
    }

    pub fn fail_field(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) {
        self.state().failing.insert((handle.addr, field.to_string()));
    }

    pub fn heal_field(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) {
        let mut state = self.state();
        state.failing.remove(&(handle.addr, field.to_string()));
        state.panicking.remove(&(handle.addr, field.to_string()));
    }

    pub fn panic_on_field(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) {
        self.state().panicking.insert((handle.addr, field.to_string()));
    }

    pub fn fail_discovery(
        &self,
        fails: bool,
    ) {
        self.state().discovery_fails = fails;
    }

    pub fn reads(&self) -> usize {
        self.state().reads
    }

    pub fn searches(&self) -> usize {
        self.state().searches
    }

    pub fn safe_points(&self) -> usize {
        self.state().safe_points
    }
}

impl ForeignGraph for SimGraph {
    fn root(&self) -> Result<ForeignHandle, ForeignError> {
        let state = self.state();
        match state.root {
            Some(root) if state.objects.get(&root.addr).is_some_and(|o| o.live) => Ok(root),
            Some(root) => Err(ForeignError::Disposed { addr: root.addr }),
            None => Err(ForeignError::NullHandle),
        }
    }

    fn read(
        &self,
        handle: ForeignHandle,
        field: &str,
    ) -> Result<ForeignValue, ForeignError> {
        if handle.is_null() {
            return Err(ForeignError::NullHandle);
        }

        let key = (handle.addr, field.to_string());
        let mut state = self.state();
        state.reads += 1;

        if state.panicking.contains(&key) {
            drop(state);
            panic!("simulated access violation reading `{}` at {}", field, handle.addr);
        }
        if state.failing.contains(&key) {
            return Err(ForeignError::Unreadable {
                field: field.to_string(),
            });
        }

        match state.objects.get(&handle.addr) {
            Some(object) if object.live => {
                object
                    .fields
                    .get(field)
                    .cloned()
                    .ok_or_else(|| ForeignError::Unreadable {
                        field: field.to_string(),
                    })
            }
            _ => Err(ForeignError::Disposed { addr: handle.addr }),
        }
    }

    fn class_name(
        &self,
        handle: ForeignHandle,
    ) -> Result<String, ForeignError> {
        if handle.is_null() {
            return Err(ForeignError::NullHandle);
        }
        match self.state().objects.get(&handle.addr) {
            Some(object) if object.live => Ok(object.class.clone()),
            _ => Err(ForeignError::Disposed { addr: handle.addr }),
        }
    }

    fn find_instances(
        &self,
        class: &str,
    ) -> Result<Vec<ForeignHandle>, ForeignError> {
        let mut state = self.state();
        state.searches += 1;
        if state.discovery_fails {
            return Err(ForeignError::DiscoveryFailed(format!(
                "simulated scan failure for {}",
                class
            )));
        }
        Ok(state
            .objects
            .iter()
            .filter(|(_, o)| o.live && o.class == class)
            .map(|(addr, _)| ForeignHandle::new(addr.0))
            .collect())
    }

    fn safe_point(&self) {
        self.state().safe_points += 1;
    }
}

impl MemoryProbe for SimGraph {
    fn probe(
        &self,
        addr: ForeignAddr,
    ) -> Result<bool, ForeignError> {
        Ok(self.state().objects.get(&addr).is_some_and(|o| o.live))
    }
}
