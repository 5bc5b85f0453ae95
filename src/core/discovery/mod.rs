mod discovery_scheduler;
pub use discovery_scheduler::*;
