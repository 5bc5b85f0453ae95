//! Polling engine: validity gate, staleness control, announcement gating,
//! discovery budget and the handler cycle that composes them.

mod announcer;
mod discovery;
mod driver;
mod handler;
mod staleness;
mod validity;

pub use announcer::*;
pub use discovery::*;
pub use driver::*;
pub use handler::*;
pub use staleness::*;
pub use validity::*;
