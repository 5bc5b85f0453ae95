//! Speech/braille output seam.

mod tracing_sink;
pub use tracing_sink::*;


#[cfg(test)]
use mockall::automock;

use crate::SinkError;

/// Output backend consumed by the announcer. May be unavailable at any time;
/// nothing in the polling logic depends on it succeeding.
#[cfg_attr(test, automock)]
pub trait OutputSink {
    fn is_available(&self) -> bool;

    fn say(
        &self,
        text: &str,
        interrupt: bool,
    ) -> Result<(), SinkError>;

    fn say_queued(
        &self,
        text: &str,
    ) -> Result<(), SinkError> {
        self.say(text, false)
    }

    fn silence(&self) -> Result<(), SinkError>;
}
