use tracing::info;

use super::OutputSink;
use crate::SinkError;

/// Sink that writes announcements to the log. Used when no speech backend is
/// loaded, and handy when tuning handlers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn is_available(&self) -> bool {
        true
    }

    fn say(
        &self,
        text: &str,
        interrupt: bool,
    ) -> Result<(), SinkError> {
        if interrupt {
            info!(target: "tickwatch::speech", "[SR] {}", text);
        } else {
            info!(target: "tickwatch::speech", "[SR+] {}", text);
        }
        Ok(())
    }

    fn silence(&self) -> Result<(), SinkError> {
        info!(target: "tickwatch::speech", "[SR] <silence>");
        Ok(())
    }
}
