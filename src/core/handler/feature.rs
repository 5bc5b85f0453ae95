use super::NameResolver;
use crate::ForeignError;
use crate::ForeignGraph;
use crate::ForeignHandle;
use crate::Localizer;
use crate::ReadMode;
use crate::Schema;
use crate::ValidityGate;

/// Everything a feature may touch during one tick.
pub struct PollContext<'a> {
    pub graph: &'a dyn ForeignGraph,
    pub gate: &'a ValidityGate,
    pub localizer: &'a dyn Localizer,
    pub resolver: &'a dyn NameResolver,
    /// This tick holds the handler's discovery slot
    pub may_search: bool,
}

impl PollContext<'_> {
    pub fn text(
        &self,
        key: &str,
        args: &[String],
    ) -> String {
        self.localizer.get(key, args)
    }
}

/// Text a feature wants spoken. Several lines are spoken as one
/// announcement so the spacing gate cannot split them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub lines: Vec<String>,
    pub interrupt: bool,
}

impl Announcement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            interrupt: true,
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines, interrupt: true }
    }

    pub fn push(
        &mut self,
        line: impl Into<String>,
    ) {
        self.lines.push(line.into());
    }

    pub fn queued(mut self) -> Self {
        self.interrupt = false;
        self
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// Domain knowledge of one feature: where its object lives, which fields
/// matter and what a change sounds like.
///
/// Implementations may return errors or even panic; [`super::FeatureHandler`]
/// decides whether that is a release or a fault.
pub trait Feature {
    fn name(&self) -> &'static str;

    /// Acquisition scans for instances and must wait for a discovery slot.
    fn needs_discovery(&self) -> bool {
        false
    }

    /// Locate the object to bind. `Ok(None)` means "not there right now".
    fn acquire(
        &mut self,
        ctx: &PollContext<'_>,
    ) -> Result<Option<ForeignHandle>, ForeignError>;

    /// Read the schema from a validated handle. Fields that fail
    /// individually should simply be absent.
    fn read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        mode: ReadMode,
    ) -> Result<Schema, ForeignError>;

    /// Feature-specific change rule.
    fn has_changed(
        &self,
        previous: &Schema,
        current: &Schema,
    ) -> bool {
        previous != current
    }

    fn describe(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        previous: &Schema,
        current: &Schema,
    ) -> Option<Announcement>;

    /// The read right after binding is captured silently unless the
    /// feature says otherwise.
    fn on_first_read(
        &mut self,
        _ctx: &PollContext<'_>,
        _handle: ForeignHandle,
        _current: &Schema,
    ) -> Option<Announcement> {
        None
    }

    fn on_release(&mut self) {}
}
