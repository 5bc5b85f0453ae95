use tracing::trace;

use crate::extract_schema;
use crate::utils::guard::contain;
use crate::utils::text::clean_rich_text;
use crate::Announcement;
use crate::Feature;
use crate::FieldKind;
use crate::FieldSpec;
use crate::ForeignError;
use crate::ForeignGraphExt;
use crate::ForeignHandle;
use crate::PollContext;
use crate::ReadMode;
use crate::Schema;

const CURSOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("active", &["gameObject", "activeInHierarchy"], FieldKind::Bool),
    FieldSpec::new("cursor", &["currentCursorIndex"], FieldKind::Int),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportKind {
    Attack,
    Defence,
}

impl SupportKind {
    pub fn class(&self) -> &'static str {
        match self {
            SupportKind::Attack => "AttackSupporterListUIHandler",
            SupportKind::Defence => "DefenceSupporterListUIHandler",
        }
    }

    fn feature_name(&self) -> &'static str {
        match self {
            SupportKind::Attack => "attack_support",
            SupportKind::Defence => "defence_support",
        }
    }

    fn title_key(&self) -> &'static str {
        match self {
            SupportKind::Attack => "support_attack_screen",
            SupportKind::Defence => "support_defence_screen",
        }
    }
}

/// Support unit selection before a battle. The list objects are not reachable
/// from the root, so they are found by instance scan.
#[derive(Debug)]
pub struct SupporterCursor {
    kind: SupportKind,
}

impl SupporterCursor {
    pub fn new(kind: SupportKind) -> Self {
        Self { kind }
    }

    pub fn attack() -> Self {
        Self::new(SupportKind::Attack)
    }

    pub fn defence() -> Self {
        Self::new(SupportKind::Defence)
    }

    pub fn kind(&self) -> SupportKind {
        self.kind
    }

    fn is_active(schema: &Schema) -> bool {
        schema.flag("active") == Some(true)
    }

    /// Label of the button under the cursor, or a generic name for it.
    fn cursor_label(
        &self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        cursor: i64,
    ) -> String {
        let label = match contain(|| button_label(ctx, handle, cursor)) {
            Some(Ok(label)) => label,
            Some(Err(e)) => {
                trace!("{}: button {} unreadable: {}", self.kind.feature_name(), cursor, e);
                None
            }
            None => None,
        };
        if let Some(label) = label {
            return label;
        }

        match (self.kind, cursor) {
            (_, 0) => ctx.text("support_none", &[]),
            (SupportKind::Attack, 1) => ctx.text("support_double_attack", &[]),
            _ => ctx.text("support_numbered", &[cursor.to_string()]),
        }
    }
}

/// Longest non-blank text among the button's text components.
fn button_label(
    ctx: &PollContext<'_>,
    list: ForeignHandle,
    cursor: i64,
) -> Result<Option<String>, ForeignError> {
    let buttons = ctx.graph.read_list(list, "supporterButtonList")?;
    let Some(button) = usize::try_from(cursor).ok().and_then(|i| buttons.get(i).copied()) else {
        return Ok(None);
    };
    if button.is_null() {
        return Ok(None);
    }

    let texts = ctx
        .graph
        .navigate(button, &["gameObject"])
        .and_then(|go| ctx.graph.read_list(go, "textComponents"))?;

    let best = texts
        .into_iter()
        .filter(|t| !t.is_null())
        .filter_map(|t| ctx.graph.read_text(t, "text").ok())
        .map(|t| clean_rich_text(&t))
        .filter(|t| !t.is_empty())
        .max_by_key(|t| t.chars().count());
    Ok(best)
}

impl Feature for SupporterCursor {
    fn name(&self) -> &'static str {
        self.kind.feature_name()
    }

    fn needs_discovery(&self) -> bool {
        true
    }

    fn acquire(
        &mut self,
        ctx: &PollContext<'_>,
    ) -> Result<Option<ForeignHandle>, ForeignError> {
        Ok(ctx
            .graph
            .find_instances(self.kind.class())?
            .into_iter()
            .find(|h| !h.is_null()))
    }

    fn read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        _mode: ReadMode,
    ) -> Result<Schema, ForeignError> {
        extract_schema(ctx.graph, handle, CURSOR_FIELDS)
    }

    /// The list opened or closed, or the cursor moved while it is open.
    fn has_changed(
        &self,
        previous: &Schema,
        current: &Schema,
    ) -> bool {
        let active = Self::is_active(current);
        active != Self::is_active(previous) || (active && previous.int("cursor") != current.int("cursor"))
    }

    fn describe(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        previous: &Schema,
        current: &Schema,
    ) -> Option<Announcement> {
        if !Self::is_active(current) {
            return None;
        }
        let cursor = current.int("cursor")?;

        let mut lines = Vec::new();
        let opened = !Self::is_active(previous);
        if opened {
            lines.push(ctx.text(self.kind.title_key(), &[]));
        }
        if opened || previous.int("cursor") != Some(cursor) {
            lines.push(self.cursor_label(ctx, handle, cursor));
        }
        Some(Announcement::from_lines(lines))
    }

    /// A list that is already open when found gets its title announced.
    fn on_first_read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        current: &Schema,
    ) -> Option<Announcement> {
        self.describe(ctx, handle, &Schema::new(), current)
    }
}
