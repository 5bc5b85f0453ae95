use tracing::debug;
use tracing::trace;

use crate::extract_schema;
use crate::resolve_display_name;
use crate::utils::guard::contain;
use crate::Announcement;
use crate::Feature;
use crate::FieldKind;
use crate::FieldSpec;
use crate::ForeignError;
use crate::ForeignGraph;
use crate::ForeignGraphExt;
use crate::ForeignHandle;
use crate::PollContext;
use crate::Primitive;
use crate::ReadMode;
use crate::Schema;

/// `root -> gameStateHandler -> currentState`
pub const GAME_STATE_PATH: &[&str] = &["gameStateHandler", "currentState"];
pub const TACTICAL_STATE_CLASS: &str = "TacticalPartState";

const RESULT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("gain_exp", &["actionResultValue", "GainExp"], FieldKind::Int),
    FieldSpec::new("gain_score", &["actionResultValue", "GainScore"], FieldKind::Int),
    FieldSpec::new("gain_capital", &["actionResultValue", "GainCapital"], FieldKind::Int),
    FieldSpec::new("pilot_id", &["actionResultValue", "PilotReferenceId"], FieldKind::Text),
    FieldSpec::new("before_level", &["actionResultValue", "BeforeLevel"], FieldKind::Int),
    FieldSpec::new("is_level_up", &["actionResultValue", "IsUppedLevel"], FieldKind::Bool),
];

/// Experience, score and credits after a tactical-map battle, plus one line
/// per pilot that levelled up.
#[derive(Debug, Default)]
pub struct BattleResult;

impl BattleResult {
    pub fn new() -> Self {
        Self
    }

    /// What an unbound handler has "seen": no experience, no pilot.
    pub fn unbound_schema() -> Schema {
        Schema::new()
            .with("gain_exp", Primitive::Int(-1))
            .with("pilot_id", Primitive::Text(String::new()))
    }

    fn current_state(graph: &dyn ForeignGraph) -> Result<ForeignHandle, ForeignError> {
        graph.navigate(graph.root()?, GAME_STATE_PATH)
    }

    fn level_up_lines(
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
    ) -> Vec<String> {
        let entries = match ctx
            .graph
            .navigate(handle, &["actionResultValue"])
            .and_then(|result| ctx.graph.read_list(result, "levelUpUIValues"))
        {
            Ok(entries) => entries,
            Err(e) => {
                debug!("battle_result: level-up list unreadable: {}", e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter(|entry| !entry.is_null())
            .filter_map(|entry| match contain(|| Self::level_up_line(ctx, entry)) {
                Some(Ok(line)) => Some(line),
                Some(Err(e)) => {
                    trace!("battle_result: level-up entry skipped: {}", e);
                    None
                }
                None => None,
            })
            .collect()
    }

    fn level_up_line(
        ctx: &PollContext<'_>,
        entry: ForeignHandle,
    ) -> Result<String, ForeignError> {
        let pilot_id = ctx.graph.read_text(entry, "PilotReferenceId")?;
        let before = ctx.graph.read_int(entry, "BeforeLevel")?;
        let now = ctx.graph.read_int(entry, "NowLevel")?;
        Ok(ctx.text(
            "result_level_up",
            &[
                resolve_display_name(ctx.resolver, &pilot_id),
                before.to_string(),
                now.to_string(),
            ],
        ))
    }
}

impl Feature for BattleResult {
    fn name(&self) -> &'static str {
        "battle_result"
    }

    fn acquire(
        &mut self,
        ctx: &PollContext<'_>,
    ) -> Result<Option<ForeignHandle>, ForeignError> {
        let state = Self::current_state(ctx.graph)?;
        Ok(ctx.graph.classify(state, TACTICAL_STATE_CLASS).typed())
    }

    /// All six fields live on one object, so stale probes read them all.
    fn read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        _mode: ReadMode,
    ) -> Result<Schema, ForeignError> {
        // The game swaps state objects without freeing the old one.
        let state = Self::current_state(ctx.graph)?;
        if state != handle {
            return Err(ForeignError::TypeMismatch {
                expected: TACTICAL_STATE_CLASS.to_string(),
                found: ctx.graph.class_name(state).unwrap_or_default(),
            });
        }
        extract_schema(ctx.graph, handle, RESULT_FIELDS)
    }

    /// A new result has positive experience and differs from the last one
    /// in experience or pilot.
    fn has_changed(
        &self,
        previous: &Schema,
        current: &Schema,
    ) -> bool {
        let Some(exp) = current.int("gain_exp") else {
            return false;
        };
        let pilot = current.text("pilot_id").unwrap_or_default();
        exp > 0 && (Some(exp) != previous.int("gain_exp") || Some(pilot) != previous.text("pilot_id"))
    }

    fn describe(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        _previous: &Schema,
        current: &Schema,
    ) -> Option<Announcement> {
        let int = |name: &str| current.int(name).unwrap_or(0).to_string();
        let pilot_id = current.text("pilot_id").unwrap_or_default();

        let mut announcement = Announcement::new(ctx.text(
            "result_battle",
            &[
                resolve_display_name(ctx.resolver, pilot_id),
                int("before_level"),
                int("gain_exp"),
                int("gain_score"),
                int("gain_capital"),
            ],
        ));
        if current.flag("is_level_up") == Some(true) {
            for line in Self::level_up_lines(ctx, handle) {
                announcement.push(line);
            }
        }
        Some(announcement)
    }

    /// A result that is already on screen when the handler binds is still
    /// new to the player.
    fn on_first_read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        current: &Schema,
    ) -> Option<Announcement> {
        let unbound = Self::unbound_schema();
        if self.has_changed(&unbound, current) {
            self.describe(ctx, handle, &unbound, current)
        } else {
            None
        }
    }
}
