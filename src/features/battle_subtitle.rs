use crate::extract_schema;
use crate::utils::text::clean_rich_text;
use crate::Announcement;
use crate::Feature;
use crate::FieldKind;
use crate::FieldSpec;
use crate::ForeignError;
use crate::ForeignHandle;
use crate::PollContext;
use crate::Primitive;
use crate::ReadMode;
use crate::Schema;

pub const BATTLE_SCENE_CLASS: &str = "BattleSceneUI";

const DIALOG: FieldSpec = FieldSpec::new("dialog", &["dialogText", "text"], FieldKind::Text);
const SPEAKER: FieldSpec = FieldSpec::new("speaker", &["pilotName", "text"], FieldKind::Text);

/// Voice-line subtitles of the battle animation.
///
/// The scene object is found once and then read from the cached handle.
/// It usually stops changing right before it is destroyed, hence the
/// aggressive staleness defaults of this feature.
#[derive(Debug)]
pub struct BattleSubtitle {
    last_mode: ReadMode,
}

impl Default for BattleSubtitle {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleSubtitle {
    pub fn new() -> Self {
        Self {
            last_mode: ReadMode::Full,
        }
    }

    fn line(
        ctx: &PollContext<'_>,
        speaker: &str,
        dialog: &str,
    ) -> String {
        if speaker.is_empty() {
            dialog.to_string()
        } else {
            ctx.text("dialogue_line", &[speaker.to_string(), dialog.to_string()])
        }
    }
}

/// Read `specs` as cleaned text. An unreadable text object reads as an empty
/// line, so a line that vanished and comes back is news again.
fn cleaned(
    ctx: &PollContext<'_>,
    handle: ForeignHandle,
    specs: &[FieldSpec],
) -> Result<Schema, ForeignError> {
    let raw = extract_schema(ctx.graph, handle, specs)?;
    let mut schema = Schema::new();
    for spec in specs {
        let text = raw.text(spec.name).map(clean_rich_text).unwrap_or_default();
        schema.insert(spec.name, Primitive::Text(text));
    }
    Ok(schema)
}

impl Feature for BattleSubtitle {
    fn name(&self) -> &'static str {
        "battle_subtitle"
    }

    fn needs_discovery(&self) -> bool {
        true
    }

    fn acquire(
        &mut self,
        ctx: &PollContext<'_>,
    ) -> Result<Option<ForeignHandle>, ForeignError> {
        Ok(ctx.graph.find_instances(BATTLE_SCENE_CLASS)?.into_iter().next())
    }

    /// Stale probes read the subtitle line only.
    fn read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        mode: ReadMode,
    ) -> Result<Schema, ForeignError> {
        self.last_mode = mode;
        match mode {
            ReadMode::Full => cleaned(ctx, handle, &[DIALOG, SPEAKER]),
            ReadMode::StaleProbe => cleaned(ctx, handle, &[DIALOG]),
        }
    }

    /// A non-empty line that differs from the last one. A cleared line makes
    /// the same text announceable again.
    fn has_changed(
        &self,
        previous: &Schema,
        current: &Schema,
    ) -> bool {
        match current.text("dialog") {
            Some(dialog) if !dialog.is_empty() => previous.text("dialog") != Some(dialog),
            _ => false,
        }
    }

    fn describe(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        _previous: &Schema,
        current: &Schema,
    ) -> Option<Announcement> {
        let dialog = current.text("dialog")?;
        // After a stale probe the speaker in `current` belongs to the old line.
        let speaker = match self.last_mode {
            ReadMode::Full => current.text("speaker").unwrap_or_default().to_string(),
            ReadMode::StaleProbe => cleaned(ctx, handle, &[SPEAKER])
                .map(|fresh| fresh.text("speaker").unwrap_or_default().to_string())
                .unwrap_or_default(),
        };
        Some(Announcement::new(Self::line(ctx, &speaker, dialog)))
    }

    /// The scene is found as soon as it exists, so its first line is news.
    fn on_first_read(
        &mut self,
        ctx: &PollContext<'_>,
        handle: ForeignHandle,
        current: &Schema,
    ) -> Option<Announcement> {
        if self.has_changed(&Schema::new(), current) {
            self.describe(ctx, handle, &Schema::new(), current)
        } else {
            None
        }
    }

    fn on_release(&mut self) {
        self.last_mode = ReadMode::Full;
    }
}
