use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Localizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

/// Built-in template table. Lookup order: current language, English, the key
/// itself.
#[derive(Debug, Clone)]
pub struct StringTable {
    language: Language,
    templates: HashMap<Language, HashMap<&'static str, String>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new(Language::En)
    }
}

impl StringTable {
    pub fn new(language: Language) -> Self {
        let mut table = Self {
            language,
            templates: HashMap::new(),
        };
        table.load_builtin();
        table
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(
        &mut self,
        language: Language,
    ) {
        if language != self.language {
            debug!("localization: language changed {:?} -> {:?}", self.language, language);
            self.language = language;
        }
    }

    /// Add or replace a single template.
    pub fn insert(
        &mut self,
        language: Language,
        key: &'static str,
        template: impl Into<String>,
    ) {
        self.templates.entry(language).or_default().insert(key, template.into());
    }

    pub fn template(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.templates
            .get(&self.language)
            .and_then(|t| t.get(key))
            .or_else(|| self.templates.get(&Language::En).and_then(|t| t.get(key)))
            .map(String::as_str)
    }

    fn add(
        &mut self,
        key: &'static str,
        en: &str,
        ja: &str,
    ) {
        self.insert(Language::En, key, en);
        self.insert(Language::Ja, key, ja);
    }

    fn load_builtin(&mut self) {
        self.add("dialogue_line", "{0}: {1}", "{0}：{1}");
        self.add(
            "result_battle",
            "Battle result: {0}, Level {1}, EXP +{2}, Score +{3}, Credits +{4}",
            "戦闘結果：{0}、レベル {1}、EXP +{2}、スコア +{3}、クレジット +{4}",
        );
        self.add(
            "result_level_up",
            "Level up! {0}: Level {1} to {2}",
            "レベルアップ！{0}：レベル {1} → {2}",
        );
        self.add("support_attack_screen", "Attack Support", "攻撃サポート");
        self.add("support_defence_screen", "Defence Support", "防御サポート");
        self.add("support_none", "No Support", "サポートなし");
        self.add("support_double_attack", "Double Attack", "ダブルアタック");
        self.add("support_numbered", "Support {0}", "サポート {0}");
    }
}

impl Localizer for StringTable {
    fn get(
        &self,
        key: &str,
        args: &[String],
    ) -> String {
        match self.template(key) {
            Some(template) => format_template(template, args),
            None => key.to_string(),
        }
    }
}

/// Substitute `{0}`, `{1}`, ... with `args`. Placeholders without a matching
/// argument and stray braces are kept verbatim.
pub fn format_template(
    template: &str,
    args: &[String],
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
