use serde::Deserialize;
use serde::Serialize;

use crate::Language;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LocalizationConfig {
    #[serde(default)]
    pub language: Language,
}
