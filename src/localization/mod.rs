//! Announcement text templates.

mod string_table;
pub use string_table::*;


#[cfg(test)]
use mockall::automock;

/// Pure formatting capability: `get("result_level_up", &["Amuro", "12", "13"])`.
/// Assumed total and side-effect free; unknown keys come back as the key.
#[cfg_attr(test, automock)]
pub trait Localizer {
    fn get(
        &self,
        key: &str,
        args: &[String],
    ) -> String;
}
