//! Built-in features of the Super Robot Wars Y object graph.

mod battle_result;
mod battle_subtitle;
mod supporter;

pub use battle_result::*;
pub use battle_subtitle::*;
pub use supporter::*;


use crate::FeatureHandler;
use crate::FeaturesConfig;
use crate::PollTarget;

/// One handler per built-in feature. Discovery slots follow this order:
/// attack support, defence support, battle subtitle.
pub fn default_handlers(config: &FeaturesConfig) -> Vec<Box<dyn PollTarget>> {
    vec![
        Box::new(FeatureHandler::new(BattleResult::new(), config.battle_result.clone())),
        Box::new(FeatureHandler::new(
            SupporterCursor::attack(),
            config.attack_support.clone(),
        )),
        Box::new(FeatureHandler::new(
            SupporterCursor::defence(),
            config.defence_support.clone(),
        )),
        Box::new(FeatureHandler::new(BattleSubtitle::new(), config.battle_subtitle.clone())),
    ]
}
