//! The read/compare/announce cycle shared by every feature.

mod feature;
mod feature_handler;
mod name_resolver;

pub use feature::*;
pub use feature_handler::*;
pub use name_resolver::*;
