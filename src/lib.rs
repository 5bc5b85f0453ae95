mod config;
mod core;
mod errors;
mod features;
mod foreign;
mod localization;
mod metrics;
mod output;
pub mod utils;

pub use core::*;

pub use config::*;
pub use errors::*;
pub use features::*;
pub use foreign::*;
pub use localization::*;
pub use metrics::*;
pub use output::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
