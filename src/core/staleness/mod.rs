mod staleness_controller;
pub use staleness_controller::*;

#[cfg(test)]
mod staleness_controller_test;
