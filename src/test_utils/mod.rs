//! the test_utils folder here will share utils or test components between
//! unit tests
mod common;
mod sim_graph;
mod sim_world;

pub use common::*;
pub use sim_graph::*;
pub use sim_world::*;
