mod poll_driver;
pub use poll_driver::*;
