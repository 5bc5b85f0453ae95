mod change_announcer;
pub use change_announcer::*;
