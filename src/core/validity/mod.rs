mod validity_gate;
pub use validity_gate::*;
