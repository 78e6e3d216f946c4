//! Rendering of a valued forest for external viewers.

mod dot;

pub use dot::{mirr_range, to_dot};
