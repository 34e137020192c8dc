//! Progress reporting module
//!
//! Terminal progress bars fed by the copy worker's events.

mod reporter;

pub use reporter::*;
