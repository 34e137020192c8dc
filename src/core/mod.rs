//! Core copy engine module
//!
//! Provides planning, overwrite policy, the sequential executor, the
//! background worker and the observer-side session state.

mod engine;
mod events;
mod executor;
mod planner;
mod policy;
mod session;
mod summary;

pub use engine::*;
pub use events::*;
pub use executor::*;
pub use planner::*;
pub use policy::*;
pub use session::*;
pub use summary::*;
