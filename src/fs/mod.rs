//! File system operations module
//!
//! Source enumeration, the single-file copy primitive and free-space
//! queries for the destination volume.

mod operations;
mod scanner;
mod space;

pub use operations::*;
pub use scanner::*;
pub use space::*;
