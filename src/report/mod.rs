//! Report module - training summary, predictions and explanation output

pub mod importance;
pub mod predictions;
pub mod summary;

pub use importance::*;
pub use predictions::*;
pub use summary::*;
