//! Pipeline module - ingestion, target resolution, encoding and alignment

pub mod align;
pub mod config;
pub mod encoder;
pub mod inference;
pub mod loader;
pub mod missing;
pub mod schema;
pub mod target;
pub mod training;

pub use align::*;
pub use config::*;
pub use encoder::*;
pub use inference::*;
pub use loader::*;
pub use missing::*;
pub use schema::*;
pub use target::*;
pub use training::*;
