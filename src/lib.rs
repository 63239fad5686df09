//! Schemalock: schema-locked tabular classification
//!
//! A library for consolidating labeled observation files, training a
//! classifier on a deterministic one-hot encoding, and scoring new data
//! against the exact feature schema the model was trained on.

pub mod cli;
pub mod error;
pub mod explain;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;
