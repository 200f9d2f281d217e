//! Storage module for Tessera
//!
//! - `json`: JSON files for configuration, feature descriptors, and roles

mod json;

pub use json::JsonStore;
