//! Core pipeline modules
//!
//! - `normalize`: command conversion and delimiter canonicalization
//! - `repair`: escape repair and strategy-chained parsing of model payloads
//! - `validate`: validation report and soft-fix sanitizer

pub mod normalize;
pub mod repair;
pub mod validate;
