//! Utilities for SchemaDelta
//!
//! This module provides utility functions used across the library.

pub mod naming;
pub mod logging;

// Re-export key utility functions
pub use naming::{fold_case, names_match, QuoteStyle};
