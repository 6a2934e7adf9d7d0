//! CLI utilities for buildspec tools
//!
//! Provides shared CLI functionality:
//! - Terminal output formatting
//! - Status messages

#![warn(missing_docs)]

pub mod output;
