//! Core utilities shared by the buildspec crates
//!
//! - **Error handling**: errors with codes, context and recovery suggestions
//! - **Validation**: accumulating field validation used by descriptor invariants

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result};
