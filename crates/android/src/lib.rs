//! Android application build descriptors
//!
//! This crate loads the declarative description of an Android application
//! module and validates it fail-closed:
//! - Application identity, SDK bounds and native ABIs
//! - Build variants and the signing configurations they reference
//! - Pick-first packaging rules for duplicate native libraries
//! - Ordered dependency declarations
//!
//! # Example
//!
//! ```rust
//! use buildspec_android::ConfigDescriptor;
//!
//! let descriptor = ConfigDescriptor::load(r#"
//!     [android]
//!     namespace = "com.example.app"
//!     compile_sdk = 36
//!
//!     [android.default_config]
//!     application_id = "com.example.app"
//!     min_sdk = 23
//!     target_sdk = 35
//!     version_code = 1
//!     version_name = "1.0.0"
//!     abi_filters = ["arm64-v8a"]
//!
//!     [android.build_types.release]
//!     signing_config = "debug"
//! "#).unwrap();
//!
//! let release = descriptor.resolve_variant("release").unwrap();
//! assert_eq!(release.signing_config(), Some("debug"));
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod loader;
pub mod model;
pub mod packaging;
mod reader;
mod schema;

pub use descriptor::ConfigDescriptor;
pub use error::{DescriptorError, Result};
pub use packaging::{PackagingCandidate, PackagingRule};
