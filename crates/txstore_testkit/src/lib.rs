//! # txstore testkit
//!
//! Test utilities for txstore.
//!
//! This crate provides:
//! - Engine fixtures with synchronous expectation helpers
//! - A synchronous reference model of the store
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use txstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_engine() {
//!     with_engine(|engine| {
//!         engine.set("k", "v");
//!         engine.expect_value("k", "v");
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
