//! # schedsync Testkit
//!
//! Test utilities for schedsync.
//!
//! This crate provides:
//! - A sample door schedule document and matching profile
//! - Helpers for building remote matrices and incoming rows
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schedsync_testkit::prelude::*;
//!
//! #[test]
//! fn exports_doors() {
//!     let fixture = DoorSchedule::new();
//!     let profile = door_profile();
//!     // ... run an export against fixture.doc
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
