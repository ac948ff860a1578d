//! # EntiSLEE Testkit
//!
//! Test utilities for EntiSLEE.
//!
//! This crate provides:
//! - A ready-wired [`TestHarness`] with registered components
//! - Cleanup hooks that record the context they ran under
//! - A fault-injecting store wrapper
//! - Property-based test generators using proptest
//! - Concurrent transaction stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use entislee_testkit::prelude::*;
//!
//! let harness = TestHarness::new();
//! let mut txn = harness.begin();
//! let root = harness.create_root(&mut txn, "conv1");
//! assert!(!harness.store().contains(root.id()));
//!
//! harness.commit(&mut txn).unwrap();
//! assert!(harness.store().contains(root.id()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
