//! Filesystem utilities.
//!
//! Currently holds the crate's [`logger`], which backs the `log` macros
//! used for all diagnostic output from the motion controller.

/// Dual console/file logger implementing the [`log`] facade.
pub mod logger;
