//! Shared test utilities for the datakit workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`] — [`TestProject`] builder for manifest and file setup
//! - [`remote`] — [`MemoryAdapter`], an in-process remote store

pub mod project;
pub mod remote;

pub use project::TestProject;
pub use remote::MemoryAdapter;
