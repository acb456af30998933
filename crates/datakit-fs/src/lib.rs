//! Filesystem abstraction for datakit
//!
//! Provides normalized cross-platform path handling, user/environment
//! expansion, and atomic I/O used by the manifest layer.

pub mod error;
pub mod io;
pub mod path;
pub mod sys;

pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use sys::SysPath;
