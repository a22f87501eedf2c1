//! Directory resolution abstraction for platform-specific paths.
//!
//! The installer only needs the user's home directory, where the optional
//! configuration file lives. Lookup sits behind [`BaseDirs`] so tests can
//! point it at a sandbox.

use std::path::PathBuf;

/// Source of user-level directories.
pub trait BaseDirs {
    /// The current user's home directory, if one can be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the platform conventions in `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}
