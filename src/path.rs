//! Config file path resolution
//!
//! The embedding application decides how relative config paths are
//! anchored: the working directory, a project root it knows about, or any
//! closure of its own.

use std::path::{Path, PathBuf};

/// Default config file location, relative to the resolver's anchor
pub const DEFAULT_CONFIG_PATH: &str = "config/eb.yml";

/// Turns a relative config path into an absolute one
pub trait PathResolver {
    fn resolve(&self, relative: &Path) -> PathBuf;
}

impl<F> PathResolver for F
where
    F: Fn(&Path) -> PathBuf,
{
    fn resolve(&self, relative: &Path) -> PathBuf {
        self(relative)
    }
}

/// Anchors paths at the current working directory at call time
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkingDirResolver;

impl PathResolver for WorkingDirResolver {
    fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            return relative.to_path_buf();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(relative),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read working directory, using relative path");
                relative.to_path_buf()
            }
        }
    }
}

/// Anchors paths at a fixed project root
#[derive(Debug, Clone)]
pub struct RootDirResolver {
    root: PathBuf,
}

impl RootDirResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathResolver for RootDirResolver {
    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
