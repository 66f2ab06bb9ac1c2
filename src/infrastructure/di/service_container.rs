//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::ParentFactory;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::SeededSource;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding settings and I/O implementations.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    pub fn factory(&self) -> ApplicationResult<ParentFactory> {
        ParentFactory::from_settings(&self.settings, self.fs.as_ref())
    }

    /// Random source seeded by `seed`, falling back to the configured seed.
    pub fn random(&self, seed: Option<u64>) -> SeededSource {
        SeededSource::new(seed.or(self.settings.seed))
    }
}
