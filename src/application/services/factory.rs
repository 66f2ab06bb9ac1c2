//! Parent factory
//!
//! Builds one or many parents from the configured snapshot.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{ParentSnapshot, ParentTree, RandomSource, TreeBuilder};
use crate::infrastructure::traits::FileSystem;

/// Number of parents built when no count is given.
pub const DEFAULT_COUNT: usize = 10;

/// Builds trees from a fixed snapshot template.
#[derive(Debug, Clone)]
pub struct ParentFactory {
    builder: TreeBuilder,
    snapshot: ParentSnapshot,
}

impl ParentFactory {
    pub fn new(builder: TreeBuilder, snapshot: ParentSnapshot) -> Self {
        Self { builder, snapshot }
    }

    /// Default build options with the benchmark snapshot.
    pub fn standard() -> Self {
        Self::new(TreeBuilder::default(), ParentSnapshot::standard())
    }

    /// Build options from settings; snapshot from `settings.snapshot` when set,
    /// the benchmark snapshot otherwise.
    pub fn from_settings(settings: &Settings, fs: &dyn FileSystem) -> ApplicationResult<Self> {
        let snapshot = match &settings.snapshot {
            Some(path) => load_snapshot(fs, path)?,
            None => ParentSnapshot::standard(),
        };
        Ok(Self::new(TreeBuilder::new(settings.build.clone()), snapshot))
    }

    pub fn snapshot(&self) -> &ParentSnapshot {
        &self.snapshot
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    #[instrument(level = "debug", skip_all)]
    pub fn create_one_parent(&self, rng: &mut dyn RandomSource) -> ParentTree {
        self.builder.build(&self.snapshot, rng)
    }

    #[instrument(level = "info", skip(self, rng))]
    pub fn create_parents(&self, count: usize, rng: &mut dyn RandomSource) -> Vec<ParentTree> {
        let parents = self.builder.build_many(&self.snapshot, count, rng);
        info!("created {} parents", parents.len());
        parents
    }
}

/// Read and parse a JSON snapshot file.
pub fn load_snapshot(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<ParentSnapshot> {
    debug!("load_snapshot: {}", path.display());
    if !fs.exists(path) {
        return Err(ApplicationError::SnapshotNotFound(path.to_path_buf()));
    }
    let content = fs.read_to_string(path).with_path_context("read snapshot", path)?;
    Ok(ParentSnapshot::from_json(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixedSequence;

    #[test]
    fn given_standard_factory_when_creating_parents_then_count_independent_trees() {
        let factory = ParentFactory::standard();
        let mut rng = FixedSequence::new(vec![0.25, 0.75]);

        let parents = factory.create_parents(3, &mut rng);

        assert_eq!(parents.len(), 3);
        assert_ne!(parents[0].id(), parents[1].id());
        assert!(parents.iter().all(|p| p.child_count() == 100));
    }

    #[test]
    fn given_zero_count_when_creating_parents_then_empty() {
        let mut rng = FixedSequence::default();
        assert!(ParentFactory::standard()
            .create_parents(0, &mut rng)
            .is_empty());
    }
}
