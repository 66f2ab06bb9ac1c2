//! Tree builder: instantiates a `ParentTree` from a snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::entities::{
    ChildFields, GrandChildFields, GrandChildNum, NameFormat, NumRange, ParentFields,
};
use crate::domain::error::DomainResult;
use crate::domain::random::{draw_child_type, draw_grandchild_type, draw_in_range, RandomSource};
use crate::domain::snapshot::{ChildSnapshot, GrandChildSnapshot, ParentSnapshot};
use crate::domain::tree::ParentTree;

/// Knobs on which the historical variants of the model disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Range for a child's `num` when the snapshot omits it
    pub child_num: NumRange,
    /// Policy for a grandchild's `num` when the snapshot omits it
    pub grandchild_num: GrandChildNum,
    /// Separators for `name` and `combo`
    pub format: NameFormat,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            child_num: NumRange::new(1.0, 100.0),
            grandchild_num: GrandChildNum::default(),
            format: NameFormat::default(),
        }
    }
}

/// Constructs trees from snapshots.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    options: BuildOptions,
}

impl TreeBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build one tree. Per node the draws are taken in order type, num, then
    /// the node's own children; fields given by the snapshot take no draw.
    #[instrument(level = "debug", skip_all, fields(children = snapshot.children.len()))]
    pub fn build(&self, snapshot: &ParentSnapshot, rng: &mut dyn RandomSource) -> ParentTree {
        let capacity = 1 + snapshot.children.len() + snapshot.grandchild_count();
        let mut tree = ParentTree::with_root(
            ParentFields {
                first: snapshot.first.clone(),
                last: snapshot.last.clone(),
                num1: snapshot.num1,
                num2: snapshot.num2,
            },
            self.options.format.clone(),
            capacity,
        );

        for child in &snapshot.children {
            let fields = self.child_fields(child, rng);
            let child_idx = tree.push_child(fields);
            for grandchild in &child.children {
                let fields = self.grandchild_fields(grandchild, rng);
                tree.push_grandchild(child_idx, fields);
            }
        }

        debug!(tree = %tree.tree_id(), nodes = capacity, "built");
        tree
    }

    /// Build `count` independent trees, one after another.
    #[instrument(level = "debug", skip(self, snapshot, rng))]
    pub fn build_many(
        &self,
        snapshot: &ParentSnapshot,
        count: usize,
        rng: &mut dyn RandomSource,
    ) -> Vec<ParentTree> {
        (0..count).map(|_| self.build(snapshot, rng)).collect()
    }

    pub fn build_from_json(&self, json: &str, rng: &mut dyn RandomSource) -> DomainResult<ParentTree> {
        let snapshot = ParentSnapshot::from_json(json)?;
        Ok(self.build(&snapshot, rng))
    }

    fn child_fields(&self, snapshot: &ChildSnapshot, rng: &mut dyn RandomSource) -> ChildFields {
        let kind = snapshot.kind.unwrap_or_else(|| draw_child_type(rng));
        let num = snapshot
            .num
            .unwrap_or_else(|| draw_in_range(rng, self.options.child_num));
        ChildFields { kind, num }
    }

    fn grandchild_fields(
        &self,
        snapshot: &GrandChildSnapshot,
        rng: &mut dyn RandomSource,
    ) -> GrandChildFields {
        let kind = snapshot.kind.unwrap_or_else(|| draw_grandchild_type(rng));
        let num = snapshot.num.unwrap_or_else(|| match self.options.grandchild_num {
            GrandChildNum::Zero => 0.0,
            GrandChildNum::Random(range) => draw_in_range(rng, range),
        });
        GrandChildFields { kind, num }
    }
}
