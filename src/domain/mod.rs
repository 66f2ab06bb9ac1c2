//! Domain layer: the observable tree and how it is built
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod display;
pub mod entities;
pub mod error;
mod number;
pub mod observer;
pub mod random;
pub mod snapshot;
pub mod tree;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{BuildOptions, TreeBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use observer::{ActionEvent, ActionName, ObserverId};
pub use random::{FixedSequence, RandomSource, SeededSource};
pub use snapshot::{ChildSnapshot, GrandChildSnapshot, ParentSnapshot};
pub use tree::{ChildMut, ChildRef, GrandChildMut, GrandChildRef, ParentTree, TreeStats};
