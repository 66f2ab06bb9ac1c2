//! Domain entities: node payloads, labels, ids and build-time knobs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::Index;
use serde::{Deserialize, Serialize};

/// Category label of a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChildType {
    A,
    B,
    C,
}

impl ChildType {
    pub const ALL: [ChildType; 3] = [ChildType::A, ChildType::B, ChildType::C];
}

impl fmt::Display for ChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChildType::A => "A",
            ChildType::B => "B",
            ChildType::C => "C",
        };
        f.write_str(label)
    }
}

/// Category label of a grandchild node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrandChildType {
    X,
    Y,
    Z,
}

impl GrandChildType {
    pub const ALL: [GrandChildType; 3] = [GrandChildType::X, GrandChildType::Y, GrandChildType::Z];
}

impl fmt::Display for GrandChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GrandChildType::X => "X",
            GrandChildType::Y => "Y",
            GrandChildType::Z => "Z",
        };
        f.write_str(label)
    }
}

/// Scalar fields of the root node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentFields {
    pub first: String,
    pub last: String,
    pub num1: f64,
    pub num2: f64,
}

/// Scalar fields of a child node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildFields {
    pub kind: ChildType,
    pub num: f64,
}

/// Scalar fields of a grandchild node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrandChildFields {
    pub kind: GrandChildType,
    pub num: f64,
}

/// Half-open range `[min, max)` for uniform number draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumRange {
    pub min: f64,
    pub max: f64,
}

impl NumRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// How a grandchild's `num` is initialised when the snapshot omits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GrandChildNum {
    Zero,
    Random(NumRange),
}

impl Default for GrandChildNum {
    fn default() -> Self {
        GrandChildNum::Random(NumRange::new(0.0, 10.0))
    }
}

/// Separators used by the `name` and `combo` derived values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameFormat {
    pub name_separator: String,
    pub combo_separator: String,
}

impl Default for NameFormat {
    fn default() -> Self {
        Self {
            name_separator: " ".to_string(),
            combo_separator: " -> ".to_string(),
        }
    }
}

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Node identity: the owning tree plus the arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) tree: TreeId,
    pub(crate) index: Index,
}

impl NodeId {
    pub fn tree(&self) -> TreeId {
        self.tree
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.index.into_raw_parts();
        write!(f, "{}/{}:{}", self.tree, slot, generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentId(pub(crate) NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildId(pub(crate) NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrandChildId(pub(crate) NodeId);

macro_rules! node_id_accessors {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                pub fn node(&self) -> NodeId {
                    self.0
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

node_id_accessors!(ParentId, ChildId, GrandChildId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_labels_when_displayed_then_single_letters() {
        assert_eq!(ChildType::ALL.map(|t| t.to_string()), ["A", "B", "C"]);
        assert_eq!(GrandChildType::ALL.map(|t| t.to_string()), ["X", "Y", "Z"]);
    }

    #[test]
    fn given_inverted_range_when_validating_then_invalid() {
        assert!(NumRange::new(1.0, 100.0).is_valid());
        assert!(NumRange::new(5.0, 5.0).is_valid());
        assert!(!NumRange::new(10.0, 0.0).is_valid());
        assert!(!NumRange::new(f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn given_tree_ids_when_allocated_then_unique() {
        let a = TreeId::next();
        let b = TreeId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn given_grandchild_num_policy_when_serialized_then_tagged_by_mode() {
        let zero = toml::to_string(&GrandChildNum::Zero).unwrap();
        assert!(zero.contains("mode = \"zero\""));

        let random: GrandChildNum =
            toml::from_str("mode = \"random\"\nmin = 0.0\nmax = 10.0\n").unwrap();
        assert_eq!(random, GrandChildNum::Random(NumRange::new(0.0, 10.0)));
    }
}
