//! The built tree: queries, derived values, setters and observation hooks.

use std::fmt;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeData, TreeArena, TreeNode};
use crate::domain::entities::{
    ChildFields, ChildId, ChildType, GrandChildFields, GrandChildId, GrandChildType, NameFormat,
    NodeId, ParentFields, ParentId, TreeId,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::observer::{ActionEvent, ActionName, ObserverId, Observers};
use crate::domain::snapshot::{ChildSnapshot, GrandChildSnapshot, ParentSnapshot};

/// Shape summary of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub children: usize,
    pub grandchildren: usize,
    pub depth: usize,
}

/// One parent with its children and grandchildren.
///
/// The tree exclusively owns its nodes. Shape is fixed at construction; only
/// `num1`, `num2` and the `num` leaves change, and every change is reported to
/// the registered observers once it has been applied.
pub struct ParentTree {
    id: TreeId,
    fields: ParentFields,
    format: NameFormat,
    arena: TreeArena,
    root: Index,
    observers: Observers,
}

impl fmt::Debug for ParentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentTree")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("nodes", &self.arena.len())
            .field("observers", &self.observers)
            .finish()
    }
}

impl ParentTree {
    /// Empty tree holding only the root; the builder appends the rest.
    pub(crate) fn with_root(fields: ParentFields, format: NameFormat, capacity: usize) -> Self {
        let mut arena = TreeArena::with_capacity(capacity);
        let root = arena.insert_node(NodeData::Parent, None);
        Self {
            id: TreeId::next(),
            fields,
            format,
            arena,
            root,
            observers: Observers::default(),
        }
    }

    pub(crate) fn push_child(&mut self, fields: ChildFields) -> Index {
        self.arena.insert_node(NodeData::Child(fields), Some(self.root))
    }

    pub(crate) fn push_grandchild(&mut self, child: Index, fields: GrandChildFields) -> Index {
        self.arena
            .insert_node(NodeData::GrandChild(fields), Some(child))
    }

    fn node_id(&self, index: Index) -> NodeId {
        NodeId {
            tree: self.id,
            index,
        }
    }

    pub fn id(&self) -> ParentId {
        ParentId(self.node_id(self.root))
    }

    pub fn tree_id(&self) -> TreeId {
        self.id
    }

    pub fn format(&self) -> &NameFormat {
        &self.format
    }

    // ---- parent fields and derived values ----

    pub fn first(&self) -> &str {
        &self.fields.first
    }

    pub fn last(&self) -> &str {
        &self.fields.last
    }

    pub fn num1(&self) -> f64 {
        self.fields.num1
    }

    pub fn num2(&self) -> f64 {
        self.fields.num2
    }

    pub fn name(&self) -> String {
        format!(
            "{}{}{}",
            self.fields.first, self.format.name_separator, self.fields.last
        )
    }

    pub fn sum(&self) -> f64 {
        self.fields.num1 + self.fields.num2
    }

    // ---- navigation ----

    fn root_node(&self) -> Option<&TreeNode> {
        self.arena.get_node(self.root)
    }

    fn child_at_index(&self, index: Index) -> Option<ChildRef<'_>> {
        match &self.arena.get_node(index)?.data {
            NodeData::Child(fields) => Some(ChildRef {
                tree: self,
                index,
                fields,
            }),
            _ => None,
        }
    }

    fn grandchild_at_index(&self, index: Index) -> Option<GrandChildRef<'_>> {
        let node = self.arena.get_node(index)?;
        let NodeData::GrandChild(fields) = &node.data else {
            return None;
        };
        let parent = self.child_at_index(node.parent()?)?;
        Some(GrandChildRef {
            index,
            parent,
            fields,
        })
    }

    fn check_owner(&self, id: NodeId) -> DomainResult<Index> {
        if id.tree != self.id {
            return Err(DomainError::ForeignNode(id.to_string()));
        }
        Ok(id.index)
    }

    pub fn children(&self) -> impl Iterator<Item = ChildRef<'_>> + '_ {
        self.root_node()
            .map(|n| n.children())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&idx| self.child_at_index(idx))
    }

    pub fn child_count(&self) -> usize {
        self.root_node().map_or(0, |n| n.children().len())
    }

    pub fn child_at(&self, position: usize) -> Option<ChildRef<'_>> {
        let idx = *self.root_node()?.children().get(position)?;
        self.child_at_index(idx)
    }

    pub fn child(&self, id: ChildId) -> DomainResult<ChildRef<'_>> {
        let index = self.check_owner(id.0)?;
        self.child_at_index(index)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    pub fn grandchild(&self, id: GrandChildId) -> DomainResult<GrandChildRef<'_>> {
        let index = self.check_owner(id.0)?;
        self.grandchild_at_index(index)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    /// All grandchildren, child by child.
    pub fn grandchildren(&self) -> impl Iterator<Item = GrandChildRef<'_>> + '_ {
        self.children().flat_map(|c| c.children())
    }

    pub fn child_mut(&mut self, id: ChildId) -> DomainResult<ChildMut<'_>> {
        self.child(id)?;
        Ok(ChildMut { tree: self, id })
    }

    pub fn grandchild_mut(&mut self, id: GrandChildId) -> DomainResult<GrandChildMut<'_>> {
        self.grandchild(id)?;
        Ok(GrandChildMut { tree: self, id })
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            children: 0,
            grandchildren: 0,
            depth: self.arena.depth(),
        };
        for (_, node) in self.arena.iter() {
            match node.data {
                NodeData::Child(_) => stats.children += 1,
                NodeData::GrandChild(_) => stats.grandchildren += 1,
                NodeData::Parent => {}
            }
        }
        stats
    }

    // ---- aggregates ----

    /// Sum of the children's `num` (grandchildren are ignored).
    pub fn collect_sum(&self) -> f64 {
        self.children().fold(0.0, |s, c| s + c.num())
    }

    /// Sum of every grandchild's `num`, accumulated per child.
    pub fn collect_deep_sum(&self) -> f64 {
        self.children().fold(0.0, |s, c| s + c.collect_sum())
    }

    // ---- mutation ----

    #[instrument(level = "trace", skip(self))]
    pub fn set_num1(&mut self, value: f64) {
        self.fields.num1 = value;
        self.notify(ActionEvent::new(ActionName::SetNum1, "", vec![value]));
    }

    #[instrument(level = "trace", skip(self))]
    pub fn set_num2(&mut self, value: f64) {
        self.fields.num2 = value;
        self.notify(ActionEvent::new(ActionName::SetNum2, "", vec![value]));
    }

    fn store_num(&mut self, index: Index, value: f64) {
        if let Some(node) = self.arena.get_node_mut(index) {
            match &mut node.data {
                NodeData::Child(fields) => fields.num = value,
                NodeData::GrandChild(fields) => fields.num = value,
                NodeData::Parent => {}
            }
        }
    }

    fn set_leaf_num(&mut self, index: Index, value: f64) {
        self.store_num(index, value);
        let path = self.path_of_index(index);
        self.notify(ActionEvent::new(ActionName::SetNum, path, vec![value]));
    }

    fn notify(&mut self, event: ActionEvent) {
        trace!(action = %event, "applied");
        self.observers.emit_action(&event);

        let mut reactions = self.observers.take_reactions();
        let tree: &ParentTree = self;
        for (_, reaction) in reactions.iter_mut() {
            reaction(tree);
        }
        self.observers.restore_reactions(reactions);

        if self.observers.wants_snapshots() {
            let snapshot = self.snapshot();
            self.observers.emit_snapshot(&snapshot);
        }
    }

    // ---- observation ----

    /// Called after every mutation with a description of the call.
    pub fn on_action(&mut self, callback: impl FnMut(&ActionEvent) + 'static) -> ObserverId {
        self.observers.add_action(Box::new(callback))
    }

    /// Called after every mutation with the full current state.
    pub fn on_snapshot(&mut self, callback: impl FnMut(&ParentSnapshot) + 'static) -> ObserverId {
        self.observers.add_snapshot(Box::new(callback))
    }

    /// Re-evaluates `selector` after every mutation and calls `effect` when the
    /// selected value differs from the previous one. The initial value is taken
    /// at registration and does not fire.
    pub fn reaction<T, S, E>(&mut self, selector: S, mut effect: E) -> ObserverId
    where
        T: PartialEq + 'static,
        S: Fn(&ParentTree) -> T + 'static,
        E: FnMut(&T) + 'static,
    {
        let mut last = selector(self);
        self.observers.add_reaction(Box::new(move |tree: &ParentTree| {
            let next = selector(tree);
            if next != last {
                effect(&next);
                last = next;
            }
        }))
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ---- snapshots ----

    /// Full state with every random field filled in.
    pub fn snapshot(&self) -> ParentSnapshot {
        ParentSnapshot {
            first: self.fields.first.clone(),
            last: self.fields.last.clone(),
            num1: self.fields.num1,
            num2: self.fields.num2,
            children: self
                .children()
                .map(|c| ChildSnapshot {
                    kind: Some(c.kind()),
                    num: Some(c.num()),
                    children: c
                        .children()
                        .map(|g| GrandChildSnapshot {
                            kind: Some(g.kind()),
                            num: Some(g.num()),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    // ---- paths and replay ----

    fn path_of_index(&self, index: Index) -> String {
        let mut segments = Vec::new();
        let mut current = index;
        while let Some(parent) = self.arena.get_node(current).and_then(|n| n.parent()) {
            match self.arena.position(current) {
                Some(pos) => segments.push(pos),
                None => break,
            }
            current = parent;
        }
        segments
            .iter()
            .rev()
            .map(|pos| format!("/children/{pos}"))
            .collect()
    }

    /// Slash path of a node: `""` for the root, `/children/i[/children/j]` below.
    pub fn path_of(&self, id: NodeId) -> DomainResult<String> {
        let index = self.check_owner(id)?;
        if self.arena.get_node(index).is_none() {
            return Err(DomainError::NodeNotFound(id.to_string()));
        }
        Ok(self.path_of_index(index))
    }

    pub fn resolve_path(&self, path: &str) -> DomainResult<NodeId> {
        let trimmed = path.trim_end_matches('/');
        let mut current = self.root;
        if trimmed.is_empty() {
            return Ok(self.node_id(current));
        }
        let rest = trimmed
            .strip_prefix('/')
            .ok_or_else(|| DomainError::InvalidPath(path.to_string()))?;
        let mut segments = rest.split('/');
        while let Some(segment) = segments.next() {
            if segment != "children" {
                return Err(DomainError::InvalidPath(path.to_string()));
            }
            let pos: usize = segments
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| DomainError::InvalidPath(path.to_string()))?;
            current = self
                .arena
                .get_node(current)
                .and_then(|n| n.children().get(pos).copied())
                .ok_or_else(|| DomainError::NodeNotFound(path.to_string()))?;
        }
        Ok(self.node_id(current))
    }

    /// Replays a recorded action onto this tree. Observers fire as for a direct
    /// call. Nothing is written when the action does not fit the target.
    #[instrument(level = "debug", skip(self, action), fields(action = %action))]
    pub fn apply_action(&mut self, action: &ActionEvent) -> DomainResult<()> {
        let value = match action.args.as_slice() {
            [value] => *value,
            args => {
                return Err(DomainError::InvalidArguments {
                    name: action.name.to_string(),
                    expected: 1,
                    got: args.len(),
                })
            }
        };
        let target = self.resolve_path(&action.path)?.index;
        let data = self
            .arena
            .get_node(target)
            .map(|n| n.data)
            .ok_or_else(|| DomainError::NodeNotFound(action.path.clone()))?;

        match (action.name, data) {
            (ActionName::SetNum1, NodeData::Parent) => self.set_num1(value),
            (ActionName::SetNum2, NodeData::Parent) => self.set_num2(value),
            (ActionName::SetNum, NodeData::Child(_) | NodeData::GrandChild(_)) => {
                self.set_leaf_num(target, value)
            }
            _ => {
                return Err(DomainError::UnsupportedAction {
                    name: action.name.to_string(),
                    path: action.path.clone(),
                })
            }
        }
        debug!("replayed");
        Ok(())
    }
}

/// Read view of a child node.
#[derive(Clone, Copy)]
pub struct ChildRef<'a> {
    tree: &'a ParentTree,
    index: Index,
    fields: &'a ChildFields,
}

impl fmt::Debug for ChildRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRef")
            .field("id", &self.id())
            .field("fields", self.fields)
            .finish()
    }
}

impl<'a> ChildRef<'a> {
    pub fn id(&self) -> ChildId {
        ChildId(self.tree.node_id(self.index))
    }

    pub fn kind(&self) -> ChildType {
        self.fields.kind
    }

    pub fn num(&self) -> f64 {
        self.fields.num
    }

    pub fn num_copy(&self) -> f64 {
        self.fields.num
    }

    /// The owning parent.
    pub fn parent(&self) -> ParentId {
        self.tree.id()
    }

    pub fn tree(&self) -> &'a ParentTree {
        self.tree
    }

    pub fn children(&self) -> impl Iterator<Item = GrandChildRef<'a>> + 'a {
        let tree = self.tree;
        tree.arena
            .get_node(self.index)
            .map(|n| n.children())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&idx| tree.grandchild_at_index(idx))
    }

    pub fn child_count(&self) -> usize {
        self.tree
            .arena
            .get_node(self.index)
            .map_or(0, |n| n.children().len())
    }

    pub fn child_at(&self, position: usize) -> Option<GrandChildRef<'a>> {
        let idx = *self
            .tree
            .arena
            .get_node(self.index)?
            .children()
            .get(position)?;
        self.tree.grandchild_at_index(idx)
    }

    /// Sum of the grandchildren's `num`; recomputed on every call.
    pub fn collect_sum(&self) -> f64 {
        self.children().fold(0.0, |s, g| s + g.num())
    }

    pub fn path(&self) -> String {
        self.tree.path_of_index(self.index)
    }
}

/// Read view of a grandchild node.
#[derive(Clone, Copy)]
pub struct GrandChildRef<'a> {
    index: Index,
    parent: ChildRef<'a>,
    fields: &'a GrandChildFields,
}

impl fmt::Debug for GrandChildRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrandChildRef")
            .field("id", &self.id())
            .field("fields", self.fields)
            .finish()
    }
}

impl<'a> GrandChildRef<'a> {
    pub fn id(&self) -> GrandChildId {
        GrandChildId(self.parent.tree().node_id(self.index))
    }

    pub fn kind(&self) -> GrandChildType {
        self.fields.kind
    }

    pub fn num(&self) -> f64 {
        self.fields.num
    }

    /// The owning child, as recorded at construction.
    pub fn parent(&self) -> ChildId {
        self.parent.id()
    }

    pub fn parent_ref(&self) -> ChildRef<'a> {
        self.parent
    }

    /// `<parent name><sep><child type><sep><own type>`, from current state.
    pub fn combo(&self) -> String {
        let tree = self.parent.tree();
        let sep = &tree.format.combo_separator;
        format!(
            "{}{sep}{}{sep}{}",
            tree.name(),
            self.parent.kind(),
            self.kind()
        )
    }

    pub fn path(&self) -> String {
        self.parent.tree().path_of_index(self.index)
    }
}

/// Write handle for one child.
pub struct ChildMut<'a> {
    tree: &'a mut ParentTree,
    id: ChildId,
}

impl ChildMut<'_> {
    pub fn set_num(self, value: f64) {
        self.tree.set_leaf_num(self.id.0.index, value);
    }
}

/// Write handle for one grandchild.
pub struct GrandChildMut<'a> {
    tree: &'a mut ParentTree,
    id: GrandChildId,
}

impl GrandChildMut<'_> {
    pub fn set_num(self, value: f64) {
        self.tree.set_leaf_num(self.id.0.index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> ParentTree {
        let mut tree = ParentTree::with_root(
            ParentFields {
                first: "Foo".into(),
                last: "Bar".into(),
                num1: 1.0,
                num2: 2.0,
            },
            NameFormat::default(),
            8,
        );
        for (kind, num) in [(ChildType::A, 10.0), (ChildType::C, 20.0)] {
            let c = tree.push_child(ChildFields { kind, num });
            for n in [1.0, 2.0, 3.0] {
                tree.push_grandchild(
                    c,
                    GrandChildFields {
                        kind: GrandChildType::Y,
                        num: n,
                    },
                );
            }
        }
        tree
    }

    #[test]
    fn given_small_tree_when_querying_then_aggregates_match() {
        let tree = small_tree();
        assert_eq!(tree.name(), "Foo Bar");
        assert_eq!(tree.sum(), 3.0);
        assert_eq!(tree.collect_sum(), 30.0);
        assert_eq!(tree.collect_deep_sum(), 12.0);
        assert_eq!(tree.child_at(0).unwrap().collect_sum(), 6.0);
        assert_eq!(
            tree.stats(),
            TreeStats {
                children: 2,
                grandchildren: 6,
                depth: 3
            }
        );
    }

    #[test]
    fn given_grandchild_when_reading_combo_then_walks_two_levels_up() {
        let tree = small_tree();
        let g = tree.child_at(1).unwrap().child_at(0).unwrap();
        assert_eq!(g.combo(), "Foo Bar -> C -> Y");
    }

    #[test]
    fn given_any_grandchild_when_reading_parent_then_owning_child_in_combo() {
        let tree = small_tree();
        for child in tree.children() {
            for g in child.children() {
                assert_eq!(g.parent_ref().id(), child.id());
                assert_eq!(g.combo().split(" -> ").count(), 3);
                assert!(g.combo().contains(&format!(" -> {} -> ", child.kind())));
            }
        }
        assert!(tree.grandchild_at_index(tree.root).is_none());
    }

    #[test]
    fn given_paths_when_resolving_then_round_trip_with_path_of() {
        let tree = small_tree();
        let g = tree.child_at(1).unwrap().child_at(2).unwrap();
        assert_eq!(g.path(), "/children/1/children/2");
        assert_eq!(tree.resolve_path(&g.path()).unwrap(), g.id().node());
        assert_eq!(tree.resolve_path("").unwrap(), tree.id().node());
        assert_eq!(tree.path_of(tree.id().node()).unwrap(), "");
    }

    #[test]
    fn given_bad_paths_when_resolving_then_errors() {
        let tree = small_tree();
        assert!(matches!(
            tree.resolve_path("children/0"),
            Err(DomainError::InvalidPath(_))
        ));
        assert!(matches!(
            tree.resolve_path("/kids/0"),
            Err(DomainError::InvalidPath(_))
        ));
        assert!(matches!(
            tree.resolve_path("/children/x"),
            Err(DomainError::InvalidPath(_))
        ));
        assert!(matches!(
            tree.resolve_path("/children/9"),
            Err(DomainError::NodeNotFound(_))
        ));
    }

    #[test]
    fn given_id_from_other_tree_when_looking_up_then_foreign_node() {
        let a = small_tree();
        let b = small_tree();
        let foreign = a.child_at(0).unwrap().id();
        assert!(matches!(b.child(foreign), Err(DomainError::ForeignNode(_))));
    }

    #[test]
    fn given_child_id_when_looking_up_grandchild_then_not_found() {
        let tree = small_tree();
        let child = tree.child_at(0).unwrap().id();
        let wrong = GrandChildId(child.node());
        assert!(matches!(
            tree.grandchild(wrong),
            Err(DomainError::NodeNotFound(_))
        ));
    }
}
