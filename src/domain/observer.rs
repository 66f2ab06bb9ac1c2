//! Synchronous observer lists attached to a tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::number::lossless_vec;
use crate::domain::snapshot::ParentSnapshot;
use crate::domain::tree::ParentTree;

/// Mutating entry points that emit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    SetNum1,
    SetNum2,
    SetNum,
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionName::SetNum1 => "set_num1",
            ActionName::SetNum2 => "set_num2",
            ActionName::SetNum => "set_num",
        };
        f.write_str(name)
    }
}

/// Description of one applied mutation: which method, on which node, with
/// which arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub name: ActionName,
    /// Slash path of the target node, `""` for the root.
    pub path: String,
    #[serde(with = "lossless_vec")]
    pub args: Vec<f64>,
}

impl ActionEvent {
    pub fn new(name: ActionName, path: impl Into<String>, args: Vec<f64>) -> Self {
        Self {
            name,
            path: path.into(),
            args,
        }
    }
}

impl fmt::Display for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({}) @ {}", self.name, args.join(", "), path)
    }
}

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ActionCallback = Box<dyn FnMut(&ActionEvent)>;
type SnapshotCallback = Box<dyn FnMut(&ParentSnapshot)>;
pub(crate) type ReactionCallback = Box<dyn FnMut(&ParentTree)>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    actions: Vec<(ObserverId, ActionCallback)>,
    snapshots: Vec<(ObserverId, SnapshotCallback)>,
    reactions: Vec<(ObserverId, ReactionCallback)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("actions", &self.actions.len())
            .field("snapshots", &self.snapshots.len())
            .field("reactions", &self.reactions.len())
            .finish()
    }
}

impl Observers {
    fn allocate(&mut self) -> ObserverId {
        self.next_id += 1;
        ObserverId(self.next_id)
    }

    pub(crate) fn add_action(&mut self, callback: ActionCallback) -> ObserverId {
        let id = self.allocate();
        self.actions.push((id, callback));
        id
    }

    pub(crate) fn add_snapshot(&mut self, callback: SnapshotCallback) -> ObserverId {
        let id = self.allocate();
        self.snapshots.push((id, callback));
        id
    }

    pub(crate) fn add_reaction(&mut self, callback: ReactionCallback) -> ObserverId {
        let id = self.allocate();
        self.reactions.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.len();
        self.actions.retain(|(i, _)| *i != id);
        self.snapshots.retain(|(i, _)| *i != id);
        self.reactions.retain(|(i, _)| *i != id);
        self.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.actions.len() + self.snapshots.len() + self.reactions.len()
    }

    pub(crate) fn emit_action(&mut self, event: &ActionEvent) {
        for (_, callback) in self.actions.iter_mut() {
            callback(event);
        }
    }

    pub(crate) fn wants_snapshots(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub(crate) fn emit_snapshot(&mut self, snapshot: &ParentSnapshot) {
        for (_, callback) in self.snapshots.iter_mut() {
            callback(snapshot);
        }
    }

    /// Reactions need the tree itself, so the caller takes them out for the
    /// duration of the run and puts them back afterwards.
    pub(crate) fn take_reactions(&mut self) -> Vec<(ObserverId, ReactionCallback)> {
        std::mem::take(&mut self.reactions)
    }

    pub(crate) fn restore_reactions(&mut self, reactions: Vec<(ObserverId, ReactionCallback)>) {
        self.reactions = reactions;
    }
}
