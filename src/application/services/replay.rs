//! Action recording and replay
//!
//! Actions observed on one tree can be replayed onto another tree built from
//! the same snapshot shape.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{ActionEvent, ActionName, ObserverId, ParentTree};
use crate::infrastructure::traits::FileSystem;

/// Collects every action a tree emits.
#[derive(Debug, Clone, Default)]
pub struct ActionRecorder {
    actions: Rc<RefCell<Vec<ActionEvent>>>,
}

impl ActionRecorder {
    /// Registers a recorder on `tree`; remove it again with the returned id.
    pub fn attach(tree: &mut ParentTree) -> (Self, ObserverId) {
        let recorder = Self::default();
        let sink = Rc::clone(&recorder.actions);
        let id = tree.on_action(move |event| sink.borrow_mut().push(event.clone()));
        (recorder, id)
    }

    pub fn actions(&self) -> Vec<ActionEvent> {
        self.actions.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    pub fn to_json(&self) -> ApplicationResult<String> {
        serde_json::to_string_pretty(&*self.actions.borrow()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize actions".to_string(),
                source: Box::new(e),
            }
        })
    }
}

/// Applies `actions` in order; stops at the first one that does not fit.
pub fn replay(tree: &mut ParentTree, actions: &[ActionEvent]) -> ApplicationResult<usize> {
    for (index, action) in actions.iter().enumerate() {
        tree.apply_action(action)
            .map_err(|source| ApplicationError::Replay { index, source })?;
    }
    debug!("replayed {} actions", actions.len());
    Ok(actions.len())
}

/// Load a JSON array of actions.
pub fn load_script(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Vec<ActionEvent>> {
    let content = fs.read_to_string(path).with_path_context("read script", path)?;
    serde_json::from_str(&content).map_err(|e| ApplicationError::MalformedScript {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Root `set_num1(-1)`, first child `set_num(-2)`, first grandchild of the
/// second child `set_num(-3)`.
pub fn default_script() -> Vec<ActionEvent> {
    vec![
        ActionEvent::new(ActionName::SetNum1, "", vec![-1.0]),
        ActionEvent::new(ActionName::SetNum, "/children/0", vec![-2.0]),
        ActionEvent::new(ActionName::SetNum, "/children/1/children/0", vec![-3.0]),
    ]
}
