//! Application services

pub mod factory;
pub mod replay;

pub use factory::{ParentFactory, DEFAULT_COUNT};
pub use replay::{default_script, load_script, replay, ActionRecorder};
