//! Observable parent/child/grandchild trees.
//!
//! A three-level hierarchy built from a JSON snapshot, with derived values
//! recomputed on read and synchronous observers notified after every
//! mutation.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
