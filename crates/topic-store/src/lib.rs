//! # Converse Topic Store
//!
//! Hierarchical topic namespace and turn sequencing for the conversation
//! core.
//!
//! Topics form a materialized-path tree (`grandparent.parent.child`) scoped
//! to a tenant schema and a group. Renames splice the matching prefix on the
//! whole subtree in one shot; deletes cascade the same way. Turns within a
//! topic are ordered by a rational [`OrderKey`](converse_protocol::OrderKey),
//! so comments can be threaded between existing turns without renumbering
//! anything.
//!
//! All namespace mutations for a group run under that group's advisory lock;
//! turn creation relies on `(topic, turn_index)` uniqueness plus a single
//! automatic retry.

mod error;
mod lock;
pub mod sequencer;
mod store;
mod types;

pub use error::{Result, TopicStoreError};
pub use lock::{group_lock_wait_ms_last, group_lock_wait_ms_max};
pub use store::{TopicStore, DEFAULT_HISTORY_LIMIT};
pub use types::{DeleteOutcome, NewTurn, RenameOutcome};
