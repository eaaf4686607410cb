use crate::error::{Result, TopicStoreError};
use crate::lock::GroupLockRegistry;
use crate::sequencer;
use crate::types::{DeleteOutcome, NewTurn, RenameOutcome};
use chrono::Utc;
use converse_protocol::labels::{is_self_or_descendant, replace_prefix, validate_path};
use converse_protocol::{Deadline, OrderKey, Tenant, TopicPath, Turn};
use std::collections::HashMap;
use std::sync::RwLock;

/// Default history page size, matching the original conversation views.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Default)]
struct TenantState {
    paths: HashMap<i64, TopicPath>,
    turns: HashMap<i64, Turn>,
    next_path_id: i64,
    next_turn_id: i64,
}

impl TenantState {
    fn alloc_path_id(&mut self) -> i64 {
        self.next_path_id += 1;
        self.next_path_id
    }

    fn alloc_turn_id(&mut self) -> i64 {
        self.next_turn_id += 1;
        self.next_turn_id
    }

    fn group_paths(&self, group_id: i64) -> impl Iterator<Item = &TopicPath> {
        self.paths.values().filter(move |p| p.group_id == group_id)
    }

    fn topic_turns(&self, topic_id: i64) -> impl Iterator<Item = &Turn> {
        self.turns.values().filter(move |t| t.topic_id == topic_id)
    }
}

/// Tenant-partitioned store for the topic namespace and turn sequences.
///
/// Mutations of a group's path tree run under that group's advisory lock, so
/// overlapping rename/delete cascades are serialized and sibling-index
/// allocation cannot race. Turn creation instead relies on the
/// `(topic, turn_index)` uniqueness check plus one automatic retry.
pub struct TopicStore {
    tenants: RwLock<HashMap<String, TenantState>>,
    group_locks: GroupLockRegistry,
}

impl TopicStore {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
            group_locks: GroupLockRegistry::default(),
        }
    }

    fn read_tenant<R>(&self, tenant: &Tenant, f: impl FnOnce(Option<&TenantState>) -> R) -> R {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        f(tenants.get(tenant.schema()))
    }

    fn write_tenant<R>(&self, tenant: &Tenant, f: impl FnOnce(&mut TenantState) -> R) -> R {
        let mut tenants = self.tenants.write().unwrap_or_else(|e| e.into_inner());
        f(tenants.entry(tenant.schema().to_string()).or_default())
    }

    // --- topic path namespace ---

    /// Creates a new path in the group's namespace. The sibling index is
    /// computed inside the group's critical section together with the insert,
    /// so concurrent creates never share an index.
    pub async fn create_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        label_path: &str,
        creator_id: i64,
        deadline: Deadline,
    ) -> Result<TopicPath> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        validate_path(label_path)?;

        let _guard = self.group_locks.acquire(tenant, group_id).await;
        self.write_tenant(tenant, |state| {
            if state.group_paths(group_id).any(|p| p.path == label_path) {
                return Err(TopicStoreError::DuplicatePath {
                    path: label_path.to_string(),
                    group_id,
                });
            }

            let sibling_index = state
                .group_paths(group_id)
                .map(|p| p.sibling_index)
                .max()
                .unwrap_or(0)
                + 1;
            let id = state.alloc_path_id();
            let created = TopicPath {
                id,
                path: label_path.to_string(),
                group_id,
                sibling_index,
                created_by: creator_id,
                created_at: Utc::now(),
            };
            state.paths.insert(id, created.clone());
            log::info!(
                "created topic path '{}' (id {}, group {}, index {})",
                created.path,
                created.id,
                group_id,
                sibling_index
            );
            Ok(created)
        })
    }

    /// Renames a path and every descendant in one shot, splicing the new
    /// prefix in place of the old one. All-or-nothing: every new path is
    /// computed and collision-checked before anything is written. Ids and
    /// sibling indexes are untouched, which is why turns reference topics by
    /// id and survive renames.
    pub async fn rename_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        old_path: &str,
        new_path: &str,
        deadline: Deadline,
    ) -> Result<RenameOutcome> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        validate_path(old_path)?;
        validate_path(new_path)?;

        let _guard = self.group_locks.acquire(tenant, group_id).await;
        self.write_tenant(tenant, |state| {
            if state.group_paths(group_id).any(|p| p.path == new_path) {
                return Err(TopicStoreError::DuplicatePath {
                    path: new_path.to_string(),
                    group_id,
                });
            }

            let moves: Vec<(i64, String)> = state
                .group_paths(group_id)
                .filter(|p| is_self_or_descendant(&p.path, old_path))
                .map(|p| (p.id, replace_prefix(&p.path, old_path, new_path)))
                .collect();
            if moves.is_empty() {
                return Err(TopicStoreError::NotFound(format!(
                    "topic path '{old_path}' in group {group_id}"
                )));
            }

            // A spliced path may collide with an untouched sibling subtree,
            // e.g. renaming `a` to `b` while `b.c` already exists.
            for (id, spliced) in &moves {
                let collides = state
                    .group_paths(group_id)
                    .any(|p| p.id != *id && !is_self_or_descendant(&p.path, old_path) && p.path == *spliced);
                if collides {
                    return Err(TopicStoreError::DuplicatePath {
                        path: spliced.clone(),
                        group_id,
                    });
                }
            }

            let mut paths = Vec::with_capacity(moves.len());
            for (id, spliced) in moves {
                if let Some(row) = state.paths.get_mut(&id) {
                    row.path = spliced.clone();
                }
                paths.push(spliced);
            }
            paths.sort();
            log::info!(
                "renamed '{}' -> '{}' in group {} ({} paths)",
                old_path,
                new_path,
                group_id,
                paths.len()
            );
            Ok(RenameOutcome {
                updated_count: paths.len(),
                paths,
            })
        })
    }

    /// Deletes a path and every descendant, cascading to the turns that
    /// reference the removed topics. Runs entirely inside the group's
    /// critical section.
    pub async fn delete_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        path: &str,
        deadline: Deadline,
    ) -> Result<DeleteOutcome> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        validate_path(path)?;

        let _guard = self.group_locks.acquire(tenant, group_id).await;
        self.write_tenant(tenant, |state| {
            let doomed: Vec<(i64, String)> = state
                .group_paths(group_id)
                .filter(|p| is_self_or_descendant(&p.path, path))
                .map(|p| (p.id, p.path.clone()))
                .collect();
            if doomed.is_empty() {
                return Err(TopicStoreError::NotFound(format!(
                    "topic path '{path}' in group {group_id}"
                )));
            }

            let topic_ids: Vec<i64> = doomed.iter().map(|(id, _)| *id).collect();
            for id in &topic_ids {
                state.paths.remove(id);
            }

            let turn_ids: Vec<i64> = state
                .turns
                .values()
                .filter(|t| topic_ids.contains(&t.topic_id))
                .map(|t| t.id)
                .collect();
            for id in &turn_ids {
                state.turns.remove(id);
            }

            let mut paths: Vec<String> = doomed.into_iter().map(|(_, p)| p).collect();
            paths.sort();
            log::info!(
                "deleted '{}' in group {} ({} paths, {} turns)",
                path,
                group_id,
                paths.len(),
                turn_ids.len()
            );
            Ok(DeleteOutcome {
                deleted_count: paths.len(),
                paths,
                turn_ids,
            })
        })
    }

    /// All paths in the group, sorted lexicographically; clients rebuild the
    /// tree by splitting on the separator.
    pub fn list_paths(
        &self,
        tenant: &Tenant,
        group_id: i64,
        deadline: Deadline,
    ) -> Result<Vec<TopicPath>> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        self.read_tenant(tenant, |state| {
            let mut paths: Vec<TopicPath> = state
                .map(|s| s.group_paths(group_id).cloned().collect())
                .unwrap_or_default();
            paths.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(paths)
        })
    }

    pub fn get_topic(&self, tenant: &Tenant, topic_id: i64) -> Result<TopicPath> {
        self.read_tenant(tenant, |state| {
            state
                .and_then(|s| s.paths.get(&topic_id))
                .cloned()
                .ok_or_else(|| TopicStoreError::NotFound(format!("topic {topic_id}")))
        })
    }

    // --- turn sequencing ---

    /// Next append key for the topic: strictly greater than the current
    /// maximum, `1` when the history is empty.
    pub fn next_index(
        &self,
        tenant: &Tenant,
        topic_id: i64,
        deadline: Deadline,
    ) -> Result<OrderKey> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        validate_topic_id(topic_id)?;
        self.read_tenant(tenant, |state| {
            let state = state
                .filter(|s| s.paths.contains_key(&topic_id))
                .ok_or_else(|| TopicStoreError::NotFound(format!("topic {topic_id}")))?;
            Ok(sequencer::append_key(
                state.topic_turns(topic_id).map(|t| t.turn_index).max(),
            ))
        })
    }

    /// Creates a turn, computing its ordering key server-side. Anchored turns
    /// (comments) land strictly between the anchor and its immediate
    /// successor. A concurrent insert into the same gap trips the uniqueness
    /// check and is retried exactly once with a fresh key before surfacing a
    /// conflict. Existing keys are never rewritten.
    pub fn create_turn(&self, tenant: &Tenant, new: NewTurn, deadline: Deadline) -> Result<Turn> {
        validate_topic_id(new.topic_id)?;
        if new.content_text.trim().is_empty() {
            return Err(TopicStoreError::Validation(
                "content_text must not be empty".to_string(),
            ));
        }
        if let Some(anchor_id) = new.anchor_turn_id {
            if anchor_id <= 0 {
                return Err(TopicStoreError::Validation(format!(
                    "malformed anchor turn id {anchor_id}"
                )));
            }
        }

        let mut attempt = 0;
        loop {
            if deadline.expired() {
                return Err(TopicStoreError::Timeout);
            }
            let key = self.compute_turn_key(tenant, &new)?;
            match self.try_insert_turn(tenant, &new, key) {
                Err(TopicStoreError::Conflict(reason)) if attempt == 0 => {
                    log::warn!(
                        "turn index collision on topic {} ({reason}), retrying once",
                        new.topic_id
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Read phase of turn creation: resolve the ordering key from current
    /// state. Deliberately a separate critical section from the insert, the
    /// same read-then-write shape a relational store has.
    fn compute_turn_key(&self, tenant: &Tenant, new: &NewTurn) -> Result<OrderKey> {
        self.read_tenant(tenant, |state| {
            let state = state
                .filter(|s| s.paths.contains_key(&new.topic_id))
                .ok_or_else(|| TopicStoreError::NotFound(format!("topic {}", new.topic_id)))?;

            let Some(anchor_id) = new.anchor_turn_id else {
                return Ok(sequencer::append_key(
                    state.topic_turns(new.topic_id).map(|t| t.turn_index).max(),
                ));
            };

            let anchor = state
                .turns
                .get(&anchor_id)
                .ok_or_else(|| TopicStoreError::NotFound(format!("turn {anchor_id}")))?;
            if anchor.topic_id != new.topic_id {
                return Err(TopicStoreError::Validation(format!(
                    "anchor turn {anchor_id} belongs to topic {}, not {}",
                    anchor.topic_id, new.topic_id
                )));
            }

            let successor = state
                .topic_turns(new.topic_id)
                .map(|t| t.turn_index)
                .filter(|k| *k > anchor.turn_index)
                .min();
            Ok(sequencer::insert_between(anchor.turn_index, successor)?)
        })
    }

    fn try_insert_turn(&self, tenant: &Tenant, new: &NewTurn, key: OrderKey) -> Result<Turn> {
        self.write_tenant(tenant, |state| {
            if !state.paths.contains_key(&new.topic_id) {
                return Err(TopicStoreError::NotFound(format!("topic {}", new.topic_id)));
            }
            // Unique (topic, turn_index): detect a concurrent insert into the
            // same gap rather than silently stacking two turns on one key.
            if state
                .topic_turns(new.topic_id)
                .any(|t| t.turn_index == key)
            {
                return Err(TopicStoreError::Conflict(format!(
                    "turn_index {key} already taken"
                )));
            }

            let id = state.alloc_turn_id();
            let turn = Turn {
                id,
                topic_id: new.topic_id,
                author_kind: new.author_kind,
                turn_index: key,
                content_text: new.content_text.clone(),
                content_vector: new.content_vector.clone(),
                turn_kind: new.turn_kind,
                created_at: Utc::now(),
            };
            state.turns.insert(id, turn.clone());
            log::debug!(
                "created turn {} on topic {} at index {}",
                id,
                new.topic_id,
                key
            );
            Ok(turn)
        })
    }

    /// Topic history ordered by turn index ascending.
    pub fn list_turns(
        &self,
        tenant: &Tenant,
        topic_id: i64,
        limit: Option<usize>,
        deadline: Deadline,
    ) -> Result<Vec<Turn>> {
        if deadline.expired() {
            return Err(TopicStoreError::Timeout);
        }
        validate_topic_id(topic_id)?;
        self.read_tenant(tenant, |state| {
            let state = state
                .filter(|s| s.paths.contains_key(&topic_id))
                .ok_or_else(|| TopicStoreError::NotFound(format!("topic {topic_id}")))?;
            let mut turns: Vec<Turn> = state.topic_turns(topic_id).cloned().collect();
            turns.sort_by_key(|t| t.turn_index);
            turns.truncate(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
            Ok(turns)
        })
    }

    pub fn get_turn(&self, tenant: &Tenant, turn_id: i64) -> Result<Turn> {
        self.read_tenant(tenant, |state| {
            state
                .and_then(|s| s.turns.get(&turn_id))
                .cloned()
                .ok_or_else(|| TopicStoreError::NotFound(format!("turn {turn_id}")))
        })
    }
}

impl Default for TopicStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_topic_id(topic_id: i64) -> Result<()> {
    if topic_id <= 0 {
        return Err(TopicStoreError::Validation(format!(
            "malformed topic id {topic_id}"
        )));
    }
    Ok(())
}
