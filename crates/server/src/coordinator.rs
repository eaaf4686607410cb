use converse_protocol::{Deadline, ErrorCode, RelatedTurn, Tenant, TopicPath, Turn, TurnRef};
use converse_topic_store::{DeleteOutcome, NewTurn, RenameOutcome, TopicStore, TopicStoreError};
use converse_vector_store::{
    FindOptions, FinderConfig, RelatedTurnFinder, VectorCodec, VectorStoreError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Single error surface of the facade. Store errors are wrapped here and
/// reduced to a stable [`ErrorCode`]; the raw detail is logged server-side
/// and never leaks to clients.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error(transparent)]
    Store(#[from] TopicStoreError),

    #[error(transparent)]
    Vector(#[from] VectorStoreError),
}

impl CoordinatorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoordinatorError::Store(err) => match err {
                TopicStoreError::Syntax(_) | TopicStoreError::Validation(_) => {
                    ErrorCode::Validation
                }
                TopicStoreError::DuplicatePath { .. } => ErrorCode::Duplicate,
                TopicStoreError::NotFound(_) => ErrorCode::NotFound,
                TopicStoreError::Conflict(_) => ErrorCode::Conflict,
                TopicStoreError::IndexExhausted(_) => ErrorCode::IndexExhausted,
                TopicStoreError::Timeout => ErrorCode::Timeout,
                TopicStoreError::Other(_) => ErrorCode::Internal,
            },
            CoordinatorError::Vector(err) => match err {
                VectorStoreError::InvalidDimension { .. } | VectorStoreError::Decode(_) => {
                    ErrorCode::Validation
                }
                VectorStoreError::Timeout => ErrorCode::Timeout,
                VectorStoreError::Other(_) => ErrorCode::Internal,
            },
        }
    }

    /// Message safe to show a client. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Turn-creation request as the facade accepts it. The ordering key is always
/// computed server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTurnRequest {
    pub topic_id: i64,
    pub author_kind: converse_protocol::AuthorKind,
    pub content_text: String,
    #[serde(default)]
    pub content_vector: Option<Vec<f32>>,
    pub turn_kind: converse_protocol::TurnKind,
    #[serde(default)]
    pub anchor_turn_id: Option<i64>,
}

/// A related-turn hit hydrated with its content and topic path for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedTurnDetail {
    #[serde(flatten)]
    pub related: RelatedTurn,
    pub topic_path: Option<String>,
    pub content_text: String,
}

/// API facade composing the namespace store, the sequencer, and the
/// similarity index. Request-scoped: every call gets a fresh deadline and an
/// explicit tenant capability.
pub struct Coordinator {
    store: TopicStore,
    finder: RelatedTurnFinder,
    codec: VectorCodec,
    request_timeout: Duration,
}

impl Coordinator {
    pub fn new(finder_config: FinderConfig, request_timeout: Duration) -> Self {
        let finder = RelatedTurnFinder::new(finder_config);
        let codec = finder.codec();
        Self {
            store: TopicStore::new(),
            finder,
            codec,
            request_timeout,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::within(self.request_timeout)
    }

    pub async fn create_topic_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        path: &str,
        participant_id: i64,
    ) -> Result<TopicPath> {
        Ok(self
            .store
            .create_path(tenant, group_id, path, participant_id, self.deadline())
            .await?)
    }

    pub async fn rename_topic_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        old_path: &str,
        new_path: &str,
    ) -> Result<RenameOutcome> {
        Ok(self
            .store
            .rename_path(tenant, group_id, old_path, new_path, self.deadline())
            .await?)
    }

    /// Deletes a subtree and purges the cascade-deleted turns from the
    /// similarity index.
    pub async fn delete_topic_path(
        &self,
        tenant: &Tenant,
        group_id: i64,
        path: &str,
    ) -> Result<DeleteOutcome> {
        let outcome = self
            .store
            .delete_path(tenant, group_id, path, self.deadline())
            .await?;
        if !outcome.turn_ids.is_empty() {
            self.finder.forget_turns(tenant, &outcome.turn_ids)?;
        }
        Ok(outcome)
    }

    pub fn list_topic_paths(&self, tenant: &Tenant, group_id: i64) -> Result<Vec<TopicPath>> {
        Ok(self.store.list_paths(tenant, group_id, self.deadline())?)
    }

    /// Persists a turn and indexes its embedding. A missing vector is stored
    /// as null and indexed as the zero sentinel, which search never surfaces.
    pub fn create_turn(&self, tenant: &Tenant, request: CreateTurnRequest) -> Result<Turn> {
        let normalized = request
            .content_vector
            .as_deref()
            .map(|v| self.codec.normalize(Some(v)));

        let turn = self.store.create_turn(
            tenant,
            NewTurn {
                topic_id: request.topic_id,
                author_kind: request.author_kind,
                content_text: request.content_text,
                content_vector: normalized.clone(),
                turn_kind: request.turn_kind,
                anchor_turn_id: request.anchor_turn_id,
            },
            self.deadline(),
        )?;

        let indexed = normalized.unwrap_or_else(|| self.codec.normalize(None));
        self.finder
            .index_turn(tenant, turn.id, turn.topic_id, turn.created_at, &indexed)?;
        Ok(turn)
    }

    pub fn get_history(
        &self,
        tenant: &Tenant,
        topic_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Turn>> {
        Ok(self
            .store
            .list_turns(tenant, topic_id, limit, self.deadline())?)
    }

    /// Cross-topic neighbors of an existing turn. A turn without an embedding
    /// has no similarity basis and yields an empty ranking. The querying turn
    /// is always excluded; its own topic is excluded unless the caller opts
    /// in to same-topic results.
    pub fn get_related(
        &self,
        tenant: &Tenant,
        turn_id: i64,
        limit: usize,
        include_own_topic: bool,
    ) -> Result<Vec<RelatedTurnDetail>> {
        let source = self.store.get_turn(tenant, turn_id)?;
        let Some(vector) = source.content_vector.as_deref() else {
            return Ok(Vec::new());
        };
        if VectorCodec::is_null_sentinel(vector) {
            return Ok(Vec::new());
        }

        let options = FindOptions {
            exclude_topic_id: (!include_own_topic).then_some(source.topic_id),
            exclude_turn_id: Some(turn_id),
            limit,
        };
        let hits = self
            .finder
            .find_related(tenant, vector, &options, self.deadline())?;

        let mut details = Vec::with_capacity(hits.len());
        for hit in hits {
            // The hit may reference a turn deleted since indexing; skip it
            // rather than failing the whole ranking.
            let Ok(turn) = self.store.get_turn(tenant, hit.turn_id) else {
                continue;
            };
            let topic_path = self
                .store
                .get_topic(tenant, hit.topic_id)
                .map(|t| t.path)
                .ok();
            details.push(RelatedTurnDetail {
                related: RelatedTurn {
                    turn: TurnRef {
                        turn_id: hit.turn_id,
                        topic_id: hit.topic_id,
                        created_at: hit.created_at,
                    },
                    score: hit.score,
                },
                topic_path,
                content_text: turn.content_text,
            });
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converse_protocol::{AuthorKind, TurnKind};
    use converse_vector_store::Metric;
    use pretty_assertions::assert_eq;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            FinderConfig {
                metric: Metric::Cosine,
                dimension: 4,
                distance_ceiling: None,
            },
            Duration::from_secs(5),
        )
    }

    fn turn_request(topic_id: i64, text: &str, vector: Option<Vec<f32>>) -> CreateTurnRequest {
        CreateTurnRequest {
            topic_id,
            author_kind: AuthorKind::Assistant,
            content_text: text.to_string(),
            content_vector: vector,
            turn_kind: TurnKind::Regular,
            anchor_turn_id: None,
        }
    }

    #[tokio::test]
    async fn related_turns_cross_topics_and_exclude_the_source_topic() {
        let coordinator = coordinator();
        let tenant = Tenant::default();
        let home = coordinator
            .create_topic_path(&tenant, 1, "home", 1)
            .await
            .unwrap();
        let other = coordinator
            .create_topic_path(&tenant, 1, "other", 1)
            .await
            .unwrap();

        let source = coordinator
            .create_turn(
                &tenant,
                turn_request(home.id, "source", Some(vec![1.0, 0.0, 0.0, 0.0])),
            )
            .unwrap();
        coordinator
            .create_turn(
                &tenant,
                turn_request(home.id, "same topic", Some(vec![1.0, 0.0, 0.0, 0.0])),
            )
            .unwrap();
        let neighbor = coordinator
            .create_turn(
                &tenant,
                turn_request(other.id, "neighbor", Some(vec![0.9, 0.1, 0.0, 0.0])),
            )
            .unwrap();
        coordinator
            .create_turn(&tenant, turn_request(other.id, "no vector", None))
            .unwrap();

        let related = coordinator
            .get_related(&tenant, source.id, 10, false)
            .unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].related.turn.turn_id, neighbor.id);
        assert_eq!(related[0].content_text, "neighbor");
        assert_eq!(related[0].topic_path.as_deref(), Some("other"));

        // Opting in to the source topic adds the same-topic hit but never
        // the source turn itself.
        let related = coordinator
            .get_related(&tenant, source.id, 10, true)
            .unwrap();
        let ids: Vec<i64> = related.iter().map(|r| r.related.turn.turn_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&source.id));
    }

    #[tokio::test]
    async fn vectorless_source_turn_yields_empty_ranking() {
        let coordinator = coordinator();
        let tenant = Tenant::default();
        let topic = coordinator
            .create_topic_path(&tenant, 1, "t", 1)
            .await
            .unwrap();
        let source = coordinator
            .create_turn(&tenant, turn_request(topic.id, "plain", None))
            .unwrap();
        assert!(coordinator
            .get_related(&tenant, source.id, 10, true)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_a_subtree_purges_its_turns_from_search() {
        let coordinator = coordinator();
        let tenant = Tenant::default();
        let keep = coordinator
            .create_topic_path(&tenant, 1, "keep", 1)
            .await
            .unwrap();
        let doomed = coordinator
            .create_topic_path(&tenant, 1, "doomed", 1)
            .await
            .unwrap();

        let source = coordinator
            .create_turn(
                &tenant,
                turn_request(keep.id, "source", Some(vec![1.0, 0.0, 0.0, 0.0])),
            )
            .unwrap();
        coordinator
            .create_turn(
                &tenant,
                turn_request(doomed.id, "will vanish", Some(vec![1.0, 0.0, 0.0, 0.0])),
            )
            .unwrap();

        assert_eq!(
            coordinator
                .get_related(&tenant, source.id, 10, false)
                .unwrap()
                .len(),
            1
        );

        coordinator
            .delete_topic_path(&tenant, 1, "doomed")
            .await
            .unwrap();
        assert!(coordinator
            .get_related(&tenant, source.id, 10, false)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn oversized_vectors_are_normalized_before_storage() {
        let coordinator = coordinator();
        let tenant = Tenant::default();
        let topic = coordinator
            .create_topic_path(&tenant, 1, "t", 1)
            .await
            .unwrap();
        let long: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let turn = coordinator
            .create_turn(&tenant, turn_request(topic.id, "long", Some(long)))
            .unwrap();
        assert_eq!(turn.content_vector.as_ref().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn error_codes_map_per_taxonomy() {
        let coordinator = coordinator();
        let tenant = Tenant::default();
        coordinator
            .create_topic_path(&tenant, 1, "a", 1)
            .await
            .unwrap();

        let err = coordinator
            .create_topic_path(&tenant, 1, "a", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Duplicate);

        let err = coordinator
            .create_topic_path(&tenant, 1, "bad path!", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        let err = coordinator
            .rename_topic_path(&tenant, 1, "missing", "x")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = coordinator.get_history(&tenant, 999, None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
