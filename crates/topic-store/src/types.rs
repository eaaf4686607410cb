use converse_protocol::{AuthorKind, TurnKind};
use serde::{Deserialize, Serialize};

/// Result of a cascading rename: the exact node plus every descendant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub updated_count: usize,
    pub paths: Vec<String>,
}

/// Result of a cascading delete. `turn_ids` lists the turns removed with the
/// subtree; callers use it to purge secondary indexes and it is not part of
/// the client-facing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_count: usize,
    pub paths: Vec<String>,
    #[serde(skip)]
    pub turn_ids: Vec<i64>,
}

/// Input for turn creation. The store computes `turn_index` itself: appended
/// turns get the next key, comments with an anchor get a key in the gap after
/// the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub topic_id: i64,
    pub author_kind: AuthorKind,
    pub content_text: String,
    pub content_vector: Option<Vec<f32>>,
    pub turn_kind: TurnKind,
    pub anchor_turn_id: Option<i64>,
}
