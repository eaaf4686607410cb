//! Drives the coordinator the way the HTTP layer does and pins down the wire
//! shapes clients depend on.

use converse_protocol::{AuthorKind, Tenant, TurnKind};
use converse_server::{Coordinator, CreateTurnRequest};
use converse_vector_store::{FinderConfig, Metric};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn coordinator() -> Coordinator {
    Coordinator::new(
        FinderConfig {
            metric: Metric::Cosine,
            dimension: 8,
            distance_ceiling: Some(0.95),
        },
        Duration::from_secs(5),
    )
}

fn request(topic_id: i64, text: &str, anchor: Option<i64>) -> CreateTurnRequest {
    CreateTurnRequest {
        topic_id,
        author_kind: AuthorKind::Human,
        content_text: text.to_string(),
        content_vector: None,
        turn_kind: if anchor.is_some() {
            TurnKind::Comment
        } else {
            TurnKind::Regular
        },
        anchor_turn_id: anchor,
    }
}

#[tokio::test]
async fn topic_path_wire_shape() {
    let coordinator = coordinator();
    let tenant = Tenant::default();
    let created = coordinator
        .create_topic_path(&tenant, 1, "a.b", 42)
        .await
        .unwrap();

    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["path"], "a.b");
    assert_eq!(value["group_id"], 1);
    assert_eq!(value["index"], 1);
    assert!(value["id"].is_i64());
}

#[tokio::test]
async fn rename_outcome_wire_shape() {
    let coordinator = coordinator();
    let tenant = Tenant::default();
    coordinator
        .create_topic_path(&tenant, 1, "Bible-Study", 1)
        .await
        .unwrap();
    coordinator
        .create_topic_path(&tenant, 1, "Bible-Study.Chapter-1", 1)
        .await
        .unwrap();

    let outcome = coordinator
        .rename_topic_path(&tenant, 1, "Bible-Study", "Bible_Study")
        .await
        .unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["updatedCount"], 2);
    assert_eq!(
        value["paths"],
        serde_json::json!(["Bible_Study", "Bible_Study.Chapter-1"])
    );
}

#[tokio::test]
async fn delete_outcome_hides_internal_turn_ids() {
    let coordinator = coordinator();
    let tenant = Tenant::default();
    let topic = coordinator
        .create_topic_path(&tenant, 1, "a.b", 1)
        .await
        .unwrap();
    coordinator
        .create_topic_path(&tenant, 1, "a.b.c", 1)
        .await
        .unwrap();
    coordinator
        .create_turn(&tenant, request(topic.id, "hello", None))
        .unwrap();

    let outcome = coordinator.delete_topic_path(&tenant, 1, "a.b").await.unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["deletedCount"], 2);
    assert_eq!(value["paths"], serde_json::json!(["a.b", "a.b.c"]));
    assert!(value.get("turnIds").is_none());
    assert!(value.get("turn_ids").is_none());

    assert!(coordinator.list_topic_paths(&tenant, 1).unwrap().is_empty());
}

#[tokio::test]
async fn history_interleaves_comments_between_turns() {
    let coordinator = coordinator();
    let tenant = Tenant::default();
    let topic = coordinator
        .create_topic_path(&tenant, 1, "chat", 1)
        .await
        .unwrap();

    let first = coordinator
        .create_turn(&tenant, request(topic.id, "one", None))
        .unwrap();
    coordinator
        .create_turn(&tenant, request(topic.id, "two", None))
        .unwrap();
    coordinator
        .create_turn(&tenant, request(topic.id, "three", None))
        .unwrap();
    coordinator
        .create_turn(&tenant, request(topic.id, "between", Some(first.id)))
        .unwrap();

    let history = coordinator.get_history(&tenant, topic.id, None).unwrap();
    let indices: Vec<f64> = history.iter().map(|t| t.turn_index.value()).collect();
    assert_eq!(indices, vec![1.0, 1.5, 2.0, 3.0]);

    // Turn index serializes as a bare JSON number.
    let value = serde_json::to_value(&history[1]).unwrap();
    assert_eq!(value["turn_index"], 1.5);
    assert_eq!(value["turn_kind"], "comment");
}

#[tokio::test]
async fn tenants_never_see_each_other() {
    let coordinator = coordinator();
    let alpha = Tenant::new("alpha");
    let beta = Tenant::new("beta");

    coordinator
        .create_topic_path(&alpha, 1, "shared-name", 1)
        .await
        .unwrap();
    coordinator
        .create_topic_path(&beta, 1, "shared-name", 1)
        .await
        .unwrap();

    assert_eq!(coordinator.list_topic_paths(&alpha, 1).unwrap().len(), 1);
    coordinator.delete_topic_path(&beta, 1, "shared-name").await.unwrap();
    assert_eq!(coordinator.list_topic_paths(&alpha, 1).unwrap().len(), 1);
}
