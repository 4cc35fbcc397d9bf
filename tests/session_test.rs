//! Session lifecycle: schema snapshot, refresh, close

mod common;

use common::{output_rows, test_config, FakeGraph, Reply, ScriptedLlm};
use cypher_qa::schema::NODE_PROPERTIES_QUERY;
use cypher_qa::{QaError, QaSession};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_schema_snapshot_at_construction() {
    let session = QaSession::with_backends(
        Arc::new(FakeGraph::new()),
        Arc::new(ScriptedLlm::new(&[])),
        &test_config(),
    )
    .await
    .unwrap();

    let labels: Vec<&str> = session
        .schema()
        .node_properties
        .iter()
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, ["Person", "Movie"]);
    assert!(session.grounding().contains("{labels: Person, properties: [age, name]}"));
    assert!(session.grounding().contains("{type: ACTED_IN, properties: [roles]}"));
}

#[tokio::test]
async fn test_unreachable_schema_source_is_fatal() {
    let graph = FakeGraph::new();
    graph.reply(NODE_PROPERTIES_QUERY, Reply::Unavailable);

    let result = QaSession::with_backends(
        Arc::new(graph),
        Arc::new(ScriptedLlm::new(&[])),
        &test_config(),
    )
    .await;

    assert!(matches!(result, Err(QaError::Database(_))));
}

#[tokio::test]
async fn test_refresh_replaces_snapshot() {
    let graph = Arc::new(FakeGraph::new());
    let mut session = QaSession::with_backends(
        graph.clone(),
        Arc::new(ScriptedLlm::new(&[])),
        &test_config(),
    )
    .await
    .unwrap();
    let before = session.schema().clone();

    graph.reply(
        NODE_PROPERTIES_QUERY,
        Reply::Rows(output_rows(vec![json!({"labels": "Company", "properties": ["name"]})])),
    );
    session.refresh_schema().await.unwrap();

    assert_ne!(session.schema(), &before);
    assert_eq!(session.schema().node_properties.len(), 1);
    assert_eq!(session.schema().node_properties[0].label, "Company");
    assert!(session.grounding().contains("{labels: Company, properties: [name]}"));
    assert!(!session.grounding().contains("{labels: Person"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_snapshot() {
    let graph = Arc::new(FakeGraph::new());
    let mut session = QaSession::with_backends(
        graph.clone(),
        Arc::new(ScriptedLlm::new(&[])),
        &test_config(),
    )
    .await
    .unwrap();
    let before = session.grounding().to_string();

    graph.reply(NODE_PROPERTIES_QUERY, Reply::Unavailable);
    assert!(session.refresh_schema().await.is_err());
    assert_eq!(session.grounding(), before);
}

#[tokio::test]
async fn test_close_releases_database() {
    let graph = Arc::new(FakeGraph::new());
    let session = QaSession::with_backends(
        graph.clone(),
        Arc::new(ScriptedLlm::new(&[])),
        &test_config(),
    )
    .await
    .unwrap();

    session.close().await.unwrap();
    assert!(graph.is_closed());
}
