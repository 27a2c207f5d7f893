use tag_graph::graph::EntityKind;
use tag_graph::{CommandKind, GraphEngine, StatusCode};

async fn social() -> GraphEngine {
    let engine = GraphEngine::new();
    let batch = engine
        .execute(
            "add node key=user1 set name=Ann,active; \
             add node key=user2 set name=Bob; \
             add node key=user3 set name=Cid,active; \
             add node key=doc1 set title=plan; \
             add node key=doc2 set title=report; \
             add edge from=user1 to=user2 type=knows; \
             add edge from=user2 to=user3 type=knows; \
             add edge from=user1 to=doc1 type=owns set role=author; \
             add edge from=user3 to=doc2 type=owns;",
        )
        .await;
    assert!(batch.is_ok(), "{:?}", batch.error);
    engine
}

fn keys(result: &tag_graph::QueryResult) -> Vec<&str> {
    result.nodes.iter().map(|n| n.key.as_str()).collect()
}

#[tokio::test]
async fn test_add_then_select_round_trips_tags() {
    let engine = GraphEngine::new();
    engine.execute("add node key=node1 set t1,t2=v2;").await;
    let batch = engine.execute("select (key=node1);").await;
    let result = batch.default_result().unwrap();
    assert_eq!(result.kind, CommandKind::Select);
    assert_eq!(result.nodes.len(), 1);
    assert_eq!(result.nodes[0].tags.to_string(), "t1,t2=v2");
}

#[tokio::test]
async fn test_tag_filters() {
    let engine = social().await;

    let batch = engine.execute("select (active);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user1", "user3"]);

    // keys are case-insensitive, values are not
    let batch = engine.execute("select (NAME=Bob);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user2"]);
    let batch = engine.execute("select (name=bob);").await;
    assert!(batch.default_result().unwrap().nodes.is_empty());

    let batch = engine.execute("select (name=*n, active);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user1"]);
}

#[tokio::test]
async fn test_key_glob() {
    let engine = social().await;
    let batch = engine.execute("select (key=doc*);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["doc1", "doc2"]);

    // node keys are case-sensitive
    let batch = engine.execute("select (key=DOC*);").await;
    assert!(batch.default_result().unwrap().nodes.is_empty());
}

#[tokio::test]
async fn test_multi_hop_traversal() {
    let engine = social().await;
    let batch = engine
        .execute("select (key=user1) -> [type=knows] -> (*) -> [type=knows] -> (*);")
        .await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user3"]);

    let batch = engine.execute("select (active) -> [type=owns] -> (title);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["doc1", "doc2"]);
}

#[tokio::test]
async fn test_adjacent_node_steps() {
    let engine = social().await;
    let batch = engine.execute("select (key=user2) -> (*);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user3"]);

    let batch = engine.execute("select (key=user2) <- (*);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user1"]);

    let batch = engine.execute("select (key=user2) <-> (*);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user1", "user3"]);
}

#[tokio::test]
async fn test_reverse_from_documents() {
    let engine = social().await;
    let batch = engine.execute("select (title=report) <- [*] <- (*);").await;
    assert_eq!(keys(batch.default_result().unwrap()), vec!["user3"]);
}

#[tokio::test]
async fn test_edge_result_and_tag_filter() {
    let engine = social().await;
    let batch = engine.execute("select (key=user1) -> [role=author];").await;
    let result = batch.default_result().unwrap();
    assert!(result.nodes.is_empty());
    assert_eq!(result.edges.len(), 1);
    assert_eq!(result.edges[0].to_key, "doc1");
}

#[tokio::test]
async fn test_step_aliases_get_slots() {
    let engine = social().await;
    let batch = engine
        .execute("select (key=user1) owner -> [type=owns] owned -> (*) docs;")
        .await;

    assert!(batch.default_result().is_none());
    assert_eq!(keys(batch.get("owner").unwrap()), vec!["user1"]);
    assert_eq!(batch.get("owned").unwrap().edges.len(), 1);
    assert_eq!(keys(batch.get("docs").unwrap()), vec!["doc1"]);

    let docs = batch.get("docs").unwrap();
    let kinds: Vec<EntityKind> = docs.selections.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![EntityKind::Node, EntityKind::Edge, EntityKind::Node]);
}

#[tokio::test]
async fn test_default_slot_holds_latest_unaliased_result() {
    let engine = social().await;
    let batch = engine
        .execute("select (key=user1); select (key=user2) mine; select (key=doc1);")
        .await;
    assert_eq!(batch.len(), 3);
    assert_eq!(keys(batch.default_result().unwrap()), vec!["doc1"]);
    assert_eq!(keys(batch.get("mine").unwrap()), vec!["user2"]);
}

#[tokio::test]
async fn test_write_aliases() {
    let engine = GraphEngine::new();
    let batch = engine
        .execute("add node key=a created; upsert node key=b; update node key=a set x before;")
        .await;
    assert_eq!(batch.get("created").unwrap().kind, CommandKind::AddNode);
    assert_eq!(batch.default_result().unwrap().kind, CommandKind::AddNode);
    let before = batch.get("before").unwrap();
    assert_eq!(before.prior_tags.as_ref().unwrap().to_string(), "");
    assert_eq!(before.nodes[0].tags.to_string(), "x");
}

#[tokio::test]
async fn test_pattern_delete() {
    let engine = social().await;
    let batch = engine.execute("delete (key=user1) -> [type=owns] -> (*);").await;
    assert!(batch.is_ok());
    assert_eq!(batch.items[0].kind, CommandKind::DeleteNode);

    let graph = engine.snapshot().await;
    assert!(graph.node("doc1").is_none());
    assert!(graph.node("user1").is_some());
    assert_eq!(graph.edges.len(), 3);
}

#[tokio::test]
async fn test_pattern_delete_of_edges() {
    let engine = social().await;
    let batch = engine.execute("delete [type=knows];").await;
    assert_eq!(batch.items[0].kind, CommandKind::DeleteEdge);
    assert_eq!(batch.items[0].edges.len(), 2);

    let graph = engine.snapshot().await;
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.nodes.len(), 5);
}

#[tokio::test]
async fn test_keyed_delete_status() {
    let engine = social().await;
    let batch = engine.execute("delete node key=ghost;").await;
    assert_eq!(batch.status, StatusCode::NotFound);

    let batch = engine.execute("delete node key=ghost ifexist;").await;
    assert!(batch.is_ok());

    let batch = engine.execute("delete edge from=user1 to=user2 type=knows;").await;
    assert!(batch.is_ok());
    assert_eq!(engine.snapshot().await.edges.len(), 3);
}
