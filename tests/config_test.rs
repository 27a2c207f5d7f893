use std::io::Write;
use tag_graph::{ConfigError, EngineConfig, GraphEngine, StatusCode};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_batch_size: 10\nmax_nodes: 100\ndata_extension: bin").unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.max_batch_size, Some(10));
    assert_eq!(config.max_nodes, Some(100));
    assert_eq!(config.max_edges, None);
    assert_eq!(config.data_extension, "bin");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_bad_extension() {
    let err = EngineConfig::from_yaml_str("data_extension: a/b").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[tokio::test]
async fn test_node_quota_is_conflict() {
    let engine = GraphEngine::with_config(EngineConfig {
        max_nodes: Some(2),
        ..Default::default()
    });
    assert!(engine.execute("add node key=a; add node key=b;").await.is_ok());

    let batch = engine.execute("add node key=c;").await;
    assert_eq!(batch.status, StatusCode::Conflict);
    assert!(batch.error.unwrap().contains("nodes (2/2)"));

    // freeing a slot makes room again
    assert!(engine.execute("delete node key=a; add node key=c;").await.is_ok());
}

#[tokio::test]
async fn test_edge_quota_covers_foreign_keys() {
    let engine = GraphEngine::with_config(EngineConfig {
        max_edges: Some(1),
        ..Default::default()
    });
    engine.execute("add node key=A; add node key=B;").await;

    let batch = engine
        .execute("add node key=u set r1=A,r2=B foreignkey ref=r*;")
        .await;
    assert_eq!(batch.status, StatusCode::Conflict);
    assert!(engine.snapshot().await.node("u").is_none());

    assert!(engine
        .execute("add node key=u set r1=A foreignkey ref=r*;")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_data_extension_names_blobs() {
    let blobs = std::sync::Arc::new(tag_graph::MemoryBlobStore::new());
    let engine = GraphEngine::with_config(EngineConfig {
        data_extension: "dat".to_string(),
        ..Default::default()
    })
    .with_blob_store(blobs.clone());

    engine.execute(r#"add node key=n data doc = {"x": 1};"#).await;
    let graph = engine.snapshot().await;
    let link = &graph.node("n").unwrap().data_map["doc"];
    assert_eq!(link.file_id.as_str(), "node/n/n___doc.dat");
    assert_eq!(blobs.len().await, 1);
}
