use tempfile::TempDir;

use appforest_core::control::{FileTreeSource, TreeSource};
use appforest_core::error::TreeSourceError;
use appforest_core::tree::Forest;

#[tokio::test]
async fn loads_saved_jolokia_response() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.json");
    std::fs::write(
        &path,
        r#"{
            "request": {"type": "read"},
            "status": 200,
            "timestamp": 1700000000,
            "value": [
                {"name": "platform-app", "state": "ACTIVE", "version": "2.9.1", "children": [
                    {"name": "catalog-app", "state": "ACTIVE", "version": "2.9.1", "children": [
                        {"name": "spatial-app", "state": "RESOLVED", "version": "2.9.1", "children": []}
                    ]}
                ]},
                {"name": "solr-app", "state": "INSTALLED", "version": "2.9.1"}
            ]
        }"#,
    )
    .unwrap();

    let roots = FileTreeSource::new(&path).fetch_tree().await.unwrap();
    let forest = Forest::from_snapshots(&roots);

    assert_eq!(forest.len(), 4);
    assert_eq!(forest.roots().len(), 2);
    let spatial = forest.find("spatial-app").unwrap();
    assert_eq!(forest.depth(spatial), 2);
    assert!(!forest.node(spatial).selected());
    assert!(forest.node(forest.find("catalog-app").unwrap()).selected());
}

#[tokio::test]
async fn invalid_json_is_decode_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = FileTreeSource::new(&path).fetch_tree().await.unwrap_err();
    assert!(matches!(err, TreeSourceError::Decode(_)));
}
