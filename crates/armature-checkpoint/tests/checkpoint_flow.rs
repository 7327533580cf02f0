use armature_checkpoint::{
    checkpoint_file_path, CheckpointManager, GenerationStatus,
};
use armature_graph::{Edge, EdgeType, Graph, Node, NodeLevel, NodeType, NodeId};
use tempfile::TempDir;

fn pipeline_graph() -> (Graph, Vec<NodeId>) {
    let mut graph = Graph::new();
    let mut ids = Vec::new();
    for name in ["schema", "store", "query"] {
        ids.push(
            graph
                .add_node(
                    Node::new(name, NodeLevel::Component, NodeType::Functionality)
                        .expect("node should construct"),
                )
                .expect("node should insert"),
        );
    }
    graph
        .add_edge(Edge::new(ids[0], ids[1], EdgeType::DataFlow).expect("edge"))
        .expect("edge should insert");
    graph
        .add_edge(Edge::new(ids[1], ids[2], EdgeType::DataFlow).expect("edge"))
        .expect("edge should insert");
    (graph, ids)
}

#[test]
fn checkpoint_file_expected_wire_format_shape() {
    let temp = TempDir::new().expect("temp dir should create");
    let (graph, ids) = pipeline_graph();
    let mut manager = CheckpointManager::new(graph, 2, checkpoint_file_path(temp.path()));
    manager.record_passed(ids[0]).expect("record should persist");
    manager
        .record_failed(ids[1], "generation timed out")
        .expect("record should persist");

    let raw = std::fs::read_to_string(manager.checkpoint_path()).expect("file should read");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("file must be valid JSON");

    assert_eq!(value["max_retries"], 2);
    let nodes = value["nodes"].as_object().expect("nodes must be a map");
    assert_eq!(nodes.len(), 3);
    let failed = &nodes[&ids[1].to_string()];
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["retry_count"], 1);
    assert_eq!(failed["failure_reason"], "generation timed out");
    let passed = &nodes[&ids[0].to_string()];
    assert_eq!(passed["status"], "passed");
}

#[test]
fn interrupted_run_expected_resumable_after_reload() {
    let temp = TempDir::new().expect("temp dir should create");
    let (graph, ids) = pipeline_graph();
    let path = checkpoint_file_path(temp.path());

    {
        let mut manager = CheckpointManager::new(graph.clone(), 3, &path);
        manager.record_passed(ids[0]).expect("record");
        manager.record_in_progress(ids[1]).expect("record");
        // process dies here; the in-progress node must not be lost
    }

    let restored =
        CheckpointManager::load_checkpoint(&path, graph.clone()).expect("checkpoint should load");
    let todo = restored.nodes_to_process();
    assert!(todo.contains(&ids[1]), "interrupted node must be reprocessed");
    assert!(todo.contains(&ids[2]));
    assert!(!todo.contains(&ids[0]));
}

#[test]
fn resume_after_reload_expected_downstream_reset_persisted() {
    let temp = TempDir::new().expect("temp dir should create");
    let (graph, ids) = pipeline_graph();
    let path = checkpoint_file_path(temp.path());

    let mut manager = CheckpointManager::new(graph.clone(), 3, &path);
    for id in &ids {
        manager.record_passed(*id).expect("record");
    }

    let mut restored =
        CheckpointManager::load_checkpoint(&path, graph.clone()).expect("checkpoint should load");
    let reset = restored.resume_from_node(ids[1]).expect("resume should succeed");
    let mut expected = vec![ids[1], ids[2]];
    expected.sort();
    assert_eq!(reset, expected);

    let reread = CheckpointManager::load_checkpoint(&path, graph).expect("checkpoint should load");
    assert_eq!(reread.state().status(ids[0]), GenerationStatus::Passed);
    assert_eq!(reread.state().status(ids[1]), GenerationStatus::Pending);
    assert_eq!(reread.state().status(ids[2]), GenerationStatus::Pending);
}
