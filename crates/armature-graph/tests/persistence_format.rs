use armature_graph::{
    load_graph, save_graph, Edge, EdgeType, Graph, Node, NodeLevel, NodeType, TestStatus,
};
use tempfile::TempDir;
use uuid::{uuid, Uuid};

const MODULE_ID: Uuid = uuid!("11111111-1111-1111-1111-111111111111");
const FEATURE_ID: Uuid = uuid!("22222222-2222-2222-2222-222222222222");

fn sample_graph() -> Graph {
    let mut graph = Graph::new();
    graph
        .metadata
        .insert("label".to_string(), "Billing plan".to_string());
    graph
        .add_node(
            Node::with_id(MODULE_ID, "billing", NodeLevel::Module, NodeType::FolderFunctionality)
                .expect("node should construct")
                .with_folder_path("src/billing"),
        )
        .expect("node should insert");
    graph
        .add_node(
            Node::with_id(FEATURE_ID, "invoice", NodeLevel::Feature, NodeType::FileFunctionality)
                .expect("node should construct")
                .with_parent(MODULE_ID)
                .expect("parent should attach")
                .with_file_path("src/billing/invoice.rs")
                .with_metadata("delta_status", "new"),
        )
        .expect("node should insert");
    graph
        .add_edge(
            Edge::new(MODULE_ID, FEATURE_ID, EdgeType::DataFlow)
                .expect("edge should construct")
                .with_data("accounts", "Vec<Account>"),
        )
        .expect("edge should insert");
    graph
}

#[test]
fn serialized_graph_expected_wire_format_shape() {
    let temp = TempDir::new().expect("temp dir should create");
    let path = temp.path().join("graph.json");
    save_graph(&sample_graph(), &path).expect("graph should save");

    let raw = std::fs::read_to_string(&path).expect("file should read");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("file must be valid JSON");

    let nodes = value["nodes"].as_array().expect("nodes must be an array");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["id"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(nodes[0]["level"], "module");
    assert_eq!(nodes[0]["node_type"], "folder_functionality");
    assert_eq!(nodes[1]["parent_id"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(nodes[1]["test_status"], "pending");
    assert_eq!(nodes[1]["metadata"]["delta_status"], "new");

    let edges = value["edges"].as_array().expect("edges must be an array");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["source_id"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(edges[0]["target_id"], "22222222-2222-2222-2222-222222222222");
    assert_eq!(edges[0]["edge_type"], "data_flow");
    assert_eq!(edges[0]["data_id"], "accounts");

    assert_eq!(value["metadata"]["label"], "Billing plan");
    assert!(raw.contains('\n'), "output must be pretty-printed");
}

#[test]
fn round_trip_expected_equal_graph() {
    let temp = TempDir::new().expect("temp dir should create");
    let path = temp.path().join("graph.json");
    let graph = sample_graph();
    save_graph(&graph, &path).expect("graph should save");
    assert_eq!(load_graph(&path).expect("graph should load"), graph);
}

#[test]
fn load_handwritten_document_expected_fields_reconstructed() {
    let temp = TempDir::new().expect("temp dir should create");
    let path = temp.path().join("plan.json");
    std::fs::write(
        &path,
        r#"{
  "nodes": [
    {
      "id": "33333333-3333-3333-3333-333333333333",
      "name": "parser",
      "level": "component",
      "node_type": "functionality",
      "test_status": "passed",
      "serena_validated": true,
      "actual_dependencies": ["44444444-4444-4444-4444-444444444444"],
      "metadata": {"delta_status": "modified"}
    },
    {
      "id": "44444444-4444-4444-4444-444444444444",
      "name": "lexer",
      "level": "component",
      "node_type": "functionality"
    }
  ],
  "edges": [
    {
      "id": "55555555-5555-5555-5555-555555555555",
      "source_id": "33333333-3333-3333-3333-333333333333",
      "target_id": "44444444-4444-4444-4444-444444444444",
      "edge_type": "invocation"
    }
  ],
  "metadata": {}
}"#,
    )
    .expect("file should write");

    let graph = load_graph(&path).expect("graph should load");
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let parser = graph
        .node(uuid!("33333333-3333-3333-3333-333333333333"))
        .expect("node present");
    assert_eq!(parser.name, "parser");
    assert_eq!(parser.test_status, TestStatus::Passed);
    assert!(parser.serena_validated);
    assert_eq!(parser.actual_dependencies.len(), 1);
    assert!(parser.parent_id.is_none());
    assert_eq!(graph.edges[0].edge_type, EdgeType::Invocation);
}
