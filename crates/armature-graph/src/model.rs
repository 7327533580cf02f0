use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::GraphError;

pub type NodeId = Uuid;

/// Hierarchical tier of a planned code unit. Ordering follows containment:
/// modules contain components, components contain features.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    Module,
    Component,
    Feature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Functionality,
    FileFunctionality,
    FolderFunctionality,
    FunctionFunctionality,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    Skipped,
}

/// Typed relation between two planned units.
///
/// Ordering-relevant types (`Hierarchy`, `DataFlow`, `Ordering`) must form a
/// DAG; `Invocation` and `Inheritance` may legitimately cycle (mutual calls,
/// diamond inheritance) and are never treated as ordering constraints.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Hierarchy,
    DataFlow,
    Ordering,
    Invocation,
    Inheritance,
}

impl EdgeType {
    /// True for edge types that constrain generation order.
    pub fn is_order_relevant(self) -> bool {
        matches!(self, Self::Hierarchy | Self::DataFlow | Self::Ordering)
    }

    /// True for edge types that express a dependency on another unit's
    /// produced artifact, as opposed to containment.
    pub fn is_dependency(self) -> bool {
        matches!(self, Self::DataFlow | Self::Invocation)
    }
}

/// A planned unit of code: module, component, or feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub level: NodeLevel,
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    #[serde(default)]
    pub test_status: TestStatus,
    #[serde(default)]
    pub serena_validated: bool,
    /// Dependencies observed in the generated artifact, recorded after
    /// generation. Distinct from the graph's planned edges.
    #[serde(default)]
    pub actual_dependencies: Vec<NodeId>,
    /// Open string map. Keys read by the pipeline compiler: `delta_status`,
    /// `bead_id`, `acceptance`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Creates a node with a generated identifier. The name must be non-empty.
    pub fn new(
        name: impl Into<String>,
        level: NodeLevel,
        node_type: NodeType,
    ) -> Result<Self, GraphError> {
        Self::with_id(Uuid::new_v4(), name, level, node_type)
    }

    /// Creates a node with a caller-supplied identifier.
    pub fn with_id(
        id: NodeId,
        name: impl Into<String>,
        level: NodeLevel,
        node_type: NodeType,
    ) -> Result<Self, GraphError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphError::Validation(
                "node name must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            level,
            node_type,
            parent_id: None,
            folder_path: None,
            file_path: None,
            interface_type: None,
            signature: None,
            docstring: None,
            implementation: None,
            test_code: None,
            test_status: TestStatus::Pending,
            serena_validated: false,
            actual_dependencies: Vec::new(),
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Result<Self, GraphError> {
        if parent_id == self.id {
            return Err(GraphError::Validation(format!(
                "node '{}' cannot be its own parent",
                self.id
            )));
        }
        self.parent_id = Some(parent_id);
        Ok(self)
    }

    pub fn with_folder_path(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_interface_type(mut self, interface_type: impl Into<String>) -> Self {
        self.interface_type = Some(interface_type.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    pub fn with_test_code(mut self, test_code: impl Into<String>) -> Self {
        self.test_code = Some(test_code.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Records a dependency observed in the generated artifact. Insertion
    /// order is preserved; duplicates are ignored.
    pub fn record_actual_dependency(&mut self, dependency: NodeId) {
        if !self.actual_dependencies.contains(&dependency) {
            self.actual_dependencies.push(dependency);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl Edge {
    /// Creates a directed edge. Self-loops are rejected.
    pub fn new(
        source_id: NodeId,
        target_id: NodeId,
        edge_type: EdgeType,
    ) -> Result<Self, GraphError> {
        if source_id == target_id {
            return Err(GraphError::Validation(format!(
                "edge from '{source_id}' to itself is not allowed"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            source_id,
            target_id,
            edge_type,
            data_id: None,
            data_type: None,
        })
    }

    /// Describes the payload passed along a `DataFlow` edge.
    pub fn with_data(mut self, data_id: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.data_id = Some(data_id.into());
        self.data_type = Some(data_type.into());
        self
    }
}

/// The dependency graph: single source of topology for planning, checkpoint
/// and compilation. Generation progress lives outside the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(with = "node_list")]
    pub nodes: BTreeMap<NodeId, Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, rejecting duplicate identifiers and self-parenting.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if node.parent_id == Some(node.id) {
            return Err(GraphError::Validation(format!(
                "node '{}' cannot be its own parent",
                node.id
            )));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::Validation(format!(
                "node '{}' is already present in the graph",
                node.id
            )));
        }
        let id = node.id;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
        self.edges
            .retain(|edge| edge.source_id != id && edge.target_id != id);
        Ok(node)
    }

    /// Appends an edge. Both endpoints must already be present.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&edge.source_id) {
            return Err(GraphError::NodeNotFound(edge.source_id));
        }
        if !self.nodes.contains_key(&edge.target_id) {
            return Err(GraphError::NodeNotFound(edge.target_id));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn remove_edge(&mut self, edge_id: Uuid) -> Result<Edge, GraphError> {
        let position = self
            .edges
            .iter()
            .position(|edge| edge.id == edge_id)
            .ok_or_else(|| {
                GraphError::Validation(format!("edge '{edge_id}' not found in graph"))
            })?;
        Ok(self.edges.remove(position))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn require_node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing_edges(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.source_id == node_id)
    }

    pub fn incoming_edges(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.target_id == node_id)
    }
}

/// Serializes the node map as a flat list, keyed back by `id` on load.
mod node_list {
    use super::{Node, NodeId};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(nodes: &BTreeMap<NodeId, Node>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(nodes.len()))?;
        for node in nodes.values() {
            seq.serialize_element(node)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<NodeId, Node>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<Node>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|node| (node.id, node)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> Node {
        Node::new(name, NodeLevel::Feature, NodeType::Functionality)
            .expect("node should construct")
    }

    #[test]
    fn node_new_empty_name_expected_validation_error() {
        let error = Node::new("  ", NodeLevel::Module, NodeType::Functionality)
            .expect_err("empty name must be rejected");
        assert!(matches!(error, GraphError::Validation(_)));
    }

    #[test]
    fn node_with_parent_self_expected_validation_error() {
        let unit = node("alpha");
        let id = unit.id;
        let error = unit.with_parent(id).expect_err("self parent must be rejected");
        assert!(matches!(error, GraphError::Validation(_)));
    }

    #[test]
    fn edge_new_self_loop_expected_validation_error() {
        let id = Uuid::new_v4();
        let error = Edge::new(id, id, EdgeType::DataFlow).expect_err("self loop must be rejected");
        assert!(matches!(error, GraphError::Validation(_)));
    }

    #[test]
    fn add_edge_missing_endpoint_expected_not_found() {
        let mut graph = Graph::new();
        let a = graph.add_node(node("a")).expect("node should insert");
        let ghost = Uuid::new_v4();
        let edge = Edge::new(a, ghost, EdgeType::DataFlow).expect("edge should construct");
        let error = graph.add_edge(edge).expect_err("missing endpoint must be rejected");
        assert!(matches!(error, GraphError::NodeNotFound(id) if id == ghost));
    }

    #[test]
    fn remove_node_expected_touching_edges_dropped() {
        let mut graph = Graph::new();
        let a = graph.add_node(node("a")).expect("node should insert");
        let b = graph.add_node(node("b")).expect("node should insert");
        let c = graph.add_node(node("c")).expect("node should insert");
        graph
            .add_edge(Edge::new(a, b, EdgeType::DataFlow).expect("edge"))
            .expect("edge should insert");
        graph
            .add_edge(Edge::new(b, c, EdgeType::DataFlow).expect("edge"))
            .expect("edge should insert");

        graph.remove_node(b).expect("node should remove");
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn record_actual_dependency_duplicate_expected_single_entry() {
        let mut unit = node("alpha");
        let dep = Uuid::new_v4();
        unit.record_actual_dependency(dep);
        unit.record_actual_dependency(dep);
        assert_eq!(unit.actual_dependencies, vec![dep]);
    }
}
