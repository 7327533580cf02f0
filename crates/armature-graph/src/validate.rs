use crate::{detect_cycles, errors::format_id_list, EdgeType, Graph, GraphError, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One structural finding from a validation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<NodeId>,
    pub edge: Option<(NodeId, NodeId)>,
}

impl Diagnostic {
    pub fn new(rule: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            node_id: None,
            edge: None,
        }
    }

    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_edge(mut self, from: NodeId, to: NodeId) -> Self {
        self.edge = Some((from, to));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Runs every structural rule. Construction-time checks catch most of these
/// defects; deserialized graphs can still carry any of them.
pub fn validate(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    diagnostics.extend(rule_name_nonempty(graph));
    diagnostics.extend(rule_edge_endpoints_exist(graph));
    diagnostics.extend(rule_parent_not_self(graph));
    diagnostics.extend(rule_parent_exists(graph));
    diagnostics.extend(rule_acyclic_ordering(graph));
    diagnostics.extend(rule_dataflow_payload(graph));

    diagnostics
}

/// As `validate`, but folds error-severity findings into a single
/// `GraphError::Validation`.
pub fn validate_or_raise(graph: &Graph) -> Result<Vec<Diagnostic>, GraphError> {
    let diagnostics = validate(graph);
    let errors: Vec<&Diagnostic> = diagnostics.iter().filter(|d| d.is_error()).collect();
    if errors.is_empty() {
        return Ok(diagnostics);
    }
    let summary = errors
        .iter()
        .map(|d| format!("{}: {}", d.rule, d.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(GraphError::Validation(summary))
}

fn rule_name_nonempty(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in graph.nodes.values() {
        if node.name.trim().is_empty() {
            diagnostics.push(
                Diagnostic::new("name_nonempty", Severity::Error, "node name is empty")
                    .with_node_id(node.id),
            );
        }
    }
    diagnostics
}

fn rule_edge_endpoints_exist(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for edge in &graph.edges {
        for endpoint in [edge.source_id, edge.target_id] {
            if !graph.contains_node(endpoint) {
                diagnostics.push(
                    Diagnostic::new(
                        "edge_endpoints_exist",
                        Severity::Error,
                        format!("edge endpoint '{endpoint}' does not exist"),
                    )
                    .with_edge(edge.source_id, edge.target_id),
                );
            }
        }
    }
    diagnostics
}

fn rule_parent_not_self(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in graph.nodes.values() {
        if node.parent_id == Some(node.id) {
            diagnostics.push(
                Diagnostic::new("parent_not_self", Severity::Error, "node is its own parent")
                    .with_node_id(node.id),
            );
        }
    }
    diagnostics
}

fn rule_parent_exists(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in graph.nodes.values() {
        if let Some(parent_id) = node.parent_id {
            if parent_id != node.id && !graph.contains_node(parent_id) {
                diagnostics.push(
                    Diagnostic::new(
                        "parent_exists",
                        Severity::Error,
                        format!("declared parent '{parent_id}' does not exist"),
                    )
                    .with_node_id(node.id),
                );
            }
        }
    }
    diagnostics
}

fn rule_acyclic_ordering(graph: &Graph) -> Vec<Diagnostic> {
    detect_cycles(graph)
        .into_iter()
        .map(|cycle| {
            Diagnostic::new(
                "acyclic_ordering",
                Severity::Error,
                format!("ordering edges form a cycle: {}", format_id_list(&cycle)),
            )
        })
        .collect()
}

fn rule_dataflow_payload(graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for edge in &graph.edges {
        if edge.edge_type != EdgeType::DataFlow
            && (edge.data_id.is_some() || edge.data_type.is_some())
        {
            diagnostics.push(
                Diagnostic::new(
                    "dataflow_payload",
                    Severity::Warning,
                    "payload description on a non-data-flow edge is ignored",
                )
                .with_edge(edge.source_id, edge.target_id),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, NodeLevel, NodeType};
    use uuid::Uuid;

    #[test]
    fn validate_well_formed_graph_expected_no_diagnostics() {
        let mut graph = Graph::new();
        let a = graph
            .add_node(Node::new("a", NodeLevel::Module, NodeType::Functionality).expect("node"))
            .expect("insert");
        let b = graph
            .add_node(
                Node::new("b", NodeLevel::Component, NodeType::Functionality)
                    .expect("node")
                    .with_parent(a)
                    .expect("parent"),
            )
            .expect("insert");
        graph
            .add_edge(Edge::new(a, b, EdgeType::Hierarchy).expect("edge"))
            .expect("insert");

        assert!(validate(&graph).is_empty());
    }

    #[test]
    fn validate_missing_parent_expected_error() {
        let mut graph = Graph::new();
        graph
            .add_node(
                Node::new("orphan", NodeLevel::Feature, NodeType::Functionality)
                    .expect("node")
                    .with_parent(Uuid::new_v4())
                    .expect("parent"),
            )
            .expect("insert");

        let diagnostics = validate(&graph);
        assert!(diagnostics.iter().any(|d| d.rule == "parent_exists" && d.is_error()));
    }

    #[test]
    fn validate_ordering_cycle_expected_error() {
        let mut graph = Graph::new();
        let a = graph
            .add_node(Node::new("a", NodeLevel::Feature, NodeType::Functionality).expect("node"))
            .expect("insert");
        let b = graph
            .add_node(Node::new("b", NodeLevel::Feature, NodeType::Functionality).expect("node"))
            .expect("insert");
        graph
            .add_edge(Edge::new(a, b, EdgeType::DataFlow).expect("edge"))
            .expect("insert");
        graph
            .add_edge(Edge::new(b, a, EdgeType::DataFlow).expect("edge"))
            .expect("insert");

        let error = validate_or_raise(&graph).expect_err("cycle must raise");
        assert!(matches!(error, GraphError::Validation(_)));
    }

    #[test]
    fn validate_payload_on_hierarchy_edge_expected_warning() {
        let mut graph = Graph::new();
        let a = graph
            .add_node(Node::new("a", NodeLevel::Module, NodeType::Functionality).expect("node"))
            .expect("insert");
        let b = graph
            .add_node(Node::new("b", NodeLevel::Feature, NodeType::Functionality).expect("node"))
            .expect("insert");
        graph
            .add_edge(
                Edge::new(a, b, EdgeType::Hierarchy)
                    .expect("edge")
                    .with_data("payload", "String"),
            )
            .expect("insert");

        let diagnostics = validate(&graph);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.rule == "dataflow_payload" && d.severity == Severity::Warning)
        );
        assert!(validate_or_raise(&graph).is_ok());
    }
}
