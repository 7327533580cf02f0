use std::collections::BTreeSet;

use crate::{descendants, EdgeType, Graph, GraphError, NodeId, NodeLevel, NodeType};

/// The node plus its hierarchy-descendants, with every edge of any type
/// whose both endpoints fall inside that selection. Hierarchy selects
/// membership; cross edges between members are preserved.
pub fn subgraph_by_module(graph: &Graph, node_id: NodeId) -> Result<Graph, GraphError> {
    graph.require_node(node_id)?;
    let mut members = descendants(graph, node_id, &[EdgeType::Hierarchy])?;
    members.insert(node_id);
    Ok(project(graph, &members))
}

/// Nodes at the given level plus edges whose both endpoints match.
/// No ancestor or descendant expansion.
pub fn subgraph_by_level(graph: &Graph, level: NodeLevel) -> Graph {
    let members: BTreeSet<NodeId> = graph
        .nodes
        .values()
        .filter(|node| node.level == level)
        .map(|node| node.id)
        .collect();
    project(graph, &members)
}

/// Nodes of the given type plus edges whose both endpoints match.
pub fn subgraph_by_type(graph: &Graph, node_type: NodeType) -> Graph {
    let members: BTreeSet<NodeId> = graph
        .nodes
        .values()
        .filter(|node| node.node_type == node_type)
        .map(|node| node.id)
        .collect();
    project(graph, &members)
}

fn project(graph: &Graph, members: &BTreeSet<NodeId>) -> Graph {
    Graph {
        nodes: graph
            .nodes
            .iter()
            .filter(|(id, _)| members.contains(id))
            .map(|(id, node)| (*id, node.clone()))
            .collect(),
        edges: graph
            .edges
            .iter()
            .filter(|edge| members.contains(&edge.source_id) && members.contains(&edge.target_id))
            .cloned()
            .collect(),
        metadata: graph.metadata.clone(),
    }
}
