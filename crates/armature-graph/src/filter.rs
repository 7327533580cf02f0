use crate::{Graph, Node, NodeLevel, TestStatus};

/// Predicate-based node selection. Results follow ascending node id.
pub fn filter_nodes<'a, F>(graph: &'a Graph, predicate: F) -> Vec<&'a Node>
where
    F: Fn(&Node) -> bool,
{
    graph.nodes.values().filter(|node| predicate(node)).collect()
}

pub fn filter_by_status(graph: &Graph, status: TestStatus) -> Vec<&Node> {
    filter_nodes(graph, |node| node.test_status == status)
}

pub fn filter_by_validation(graph: &Graph, validated: bool) -> Vec<&Node> {
    filter_nodes(graph, |node| node.serena_validated == validated)
}

pub fn filter_by_level(graph: &Graph, level: NodeLevel) -> Vec<&Node> {
    filter_nodes(graph, |node| node.level == level)
}
