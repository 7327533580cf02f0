use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{EdgeType, Graph, GraphError, Node, NodeId};

/// Edge types that constrain generation order. `Invocation` and
/// `Inheritance` edges are ignored here; treating them as ordering
/// constraints would manufacture cycles between mutually-calling units.
pub const ORDER_RELEVANT_EDGE_TYPES: [EdgeType; 3] = [
    EdgeType::Hierarchy,
    EdgeType::DataFlow,
    EdgeType::Ordering,
];

/// Kahn's algorithm over the order-relevant subgraph.
///
/// Disconnected nodes are included; ties are broken by ascending node id so
/// the result is deterministic for a given graph. Fails with
/// `CycleDetected` carrying one concrete cycle when the order-relevant
/// subgraph is cyclic.
pub fn topological_sort(graph: &Graph) -> Result<Vec<NodeId>, GraphError> {
    let mut in_degree: BTreeMap<NodeId, usize> =
        graph.nodes.keys().map(|id| (*id, 0)).collect();
    let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for edge in order_relevant_edges(graph) {
        if !in_degree.contains_key(&edge.source_id) {
            continue;
        }
        let Some(degree) = in_degree.get_mut(&edge.target_id) else {
            continue;
        };
        *degree += 1;
        successors.entry(edge.source_id).or_default().push(edge.target_id);
    }

    let mut ready: BTreeSet<NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(next) = ready.iter().next().copied() {
        ready.remove(&next);
        order.push(next);
        if let Some(targets) = successors.get(&next) {
            for target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() < graph.node_count() {
        let emitted: BTreeSet<NodeId> = order.iter().copied().collect();
        let remaining: BTreeSet<NodeId> = graph
            .nodes
            .keys()
            .filter(|id| !emitted.contains(id))
            .copied()
            .collect();
        return Err(GraphError::CycleDetected {
            cycle: recover_cycle(graph, &remaining),
        });
    }

    Ok(order)
}

/// All cycles in the order-relevant subgraph, as strongly connected
/// components with two or more members. Returns an empty list for an
/// acyclic graph; never errors.
pub fn detect_cycles(graph: &Graph) -> Vec<Vec<NodeId>> {
    let successors = order_relevant_successors(graph);
    let mut finish_order = Vec::with_capacity(graph.node_count());
    let mut visited = BTreeSet::new();

    // First pass: record finish times, iteratively.
    for start in graph.nodes.keys().copied() {
        if visited.contains(&start) {
            continue;
        }
        let mut stack = vec![(start, 0usize)];
        visited.insert(start);
        while let Some((node, index)) = stack.pop() {
            let next = successors
                .get(&node)
                .and_then(|targets| targets.get(index).copied());
            match next {
                Some(target) => {
                    stack.push((node, index + 1));
                    if visited.insert(target) {
                        stack.push((target, 0));
                    }
                }
                None => finish_order.push(node),
            }
        }
    }

    let predecessors = order_relevant_predecessors(graph);
    let mut assigned = BTreeSet::new();
    let mut cycles = Vec::new();

    // Second pass: walk the transposed graph in reverse finish order.
    for root in finish_order.iter().rev().copied() {
        if assigned.contains(&root) {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![root];
        assigned.insert(root);
        while let Some(node) = stack.pop() {
            component.push(node);
            if let Some(sources) = predecessors.get(&node) {
                for source in sources {
                    if assigned.insert(*source) {
                        stack.push(*source);
                    }
                }
            }
        }
        if component.len() >= 2 {
            cycles.push(canonicalize_cycle(component));
        }
    }

    cycles.sort();
    cycles
}

/// Transitive predecessors of `node_id` over the given edge types.
pub fn ancestors(
    graph: &Graph,
    node_id: NodeId,
    edge_types: &[EdgeType],
) -> Result<BTreeSet<NodeId>, GraphError> {
    graph.require_node(node_id)?;
    Ok(closure(graph, node_id, edge_types, Direction::Incoming))
}

/// Transitive successors of `node_id` over the given edge types.
pub fn descendants(
    graph: &Graph,
    node_id: NodeId,
    edge_types: &[EdgeType],
) -> Result<BTreeSet<NodeId>, GraphError> {
    graph.require_node(node_id)?;
    Ok(closure(graph, node_id, edge_types, Direction::Outgoing))
}

/// Immediate dependency targets: outgoing `DataFlow` and `Invocation` edges.
/// Hierarchy edges are containment, not dependency, and are excluded.
pub fn direct_dependencies(graph: &Graph, node_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
    graph.require_node(node_id)?;
    let targets: BTreeSet<NodeId> = graph
        .outgoing_edges(node_id)
        .filter(|edge| edge.edge_type.is_dependency())
        .map(|edge| edge.target_id)
        .collect();
    Ok(targets.into_iter().collect())
}

/// Drift between design-time and generation-time dependencies of one node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyDiff {
    pub planned: BTreeSet<NodeId>,
    pub actual: BTreeSet<NodeId>,
    pub missing: BTreeSet<NodeId>,
    pub extra: BTreeSet<NodeId>,
}

pub fn diff_dependencies(node: &Node, graph: &Graph) -> Result<DependencyDiff, GraphError> {
    let planned: BTreeSet<NodeId> = direct_dependencies(graph, node.id)?.into_iter().collect();
    let actual: BTreeSet<NodeId> = node.actual_dependencies.iter().copied().collect();
    let missing = planned.difference(&actual).copied().collect();
    let extra = actual.difference(&planned).copied().collect();
    Ok(DependencyDiff {
        planned,
        actual,
        missing,
        extra,
    })
}

enum Direction {
    Incoming,
    Outgoing,
}

fn closure(
    graph: &Graph,
    start: NodeId,
    edge_types: &[EdgeType],
    direction: Direction,
) -> BTreeSet<NodeId> {
    let mut reached = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(node_id) = queue.pop_front() {
        for edge in &graph.edges {
            if !edge_types.contains(&edge.edge_type) {
                continue;
            }
            let next = match direction {
                Direction::Incoming if edge.target_id == node_id => edge.source_id,
                Direction::Outgoing if edge.source_id == node_id => edge.target_id,
                _ => continue,
            };
            if next != start && graph.contains_node(next) && reached.insert(next) {
                queue.push_back(next);
            }
        }
    }

    reached
}

fn order_relevant_edges(graph: &Graph) -> impl Iterator<Item = &crate::Edge> {
    graph
        .edges
        .iter()
        .filter(|edge| edge.edge_type.is_order_relevant())
}

fn order_relevant_successors(graph: &Graph) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for edge in order_relevant_edges(graph) {
        if graph.contains_node(edge.source_id) && graph.contains_node(edge.target_id) {
            successors.entry(edge.source_id).or_default().push(edge.target_id);
        }
    }
    successors
}

fn order_relevant_predecessors(graph: &Graph) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut predecessors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for edge in order_relevant_edges(graph) {
        if graph.contains_node(edge.source_id) && graph.contains_node(edge.target_id) {
            predecessors.entry(edge.target_id).or_default().push(edge.source_id);
        }
    }
    predecessors
}

/// Walks predecessors inside the leftover subgraph until a node repeats.
/// Every leftover node has at least one leftover predecessor, so the walk
/// always closes. The reversed revisit segment is the forward cycle.
fn recover_cycle(graph: &Graph, remaining: &BTreeSet<NodeId>) -> Vec<NodeId> {
    let Some(start) = remaining.iter().next().copied() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut positions: BTreeMap<NodeId, usize> = BTreeMap::from([(start, 0)]);

    loop {
        let current = path[path.len() - 1];
        let predecessor = graph
            .edges
            .iter()
            .filter(|edge| {
                edge.edge_type.is_order_relevant()
                    && edge.target_id == current
                    && remaining.contains(&edge.source_id)
            })
            .map(|edge| edge.source_id)
            .min();
        let Some(predecessor) = predecessor else {
            return canonicalize_cycle(path);
        };
        if let Some(position) = positions.get(&predecessor) {
            let mut cycle: Vec<NodeId> = path[*position..].to_vec();
            cycle.reverse();
            return canonicalize_cycle(cycle);
        }
        positions.insert(predecessor, path.len());
        path.push(predecessor);
    }
}

/// Rotates a cycle to begin at its smallest member so reports are stable.
fn canonicalize_cycle(mut cycle: Vec<NodeId>) -> Vec<NodeId> {
    let Some(smallest) = cycle.iter().enumerate().min_by_key(|(_, id)| **id) else {
        return cycle;
    };
    let pivot = smallest.0;
    cycle.rotate_left(pivot);
    cycle
}
