use std::collections::{BTreeMap, BTreeSet};

use armature_graph::{EdgeType, Graph, Node, NodeId};

use crate::{
    escape_attr, infer_worker_role, sanitize_identifier, wrap_label, DeltaStatus, StageStatus,
    WorkerRole,
};

pub const LABEL_METADATA_KEY: &str = "label";
pub const PRD_REF_METADATA_KEY: &str = "prd_ref";
pub const PROMISE_ID_METADATA_KEY: &str = "promise_id";
pub const BEAD_METADATA_KEY: &str = "bead_id";
pub const ACCEPTANCE_METADATA_KEY: &str = "acceptance";

pub const DEFAULT_LABEL: &str = "Generation plan";
pub const DEFAULT_PROMISE_ID: &str = "completion_promise";

const INDENT: &str = "    ";
const ACCEPTANCE_TRUNCATE_CHARS: usize = 120;

/// Edge types that order actionable work relative to each other. Hierarchy
/// is containment and never implies execution order here.
const STAGE_ORDER_EDGE_TYPES: [EdgeType; 3] = [
    EdgeType::DataFlow,
    EdgeType::Ordering,
    EdgeType::Invocation,
];

struct StageGroup<'a> {
    slug: String,
    node: Option<&'a Node>,
}

/// Compiles the delta-annotated graph into a workflow document.
///
/// Never fails: an empty or all-existing graph compiles to a placeholder
/// stage-group between the bookends, and unexpected ordering cycles append
/// the affected nodes instead of raising, so the downstream executor always
/// receives a renderable document. Output is byte-deterministic for a given
/// graph.
pub fn compile_workflow(graph: &Graph) -> String {
    let actionable: BTreeMap<NodeId, &Node> = graph
        .nodes
        .values()
        .filter(|node| DeltaStatus::of(node).is_actionable())
        .map(|node| (node.id, node))
        .collect();

    let adjacency = order_adjacency(graph, &actionable);
    let has_adjacency = adjacency.values().any(|targets| !targets.is_empty());
    let ordered = order_actionable(&actionable, &adjacency);
    let parallel = ordered.len() > 1 && !has_adjacency;

    let mut groups = build_groups(&actionable, &ordered);
    if groups.is_empty() {
        groups.push(StageGroup {
            slug: "unassigned".to_string(),
            node: None,
        });
    }

    let document = render(graph, &groups, parallel);
    tracing::debug!(
        stage_groups = groups.len(),
        parallel,
        "workflow document compiled"
    );
    document
}

fn order_adjacency(
    graph: &Graph,
    actionable: &BTreeMap<NodeId, &Node>,
) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
    let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> =
        actionable.keys().map(|id| (*id, BTreeSet::new())).collect();
    for edge in &graph.edges {
        if STAGE_ORDER_EDGE_TYPES.contains(&edge.edge_type)
            && actionable.contains_key(&edge.source_id)
            && actionable.contains_key(&edge.target_id)
        {
            if let Some(targets) = adjacency.get_mut(&edge.source_id) {
                targets.insert(edge.target_id);
            }
        }
    }
    adjacency
}

/// Kahn's algorithm over the actionable set. Nodes stranded by an
/// unexpected cycle are appended in ascending id order so every actionable
/// node still appears in the output.
fn order_actionable(
    actionable: &BTreeMap<NodeId, &Node>,
    adjacency: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> Vec<NodeId> {
    let mut in_degree: BTreeMap<NodeId, usize> =
        actionable.keys().map(|id| (*id, 0)).collect();
    for targets in adjacency.values() {
        for target in targets {
            if let Some(degree) = in_degree.get_mut(target) {
                *degree += 1;
            }
        }
    }

    let mut ready: BTreeSet<NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(actionable.len());

    while let Some(next) = ready.iter().next().copied() {
        ready.remove(&next);
        order.push(next);
        if let Some(targets) = adjacency.get(&next) {
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

    let emitted: BTreeSet<NodeId> = order.iter().copied().collect();
    for id in actionable.keys() {
        if !emitted.contains(id) {
            order.push(*id);
        }
    }
    order
}

fn build_groups<'a>(
    actionable: &BTreeMap<NodeId, &'a Node>,
    ordered: &[NodeId],
) -> Vec<StageGroup<'a>> {
    let mut used = BTreeSet::new();
    ordered
        .iter()
        .filter_map(|id| actionable.get(id).copied())
        .map(|node| StageGroup {
            slug: disambiguate(&mut used, sanitize_identifier(&node.name)),
            node: Some(node),
        })
        .collect()
}

fn disambiguate(used: &mut BTreeSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn render(graph: &Graph, groups: &[StageGroup<'_>], parallel: bool) -> String {
    let label = graph
        .metadata
        .get(LABEL_METADATA_KEY)
        .cloned()
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());
    let prd_ref = graph
        .metadata
        .get(PRD_REF_METADATA_KEY)
        .cloned()
        .unwrap_or_default();
    let promise_id = graph
        .metadata
        .get(PROMISE_ID_METADATA_KEY)
        .cloned()
        .unwrap_or_else(|| DEFAULT_PROMISE_ID.to_string());

    let mut lines = Vec::new();
    lines.push(format!("digraph {} {{", sanitize_identifier(&label)));
    lines.push(format!(
        "{INDENT}graph [label=\"{}\", prd_ref=\"{}\", promise_id=\"{}\", rankdir=TB]",
        escape_attr(&label),
        escape_attr(&prd_ref),
        escape_attr(&promise_id)
    ));
    lines.push(String::new());

    emit_bookends(&mut lines, &promise_id, groups.len(), parallel);
    lines.push(String::new());
    for (index, group) in groups.iter().enumerate() {
        emit_group_stages(&mut lines, group, index);
    }
    lines.push(String::new());
    emit_edges(&mut lines, groups, parallel);

    lines.push("}".to_string());
    let mut document = lines.join("\n");
    document.push('\n');
    document
}

fn emit_bookends(
    lines: &mut Vec<String>,
    promise_id: &str,
    criteria_count: usize,
    parallel: bool,
) {
    lines.push(format!(
        "{INDENT}start [handler=\"start\", shape=Mdiamond, label=\"Start\", \
         status=\"{}\", style=filled, fillcolor={}]",
        StageStatus::Validated.as_str(),
        StageStatus::Validated.fill_color()
    ));
    lines.push(format!(
        "{INDENT}finalize [handler=\"exit\", shape=Msquare, label=\"Finish\", \
         status=\"{}\", style=filled, fillcolor={}, promise_id=\"{}\", criteria_count={}]",
        StageStatus::Pending.as_str(),
        StageStatus::Pending.fill_color(),
        escape_attr(promise_id),
        criteria_count
    ));
    if parallel {
        for (id, label) in [("parallel_start", "Fan out"), ("join_validation", "Join validation")]
        {
            lines.push(format!(
                "{INDENT}{id} [handler=\"parallel\", shape=parallelogram, label=\"{label}\", \
                 status=\"{}\", style=filled, fillcolor={}]",
                StageStatus::Pending.as_str(),
                StageStatus::Pending.fill_color()
            ));
        }
    }
}

fn emit_group_stages(lines: &mut Vec<String>, group: &StageGroup<'_>, index: usize) {
    let slug = &group.slug;
    let ac_ref = format!("AC-{}", index + 1);

    let (label_text, role, prompt, bead_id, file_path) = match group.node {
        Some(node) => (
            wrap_label(&node.name),
            infer_worker_role(
                node.file_path.as_deref(),
                node.folder_path.as_deref(),
                &node.name,
            ),
            acceptance_prompt(node),
            node.metadata.get(BEAD_METADATA_KEY).cloned(),
            node.file_path.clone().or_else(|| node.folder_path.clone()),
        ),
        None => (
            "Unassigned task".to_string(),
            WorkerRole::SoftwareEngineer,
            Some("No actionable changes in the current plan delta".to_string()),
            None,
            None,
        ),
    };

    let mut attrs = vec![
        "handler=\"codergen\"".to_string(),
        "shape=box".to_string(),
        format!("label=\"{}\"", escape_attr(&label_text)),
        format!("status=\"{}\"", StageStatus::Pending.as_str()),
        "style=filled".to_string(),
        format!("fillcolor={}", StageStatus::Pending.fill_color()),
        format!("role=\"{}\"", role.as_str()),
        format!("ac_ref=\"{ac_ref}\""),
    ];
    if let Some(prompt) = prompt {
        attrs.push(format!("prompt=\"{}\"", escape_attr(&prompt)));
    }
    if let Some(bead_id) = bead_id {
        attrs.push(format!("bead_id=\"{}\"", escape_attr(&bead_id)));
    }
    if let Some(file_path) = file_path {
        attrs.push(format!("file_path=\"{}\"", escape_attr(&file_path)));
    }
    lines.push(format!("{INDENT}impl_{slug} [{}]", attrs.join(", ")));

    for (prefix, gate, label) in [
        ("tech_validate", "technical", "Technical validation"),
        ("biz_validate", "business", "Business validation"),
    ] {
        lines.push(format!(
            "{INDENT}{prefix}_{slug} [handler=\"wait.human\", gate=\"{gate}\", shape=hexagon, \
             label=\"{label}\", status=\"{}\", style=filled, fillcolor={}, ac_ref=\"{ac_ref}\"]",
            StageStatus::Pending.as_str(),
            StageStatus::Pending.fill_color()
        ));
    }

    lines.push(format!(
        "{INDENT}decide_{slug} [handler=\"conditional\", shape=diamond, label=\"Accept?\", \
         status=\"{}\", style=filled, fillcolor={}]",
        StageStatus::Pending.as_str(),
        StageStatus::Pending.fill_color()
    ));
}

fn emit_edges(lines: &mut Vec<String>, groups: &[StageGroup<'_>], parallel: bool) {
    const PASS: &str = "label=\"pass\", condition=\"outcome=pass\", color=green";
    const FAIL: &str = "label=\"fail\", condition=\"outcome=fail\", color=red, style=dashed";

    if parallel {
        lines.push(format!("{INDENT}start -> parallel_start"));
        for group in groups {
            let slug = &group.slug;
            lines.push(format!("{INDENT}parallel_start -> impl_{slug}"));
            emit_group_chain(lines, slug);
            lines.push(format!("{INDENT}decide_{slug} -> join_validation [{PASS}]"));
            lines.push(format!("{INDENT}decide_{slug} -> impl_{slug} [{FAIL}]"));
        }
        lines.push(format!("{INDENT}join_validation -> finalize"));
    } else {
        if let Some(first) = groups.first() {
            lines.push(format!("{INDENT}start -> impl_{}", first.slug));
        }
        for (index, group) in groups.iter().enumerate() {
            let slug = &group.slug;
            emit_group_chain(lines, slug);
            let pass_target = match groups.get(index + 1) {
                Some(next) => format!("impl_{}", next.slug),
                None => "finalize".to_string(),
            };
            lines.push(format!("{INDENT}decide_{slug} -> {pass_target} [{PASS}]"));
            lines.push(format!("{INDENT}decide_{slug} -> impl_{slug} [{FAIL}]"));
        }
    }
}

fn emit_group_chain(lines: &mut Vec<String>, slug: &str) {
    lines.push(format!("{INDENT}impl_{slug} -> tech_validate_{slug}"));
    lines.push(format!("{INDENT}tech_validate_{slug} -> biz_validate_{slug}"));
    lines.push(format!("{INDENT}biz_validate_{slug} -> decide_{slug}"));
}

/// Acceptance text for the implementation prompt, truncated to the first
/// 120 characters. Falls back to the node docstring.
fn acceptance_prompt(node: &Node) -> Option<String> {
    let text = node
        .metadata
        .get(ACCEPTANCE_METADATA_KEY)
        .map(String::as_str)
        .filter(|text| !text.trim().is_empty())
        .or_else(|| node.docstring.as_deref().filter(|text| !text.trim().is_empty()))?;
    Some(text.chars().take(ACCEPTANCE_TRUNCATE_CHARS).collect())
}
