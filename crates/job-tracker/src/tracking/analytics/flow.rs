use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{ApplicationStatus, ApplicationWithInterviews};

/// Status nodes in display order. `INTERVIEWING` is expanded into numbered interview rounds.
pub const STATUS_NODES: [ApplicationStatus; 6] = [
    ApplicationStatus::Found,
    ApplicationStatus::Applied,
    ApplicationStatus::Rejected,
    ApplicationStatus::Offer,
    ApplicationStatus::Expired,
    ApplicationStatus::Archived,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FlowNodeKind {
    Status(ApplicationStatus),
    /// One-based interview round.
    Interview(u32),
}

impl FlowNodeKind {
    pub fn label(&self) -> String {
        match self {
            FlowNodeKind::Status(status) => status.label().to_string(),
            FlowNodeKind::Interview(round) => format!("Interview {round}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub index: usize,
    pub kind: FlowNodeKind,
    pub label: String,
    /// Applications passing through the node: incoming total, or outgoing for source nodes.
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEdge {
    pub source: usize,
    pub target: usize,
    pub source_label: String,
    pub target_label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<TransitionEdge>,
}

impl FlowGraph {
    /// Nodes worth drawing; nodes no application reached are suppressed.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.iter().filter(|node| node.value > 0)
    }

    pub fn edge_count(&self, source: FlowNodeKind, target: FlowNodeKind) -> u32 {
        self.edges
            .iter()
            .find(|edge| {
                self.nodes[edge.source].kind == source && self.nodes[edge.target].kind == target
            })
            .map_or(0, |edge| edge.count)
    }

    pub fn outgoing_total(&self, source: FlowNodeKind) -> u32 {
        self.edges
            .iter()
            .filter(|edge| self.nodes[edge.source].kind == source)
            .map(|edge| edge.count)
            .sum()
    }
}

/// Count the transitions each application evidences and fold them into a flow graph.
///
/// Every rule is checked on its own for each application, so one record may contribute
/// several edges.
pub fn build_transition_graph(applications: &[ApplicationWithInterviews]) -> FlowGraph {
    let max_rounds = applications
        .iter()
        .map(|entry| entry.interviews.len())
        .max()
        .unwrap_or(0);

    let kinds: Vec<FlowNodeKind> = STATUS_NODES
        .iter()
        .copied()
        .map(FlowNodeKind::Status)
        .chain((1..=max_rounds as u32).map(FlowNodeKind::Interview))
        .collect();
    let index_of = |kind: FlowNodeKind| kinds.iter().position(|candidate| *candidate == kind);

    let mut counts: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for entry in applications {
        for (source, target) in evidenced_transitions(entry) {
            if let (Some(source), Some(target)) = (index_of(source), index_of(target)) {
                *counts.entry((source, target)).or_default() += 1;
            }
        }
    }

    let edges: Vec<TransitionEdge> = counts
        .into_iter()
        .map(|((source, target), count)| TransitionEdge {
            source,
            target,
            source_label: kinds[source].label(),
            target_label: kinds[target].label(),
            count,
        })
        .collect();

    let nodes = kinds
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let incoming: u32 = edges
                .iter()
                .filter(|edge| edge.target == index)
                .map(|edge| edge.count)
                .sum();
            let outgoing: u32 = edges
                .iter()
                .filter(|edge| edge.source == index)
                .map(|edge| edge.count)
                .sum();
            FlowNode {
                index,
                kind: *kind,
                label: kind.label(),
                value: if incoming == 0 { outgoing } else { incoming },
            }
        })
        .collect();

    FlowGraph { nodes, edges }
}

fn evidenced_transitions(
    entry: &ApplicationWithInterviews,
) -> Vec<(FlowNodeKind, FlowNodeKind)> {
    use ApplicationStatus::{Applied, Archived, Expired, Found, Offer, Rejected};
    use FlowNodeKind::{Interview, Status};

    let application = &entry.application;
    let found = application.found_at.is_some();
    let applied = application.applied_at.is_some();
    let rejected = application.rejected_at.is_some();
    let status = application.status;

    let mut transitions = Vec::new();

    if found && applied {
        transitions.push((Status(Found), Status(Applied)));
    }
    if found && !applied && status == Expired {
        transitions.push((Status(Found), Status(Expired)));
    }
    if found && !applied && status == Archived {
        transitions.push((Status(Found), Status(Archived)));
    }

    let rounds = entry.interviews.len() as u32;
    if rounds > 0 {
        if applied {
            transitions.push((Status(Applied), Interview(1)));
        }
        for round in 1..rounds {
            transitions.push((Interview(round), Interview(round + 1)));
        }

        let outcome = if rejected {
            Some(Rejected)
        } else if status == Offer || status == Archived {
            Some(status)
        } else {
            None
        };
        if let Some(outcome) = outcome {
            transitions.push((Interview(rounds), Status(outcome)));
        }
    } else {
        if applied && rejected {
            transitions.push((Status(Applied), Status(Rejected)));
        }
        if applied && status == Offer {
            transitions.push((Status(Applied), Status(Offer)));
        }
        if applied && status == Archived {
            transitions.push((Status(Applied), Status(Archived)));
        }
    }

    transitions
}
