//! Pure derivations over a user's applications for the dashboard.

mod activity;
mod encouragement;
mod flow;
mod sources;

pub use activity::{
    build_activity_window, validate_window_days, ActivityBucket, ActivityWindow, HeatLevel,
    DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
pub use encouragement::{
    compute_encouragement, select_message, Encouragement, EncouragementKind, EncouragementStats,
    MessagePools,
};
pub use flow::{
    build_transition_graph, FlowGraph, FlowNode, FlowNodeKind, TransitionEdge, STATUS_NODES,
};
pub use sources::{build_source_breakdown, SourceActivity};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::calendar::ReportingCalendar;
use super::domain::ApplicationWithInterviews;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardAnalytics {
    pub activity: ActivityWindow,
    pub flow: FlowGraph,
    pub sources: Vec<SourceActivity>,
    pub encouragement_stats: EncouragementStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<Encouragement>,
}

/// Run every dashboard derivation over the same snapshot of applications.
pub fn analyze<R>(
    applications: &[ApplicationWithInterviews],
    window_days: u32,
    calendar: &ReportingCalendar,
    pools: &MessagePools,
    rng: &mut R,
) -> DashboardAnalytics
where
    R: Rng + ?Sized,
{
    let activity = build_activity_window(applications, window_days, calendar);
    let flow = build_transition_graph(applications);
    let sources = build_source_breakdown(applications);
    let encouragement_stats = compute_encouragement(
        applications.iter().map(|entry| &entry.application),
        calendar,
    );
    let encouragement = select_message(&encouragement_stats, pools, rng);

    debug!(
        applications = applications.len(),
        edges = flow.edges.len(),
        sources = sources.len(),
        "dashboard analytics computed"
    );

    DashboardAnalytics {
        activity,
        flow,
        sources,
        encouragement_stats,
        encouragement,
    }
}
