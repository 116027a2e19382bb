use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use super::super::domain::ApplicationWithInterviews;

/// Listings found on, and interviews landed through, one job board or careers site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceActivity {
    pub host: String,
    pub found: u32,
    pub interviews: u32,
}

pub fn build_source_breakdown(applications: &[ApplicationWithInterviews]) -> Vec<SourceActivity> {
    let mut by_host: HashMap<String, SourceActivity> = HashMap::new();

    for entry in applications {
        let Some(host) = entry.application.url.as_deref().and_then(listing_host) else {
            continue;
        };

        let activity = by_host.entry(host.clone()).or_insert_with(|| SourceActivity {
            host,
            found: 0,
            interviews: 0,
        });
        activity.found += 1;
        activity.interviews += entry.interviews.len() as u32;
    }

    let mut sources: Vec<SourceActivity> = by_host.into_values().collect();
    sources.sort_by(|a, b| b.found.cmp(&a.found).then_with(|| a.host.cmp(&b.host)));
    sources
}

fn listing_host(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
}
