use crate::infra::{InMemoryApplicationRepository, InMemoryInterviewRepository};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use job_tracker::config::{AppConfig, TrackerConfig};
use job_tracker::error::AppError;
use job_tracker::tracking::analytics::{
    analyze, ActivityWindow, DashboardAnalytics, FlowGraph, HeatLevel, MessagePools,
    MAX_WINDOW_DAYS,
};
use job_tracker::tracking::{
    ApplicationDraft, ApplicationRecord, ApplicationStatus, DashboardView, ExportImporter,
    FixedClock, InterviewDraft, InterviewView, JobTrackerService, OwnerId, ReportingCalendar,
    TimestampField,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Days of the activity heatmap printed on the terminal.
const HEATMAP_TAIL_DAYS: usize = 28;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for the seeded dataset (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    /// JSON export of tracked applications
    #[arg(long)]
    pub(crate) export: PathBuf,
    /// Reporting date (defaults to today in the configured offset)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Override the activity window length (1 to 3660 days)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
    pub(crate) window_days: Option<u32>,
}

pub(crate) fn run_dashboard_report(args: DashboardArgs) -> Result<(), AppError> {
    let DashboardArgs {
        export,
        today,
        window_days,
    } = args;

    let tracker = AppConfig::load()?.tracker;
    let offset = tracker.utc_offset;
    let report = ExportImporter::new(OwnerId("export".to_string()), offset).from_path(&export)?;

    let calendar = match today {
        Some(today) => ReportingCalendar::new(today, offset),
        None => ReportingCalendar::at(Utc::now(), offset),
    };
    let window_days = window_days.unwrap_or(tracker.activity_window_days);
    let analytics = analyze(
        &report.applications,
        window_days,
        &calendar,
        &MessagePools::default(),
        &mut rand::thread_rng(),
    );

    println!(
        "Job search dashboard for {} ({} applications from {})",
        calendar.today(),
        report.applications.len(),
        export.display()
    );
    if report.skipped_records > 0 || report.dropped_timestamps > 0 {
        println!(
            "- skipped {} record(s) with unknown status, dropped {} malformed timestamp(s)",
            report.skipped_records, report.dropped_timestamps
        );
    }
    render_analytics(&analytics);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let now = today.and_time(NaiveTime::MIN).and_utc() + Duration::hours(17);

    println!("Job tracker demo");
    let service = JobTrackerService::with_clock(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryInterviewRepository::default()),
        TrackerConfig::default(),
        Arc::new(FixedClock(now)),
    );
    let owner = OwnerId("demo".to_string());

    seed_demo_search(&service, &owner, now)?;

    let dashboard = service.dashboard(&owner)?;
    render_dashboard(&dashboard);

    Ok(())
}

struct SeedListing {
    title: &'static str,
    company: &'static str,
    url: &'static str,
    found_days_ago: i64,
    applied_days_ago: Option<i64>,
    interview_days_from_now: &'static [i64],
    outcome: ApplicationStatus,
}

const DEMO_LISTINGS: [SeedListing; 8] = [
    SeedListing {
        title: "Senior Backend Engineer",
        company: "Acme",
        url: "https://boards.greenhouse.io/acme/jobs/4411",
        found_days_ago: 40,
        applied_days_ago: Some(38),
        interview_days_from_now: &[-30, -21],
        outcome: ApplicationStatus::Rejected,
    },
    SeedListing {
        title: "Platform Engineer",
        company: "Initech",
        url: "https://jobs.lever.co/initech/19",
        found_days_ago: 21,
        applied_days_ago: Some(20),
        interview_days_from_now: &[-9, 3],
        outcome: ApplicationStatus::Interviewing,
    },
    SeedListing {
        title: "Staff Engineer",
        company: "Globex",
        url: "https://careers.globex.com/roles/7",
        found_days_ago: 33,
        applied_days_ago: Some(31),
        interview_days_from_now: &[-24, -17, -10],
        outcome: ApplicationStatus::Offer,
    },
    SeedListing {
        title: "Site Reliability Engineer",
        company: "Hooli",
        url: "https://boards.greenhouse.io/hooli/jobs/88",
        found_days_ago: 4,
        applied_days_ago: Some(1),
        interview_days_from_now: &[],
        outcome: ApplicationStatus::Applied,
    },
    SeedListing {
        title: "Infrastructure Engineer",
        company: "Umbrella",
        url: "https://jobs.lever.co/umbrella/3",
        found_days_ago: 2,
        applied_days_ago: Some(0),
        interview_days_from_now: &[],
        outcome: ApplicationStatus::Applied,
    },
    SeedListing {
        title: "Data Platform Engineer",
        company: "Vandelay",
        url: "https://www.linkedin.com/jobs/view/55",
        found_days_ago: 50,
        applied_days_ago: None,
        interview_days_from_now: &[],
        outcome: ApplicationStatus::Expired,
    },
    SeedListing {
        title: "Developer Advocate",
        company: "Soylent",
        url: "https://www.linkedin.com/jobs/view/61",
        found_days_ago: 12,
        applied_days_ago: None,
        interview_days_from_now: &[],
        outcome: ApplicationStatus::Archived,
    },
    SeedListing {
        title: "Rust Engineer",
        company: "Wayne Enterprises",
        url: "https://careers.wayne.example/rust",
        found_days_ago: 1,
        applied_days_ago: None,
        interview_days_from_now: &[],
        outcome: ApplicationStatus::Found,
    },
];

fn seed_demo_search(
    service: &JobTrackerService<InMemoryApplicationRepository, InMemoryInterviewRepository>,
    owner: &OwnerId,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    for listing in &DEMO_LISTINGS {
        let record = service.create_application(
            owner,
            ApplicationDraft {
                title: listing.title.to_string(),
                company: listing.company.to_string(),
                url: Some(listing.url.to_string()),
                ..ApplicationDraft::default()
            },
        )?;
        service.update_date(
            owner,
            &record.id,
            TimestampField::FoundAt,
            now - Duration::days(listing.found_days_ago),
        )?;

        if let Some(days_ago) = listing.applied_days_ago {
            service.update_status(owner, &record.id, ApplicationStatus::Applied)?;
            service.update_date(
                owner,
                &record.id,
                TimestampField::AppliedAt,
                now - Duration::days(days_ago),
            )?;
        }

        for days in listing.interview_days_from_now {
            service.schedule_interview(
                owner,
                &record.id,
                InterviewDraft {
                    scheduled_at: now + Duration::days(*days),
                    location: Some("Video call".to_string()),
                    interviewers: Vec::new(),
                    notes: None,
                },
            )?;
        }

        if listing.outcome != ApplicationStatus::Applied || listing.applied_days_ago.is_none() {
            service.update_status(owner, &record.id, listing.outcome)?;
        }
    }

    Ok(())
}

fn render_dashboard(dashboard: &DashboardView) {
    println!("Dashboard for {} (generated {})", dashboard.today, dashboard.generated_at);
    render_analytics(&dashboard.analytics);

    println!("\nUpcoming interviews");
    if dashboard.upcoming_interviews.is_empty() {
        println!("- none scheduled");
    }
    for view in &dashboard.upcoming_interviews {
        println!("- {}", describe_interview(view));
    }

    render_listings("Recently found", &dashboard.found_listings);
    render_listings("Active applications", &dashboard.active_applications);
}

fn render_analytics(analytics: &DashboardAnalytics) {
    if let Some(encouragement) = &analytics.encouragement {
        println!("\n{}", encouragement.message);
    }
    println!(
        "Streak: {} day(s) | This week: {} application(s)",
        analytics.encouragement_stats.streak_length, analytics.encouragement_stats.weekly_count
    );

    render_activity(&analytics.activity);
    render_flow(&analytics.flow);

    println!("\nSources");
    if analytics.sources.is_empty() {
        println!("- no listing URLs recorded");
    }
    for source in &analytics.sources {
        println!(
            "- {}: {} found | {} interview(s)",
            source.host, source.found, source.interviews
        );
    }
}

fn render_activity(activity: &ActivityWindow) {
    println!(
        "\nActivity over {} days: {} application(s), {} interview(s)",
        activity.window_days,
        activity.total_applications(),
        activity.total_interviews()
    );

    let tail = activity
        .buckets
        .iter()
        .skip(activity.buckets.len().saturating_sub(HEATMAP_TAIL_DAYS));
    let strip: String = tail
        .map(|bucket| match bucket.heat {
            HeatLevel::Idle => '.',
            HeatLevel::Interview => '*',
            HeatLevel::Applications(level) => char::from(b'0' + level),
        })
        .collect();
    println!("Last {} days: {strip}  (. idle, 1-5 applications, * interview)", strip.len());
}

fn render_flow(flow: &FlowGraph) {
    println!("\nPipeline flow");
    if flow.edges.is_empty() {
        println!("- no transitions yet");
    }
    for edge in &flow.edges {
        println!(
            "- {} -> {}: {}",
            edge.source_label, edge.target_label, edge.count
        );
    }
}

fn render_listings(heading: &str, listings: &[ApplicationRecord]) {
    println!("\n{heading}");
    if listings.is_empty() {
        println!("- none");
    }
    for listing in listings {
        println!(
            "- {} at {} [{}]",
            listing.title, listing.company, listing.status
        );
    }
}

fn describe_interview(view: &InterviewView) -> String {
    let when = view
        .interview
        .scheduled_at
        .map(|at| at.format("%a %b %e %H:%M UTC").to_string())
        .unwrap_or_else(|| "unscheduled".to_string());
    format!(
        "{when}: {} at {}",
        view.application_title, view.application_company
    )
}
