use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::super::calendar::{day_key, ReportingCalendar};
use super::super::domain::{ApplicationWithInterviews, ValidationError};

pub const DEFAULT_WINDOW_DAYS: u32 = 90;
/// Ten years of days. Longer windows are refused at every entry point.
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Heat tier for a single day: application volume on a five step scale, with any interview
/// taking precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "level", rename_all = "snake_case")]
pub enum HeatLevel {
    Idle,
    Applications(u8),
    Interview,
}

impl HeatLevel {
    fn for_counts(applications: u32, interviews: u32) -> Self {
        if interviews > 0 {
            HeatLevel::Interview
        } else if applications == 0 {
            HeatLevel::Idle
        } else {
            HeatLevel::Applications(applications.min(5) as u8)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBucket {
    pub date: NaiveDate,
    pub key: String,
    pub applications: u32,
    pub interviews: u32,
    pub heat: HeatLevel,
}

impl ActivityBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            key: day_key(date),
            applications: 0,
            interviews: 0,
            heat: HeatLevel::Idle,
        }
    }
}

/// Dense, oldest-first run of day buckets ending on the reference day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityWindow {
    pub reference: NaiveDate,
    pub window_days: u32,
    pub buckets: Vec<ActivityBucket>,
}

impl ActivityWindow {
    pub fn total_applications(&self) -> u32 {
        self.buckets.iter().map(|bucket| bucket.applications).sum()
    }

    pub fn total_interviews(&self) -> u32 {
        self.buckets.iter().map(|bucket| bucket.interviews).sum()
    }

    pub fn bucket(&self, date: NaiveDate) -> Option<&ActivityBucket> {
        self.position(date).map(|index| &self.buckets[index])
    }

    fn position(&self, date: NaiveDate) -> Option<usize> {
        let first = self.buckets.first()?.date;
        let index = usize::try_from((date - first).num_days()).ok()?;
        (index < self.buckets.len()).then_some(index)
    }
}

/// Accept a caller-supplied window length only within `1..=MAX_WINDOW_DAYS`.
pub fn validate_window_days(days: u32) -> Result<u32, ValidationError> {
    if (1..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ValidationError::WindowDays {
            value: days,
            max: MAX_WINDOW_DAYS,
        })
    }
}

/// Count applications by `applied_at` day and interviews by `scheduled_at` day over the
/// `window_days` days ending on the calendar's today.
pub fn build_activity_window(
    applications: &[ApplicationWithInterviews],
    window_days: u32,
    calendar: &ReportingCalendar,
) -> ActivityWindow {
    let reference = calendar.today();
    let buckets = (0..window_days)
        .rev()
        .filter_map(|back| reference.checked_sub_days(Days::new(u64::from(back))))
        .map(ActivityBucket::empty)
        .collect();

    let mut window = ActivityWindow {
        reference,
        window_days,
        buckets,
    };

    for entry in applications {
        if let Some(applied_at) = entry.application.applied_at {
            if let Some(index) = window.position(calendar.day_of(applied_at)) {
                window.buckets[index].applications += 1;
            }
        }

        for scheduled_at in entry
            .interviews
            .iter()
            .filter_map(|interview| interview.scheduled_at)
        {
            if let Some(index) = window.position(calendar.day_of(scheduled_at)) {
                window.buckets[index].interviews += 1;
            }
        }
    }

    for bucket in &mut window.buckets {
        bucket.heat = HeatLevel::for_counts(bucket.applications, bucket.interviews);
    }

    window
}
