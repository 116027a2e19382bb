use std::collections::BTreeSet;

use chrono::Datelike;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::super::calendar::ReportingCalendar;
use super::super::domain::ApplicationRecord;

const WEEKLY_FALLBACK: &str = "You've applied to {count} jobs this week. Great work!";
const STREAK_FALLBACK: &str = "You're on a {count}-day application streak!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncouragementStats {
    /// Applications submitted in the ISO week containing today.
    pub weekly_count: u32,
    /// Consecutive days with at least one application, ending today or yesterday.
    pub streak_length: u32,
}

impl EncouragementStats {
    pub fn preferred_kind(&self) -> Option<EncouragementKind> {
        if self.weekly_count == 0 && self.streak_length == 0 {
            None
        } else if self.streak_length > self.weekly_count {
            Some(EncouragementKind::Streak)
        } else {
            Some(EncouragementKind::Weekly)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncouragementKind {
    Streak,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encouragement {
    pub kind: EncouragementKind,
    pub count: u32,
    pub message: String,
}

/// Message templates; `{count}` is replaced with the relevant number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePools {
    pub weekly: Vec<String>,
    pub streak: Vec<String>,
}

impl Default for MessagePools {
    fn default() -> Self {
        let weekly = [
            "You've applied to {count} jobs this week. Great work! 👏",
            "Amazing! You've submitted {count} applications this week! 🌟",
            "{count} applications this week - you're crushing it! 💪",
            "Way to go! {count} job applications completed this week! 🎯",
            "You're on fire! {count} applications sent out this week! 🚀",
            "Fantastic progress - {count} applications this week! Keep it up! ✨",
            "{count} applications this week! Your future self will thank you! 🙌",
            "Impressive! {count} opportunities pursued this week! 📈",
        ];
        let streak = [
            "You're on a {count}-day application streak! 🔥",
            "Incredible! You've applied to jobs for {count} days straight! 🔥",
            "{count} days in a row - you're building amazing momentum! ⚡",
            "What a streak! {count} consecutive days of job hunting! 🏆",
            "{count}-day streak! Consistency is your superpower! 💫",
            "Unstoppable! {count} days of continuous progress! 🌟",
            "{count} days running - you're absolutely crushing this! 🎯",
            "{count}-day winning streak! Your dedication is inspiring! 🚀",
            "Amazing consistency! {count} days of taking action! 👏",
        ];

        Self {
            weekly: weekly.into_iter().map(str::to_string).collect(),
            streak: streak.into_iter().map(str::to_string).collect(),
        }
    }
}

pub fn compute_encouragement<'a, I>(
    applications: I,
    calendar: &ReportingCalendar,
) -> EncouragementStats
where
    I: IntoIterator<Item = &'a ApplicationRecord>,
{
    let today = calendar.today();
    let this_week = today.iso_week();

    let mut weekly_count = 0;
    let mut applied_days = BTreeSet::new();
    for applied_at in applications
        .into_iter()
        .filter_map(|application| application.applied_at)
    {
        let day = calendar.day_of(applied_at);
        if day.iso_week() == this_week {
            weekly_count += 1;
        }
        applied_days.insert(day);
    }

    let mut cursor = if applied_days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak_length = 0;
    while let Some(day) = cursor.filter(|day| applied_days.contains(day)) {
        streak_length += 1;
        cursor = day.pred_opt();
    }

    EncouragementStats {
        weekly_count,
        streak_length,
    }
}

/// Pick a message for whichever number is more flattering. `None` when there is nothing to
/// celebrate.
pub fn select_message<R>(
    stats: &EncouragementStats,
    pools: &MessagePools,
    rng: &mut R,
) -> Option<Encouragement>
where
    R: Rng + ?Sized,
{
    let kind = stats.preferred_kind()?;
    let (pool, count, fallback) = match kind {
        EncouragementKind::Streak => (&pools.streak, stats.streak_length, STREAK_FALLBACK),
        EncouragementKind::Weekly => (&pools.weekly, stats.weekly_count, WEEKLY_FALLBACK),
    };

    let template = pool.choose(rng).map_or(fallback, String::as_str);

    Some(Encouragement {
        kind,
        count,
        message: template.replace("{count}", &count.to_string()),
    })
}
