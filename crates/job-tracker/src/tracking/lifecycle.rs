use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationRecord, ApplicationStatus};

/// Field updates produced by a status change. Absent timestamps are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPatch {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
}

impl StatusPatch {
    /// Names of the record fields this patch writes.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["status"];
        if self.applied_at.is_some() {
            fields.push("applied_at");
        }
        if self.rejected_at.is_some() {
            fields.push("rejected_at");
        }
        fields
    }

    pub fn apply_to(&self, record: &mut ApplicationRecord) {
        record.status = self.status;
        if let Some(applied_at) = self.applied_at {
            record.applied_at = Some(applied_at);
        }
        if let Some(rejected_at) = self.rejected_at {
            record.rejected_at = Some(rejected_at);
        }
    }
}

/// Compute the updates for moving `current` to `requested`.
///
/// Any status may follow any other. Besides the status itself, only timestamps are written:
/// applying stamps `applied_at`, rejecting stamps `rejected_at`, and interviewing or rejecting
/// an application that was never marked applied backfills `applied_at`. Nothing is cleared.
pub fn compute_status_update(
    current: &ApplicationRecord,
    requested: ApplicationStatus,
    now: DateTime<Utc>,
) -> StatusPatch {
    let mut patch = StatusPatch {
        status: requested,
        applied_at: None,
        rejected_at: None,
    };

    match requested {
        ApplicationStatus::Applied => patch.applied_at = Some(now),
        ApplicationStatus::Rejected => patch.rejected_at = Some(now),
        _ => {}
    }

    let skipped_applied = current.applied_at.is_none()
        && matches!(
            requested,
            ApplicationStatus::Interviewing | ApplicationStatus::Rejected
        );
    if skipped_applied {
        patch.applied_at = Some(now);
    }

    patch
}
