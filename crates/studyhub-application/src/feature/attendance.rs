use std::sync::Arc;

use studyhub_core::error::Result;
use studyhub_core::feature::study::{
    AbsenceStats, Attendance, AttendanceDraft, AttendancePatch, AttendanceStatus,
    AttendanceSummary,
};
use studyhub_core::repository::{EntityTable, Query};
use uuid::Uuid;

/// Attendance marking and absence-fee statistics.
pub struct AttendanceService {
    attendance: Arc<dyn EntityTable<Attendance>>,
}

impl AttendanceService {
    pub fn new(attendance: Arc<dyn EntityTable<Attendance>>) -> Self {
        Self { attendance }
    }

    /// Records one member's attendance, replacing an earlier mark for the same session.
    pub async fn mark(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        status: AttendanceStatus,
        absent_fee: i64,
    ) -> Result<Attendance> {
        let draft = AttendanceDraft::new(session_id, user_id, status, absent_fee);
        let existing = self
            .attendance
            .list(&Query::new().eq("session_id", session_id).eq("user_id", user_id))
            .await?;

        match existing.first() {
            Some(row) => {
                self.attendance
                    .update(row.id, &AttendancePatch::from(&draft))
                    .await
            }
            None => self.attendance.create(&draft).await,
        }
    }

    pub async fn summary(&self, session_id: Uuid) -> Result<AttendanceSummary> {
        let rows = self
            .attendance
            .list(&Query::new().eq("session_id", session_id))
            .await?;
        Ok(AttendanceSummary::from_attendance(&rows))
    }

    pub async fn absence_stats(&self) -> Result<AbsenceStats> {
        let rows = self
            .attendance
            .list(&Query::new().eq("status", "absent"))
            .await?;
        Ok(AbsenceStats::from_attendance(&rows))
    }
}
