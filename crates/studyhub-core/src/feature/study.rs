//! Study sessions, attendance, comments, notes and quizzes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MemberRef, member_name};
use crate::repository::{Entity, Immutable};

/// Location stored when the organizer leaves it blank.
pub const DEFAULT_LOCATION: &str = "Online";

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub presenter: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub session_date: DateTime<Utc>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StudySession {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.session_date >= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySessionDraft {
    pub title: String,
    pub presenter: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub session_date: DateTime<Utc>,
    pub location: String,
    pub created_by: Uuid,
}

impl StudySessionDraft {
    pub fn new(title: impl Into<String>, session_date: DateTime<Utc>, created_by: Uuid) -> Self {
        Self {
            title: title.into(),
            presenter: None,
            topic: None,
            description: None,
            session_date,
            location: default_location(),
            created_by,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        let location = location.trim();
        self.location = if location.is_empty() {
            default_location()
        } else {
            location.to_string()
        };
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudySessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Entity for StudySession {
    const TABLE: &'static str = "study_sessions";
    const ENTITY_TYPE: &'static str = "study_session";
    type Draft = StudySessionDraft;
    type Patch = StudySessionPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub absent_fee: i64,
    /// Embedded `profiles(name, email)` when the query asked for it.
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDraft {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    pub absent_fee: i64,
}

impl AttendanceDraft {
    /// The fee only sticks to absences; present or late rows carry zero.
    pub fn new(session_id: Uuid, user_id: Uuid, status: AttendanceStatus, absent_fee: i64) -> Self {
        Self {
            session_id,
            user_id,
            status,
            absent_fee: if status == AttendanceStatus::Absent {
                absent_fee
            } else {
                0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePatch {
    pub status: AttendanceStatus,
    pub absent_fee: i64,
}

impl From<&AttendanceDraft> for AttendancePatch {
    fn from(draft: &AttendanceDraft) -> Self {
        Self {
            status: draft.status,
            absent_fee: draft.absent_fee,
        }
    }
}

impl Entity for Attendance {
    const TABLE: &'static str = "session_attendance";
    const ENTITY_TYPE: &'static str = "attendance";
    type Draft = AttendanceDraft;
    type Patch = AttendancePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Per-member absence totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemberAbsence {
    pub absent_count: u32,
    pub total_fee: i64,
}

/// Absence-fee statistics over attendance rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AbsenceStats {
    pub total_absent_fee: i64,
    pub absent_count: u32,
    /// Keyed by display name; unnamed members share the anonymous bucket.
    pub members: BTreeMap<String, MemberAbsence>,
}

impl AbsenceStats {
    /// Rows with a zero fee do not contribute.
    pub fn from_attendance<'a>(rows: impl IntoIterator<Item = &'a Attendance>) -> Self {
        let mut stats = Self::default();

        for row in rows.into_iter().filter(|row| row.absent_fee != 0) {
            stats.total_absent_fee += row.absent_fee;

            let entry = stats
                .members
                .entry(member_name(row.member.as_ref()).to_string())
                .or_default();

            if row.status == AttendanceStatus::Absent {
                stats.absent_count += 1;
                entry.absent_count += 1;
                entry.total_fee += row.absent_fee;
            }
        }

        stats
    }
}

/// Attendance counts for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AttendanceSummary {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

impl AttendanceSummary {
    pub fn from_attendance<'a>(rows: impl IntoIterator<Item = &'a Attendance>) -> Self {
        rows.into_iter().fold(Self::default(), |mut acc, row| {
            match row.status {
                AttendanceStatus::Present => acc.present += 1,
                AttendanceStatus::Absent => acc.absent += 1,
                AttendanceStatus::Late => acc.late += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionComment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCommentDraft {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCommentPatch {
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl Entity for SessionComment {
    const TABLE: &'static str = "session_comments";
    const ENTITY_TYPE: &'static str = "session_comment";
    type Draft = SessionCommentDraft;
    type Patch = SessionCommentPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLike {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLikeDraft {
    pub session_id: Uuid,
    pub user_id: Uuid,
}

impl Entity for SessionLike {
    const TABLE: &'static str = "session_likes";
    const ENTITY_TYPE: &'static str = "session_like";
    type Draft = SessionLikeDraft;
    type Patch = Immutable;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Shared notes for one session (one row per session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyNote {
    pub id: Uuid,
    pub session_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub updated_by: Option<Uuid>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyNoteDraft {
    pub session_id: Uuid,
    pub content: String,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyNotePatch {
    pub content: String,
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl Entity for StudyNote {
    const TABLE: &'static str = "study_notes";
    const ENTITY_TYPE: &'static str = "study_note";
    type Draft = StudyNoteDraft;
    type Patch = StudyNotePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyQuiz {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

impl StudyQuiz {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer && answer < self.options.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyQuizDraft {
    pub session_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudyQuizPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Entity for StudyQuiz {
    const TABLE: &'static str = "study_quizzes";
    const ENTITY_TYPE: &'static str = "study_quiz";
    type Draft = StudyQuizDraft;
    type Patch = StudyQuizPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendance(status: AttendanceStatus, fee: i64, name: Option<&str>) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            status,
            absent_fee: fee,
            member: name.map(|n| MemberRef {
                name: Some(n.to_string()),
                email: None,
            }),
        }
    }

    #[test]
    fn test_draft_zeroes_fee_unless_absent() {
        let late = AttendanceDraft::new(Uuid::nil(), Uuid::nil(), AttendanceStatus::Late, 5000);
        assert_eq!(late.absent_fee, 0);

        let absent = AttendanceDraft::new(Uuid::nil(), Uuid::nil(), AttendanceStatus::Absent, 5000);
        assert_eq!(absent.absent_fee, 5000);
    }

    #[test]
    fn test_absence_stats_per_member() {
        let rows = vec![
            attendance(AttendanceStatus::Absent, 5000, Some("Kim")),
            attendance(AttendanceStatus::Absent, 5000, Some("Kim")),
            attendance(AttendanceStatus::Absent, 3000, None),
            attendance(AttendanceStatus::Present, 0, Some("Lee")),
        ];

        let stats = AbsenceStats::from_attendance(&rows);

        assert_eq!(stats.total_absent_fee, 13000);
        assert_eq!(stats.absent_count, 3);
        assert_eq!(
            stats.members.get("Kim"),
            Some(&MemberAbsence {
                absent_count: 2,
                total_fee: 10000
            })
        );
        assert_eq!(stats.members.get(super::super::ANONYMOUS).map(|m| m.total_fee), Some(3000));
        assert!(!stats.members.contains_key("Lee"));
    }

    #[test]
    fn test_attendance_summary() {
        let rows = vec![
            attendance(AttendanceStatus::Present, 0, None),
            attendance(AttendanceStatus::Present, 0, None),
            attendance(AttendanceStatus::Late, 0, None),
        ];
        let summary = AttendanceSummary::from_attendance(&rows);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.absent, 0);
    }

    #[test]
    fn test_blank_location_falls_back() {
        let draft = StudySessionDraft::new("RAG deep dive", Utc::now(), Uuid::nil()).with_location("  ");
        assert_eq!(draft.location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_quiz_answer_check() {
        let quiz = StudyQuiz {
            id: Uuid::nil(),
            session_id: Uuid::nil(),
            question: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_answer: 1,
            explanation: None,
            created_by: None,
        };
        assert!(quiz.is_correct(1));
        assert!(!quiz.is_correct(0));
    }
}
