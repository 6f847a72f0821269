//! Polls, options, votes and vote tallying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    #[default]
    Active,
    Closed,
}

fn default_poll_type() -> String {
    "general".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_poll_type")]
    pub poll_type: String,
    #[serde(default)]
    pub multiple_choice: bool,
    #[serde(default)]
    pub status: PollStatus,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Poll {
    /// Open while active and before its closing time, if it has one.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == PollStatus::Active && self.closes_at.is_none_or(|closes_at| now < closes_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollDraft {
    pub title: String,
    pub description: Option<String>,
    pub poll_type: String,
    pub multiple_choice: bool,
    pub created_by: Uuid,
    pub closes_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PollPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PollStatus>,
}

impl PollPatch {
    pub fn close() -> Self {
        Self {
            status: Some(PollStatus::Closed),
            ..Self::default()
        }
    }
}

impl Entity for Poll {
    const TABLE: &'static str = "polls";
    const ENTITY_TYPE: &'static str = "poll";
    type Draft = PollDraft;
    type Patch = PollPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_text: String,
    #[serde(default)]
    pub option_data: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOptionDraft {
    pub poll_id: Uuid,
    pub option_text: String,
    pub option_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOptionPatch {
    pub option_text: String,
}

impl Entity for PollOption {
    const TABLE: &'static str = "poll_options";
    const ENTITY_TYPE: &'static str = "poll_option";
    type Draft = PollOptionDraft;
    type Patch = PollOptionPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollVote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollVoteDraft {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollVotePatch {
    pub option_id: Uuid,
}

impl Entity for PollVote {
    const TABLE: &'static str = "poll_votes";
    const ENTITY_TYPE: &'static str = "poll_vote";
    type Draft = PollVoteDraft;
    type Patch = PollVotePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// What casting a single-choice vote should do given the caller's existing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Insert,
    /// Move the existing vote to another option.
    Change { vote_id: Uuid },
    /// Already voted for this option.
    Unchanged,
}

impl VoteAction {
    pub fn decide(existing: Option<&PollVote>, option_id: Uuid) -> Self {
        match existing {
            None => Self::Insert,
            Some(vote) if vote.option_id == option_id => Self::Unchanged,
            Some(vote) => Self::Change { vote_id: vote.id },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub option_id: Uuid,
    pub option_text: String,
    pub votes: u32,
}

/// Vote counts per option, in option order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PollTally {
    pub options: Vec<OptionTally>,
    pub total_votes: u32,
}

impl PollTally {
    /// Counts votes per option. Votes for unknown options are ignored.
    pub fn from_votes(options: &[PollOption], votes: &[PollVote]) -> Self {
        let options: Vec<OptionTally> = options
            .iter()
            .map(|option| OptionTally {
                option_id: option.id,
                option_text: option.option_text.clone(),
                votes: votes
                    .iter()
                    .filter(|vote| vote.option_id == option.id)
                    .count() as u32,
            })
            .collect();
        let total_votes = options.iter().map(|o| o.votes).sum();

        Self {
            options,
            total_votes,
        }
    }

    /// Options sharing the highest non-zero count.
    pub fn leaders(&self) -> Vec<&OptionTally> {
        let max = self.options.iter().map(|o| o.votes).max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }
        self.options.iter().filter(|o| o.votes == max).collect()
    }

    /// Percentage of total votes, rounded to the nearest integer.
    pub fn percentage(&self, option_id: Uuid) -> u32 {
        if self.total_votes == 0 {
            return 0;
        }
        self.options
            .iter()
            .find(|o| o.option_id == option_id)
            .map(|o| ((o.votes as f64 / self.total_votes as f64) * 100.0).round() as u32)
            .unwrap_or(0)
    }
}
