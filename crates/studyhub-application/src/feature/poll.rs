use std::sync::Arc;

use chrono::Utc;
use studyhub_core::error::{Result, StudyhubError};
use studyhub_core::feature::poll::{
    Poll, PollOption, PollTally, PollVote, PollVoteDraft, PollVotePatch, VoteAction,
};
use studyhub_core::repository::{EntityTable, Query};
use uuid::Uuid;

/// What a vote call ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Cast(PollVote),
    Changed(PollVote),
    Unchanged,
}

/// Voting and tallies for single-choice polls.
pub struct PollService {
    polls: Arc<dyn EntityTable<Poll>>,
    options: Arc<dyn EntityTable<PollOption>>,
    votes: Arc<dyn EntityTable<PollVote>>,
}

impl PollService {
    pub fn new(
        polls: Arc<dyn EntityTable<Poll>>,
        options: Arc<dyn EntityTable<PollOption>>,
        votes: Arc<dyn EntityTable<PollVote>>,
    ) -> Self {
        Self {
            polls,
            options,
            votes,
        }
    }

    /// Casts or moves the caller's vote. Closed polls reject the vote.
    pub async fn vote(&self, poll_id: Uuid, option_id: Uuid, user_id: Uuid) -> Result<VoteOutcome> {
        let poll = self.polls.get(poll_id).await?;
        if !poll.is_open(Utc::now()) {
            return Err(StudyhubError::validation(format!("poll {poll_id} is closed")));
        }

        let existing = self
            .votes
            .list(&Query::new().eq("poll_id", poll_id).eq("user_id", user_id))
            .await?;

        match VoteAction::decide(existing.first(), option_id) {
            VoteAction::Insert => {
                let draft = PollVoteDraft {
                    poll_id,
                    option_id,
                    user_id,
                };
                Ok(VoteOutcome::Cast(self.votes.create(&draft).await?))
            }
            VoteAction::Change { vote_id } => {
                let vote = self.votes.update(vote_id, &PollVotePatch { option_id }).await?;
                Ok(VoteOutcome::Changed(vote))
            }
            VoteAction::Unchanged => Ok(VoteOutcome::Unchanged),
        }
    }

    pub async fn tally(&self, poll_id: Uuid) -> Result<PollTally> {
        let options = self
            .options
            .list(&Query::new().eq("poll_id", poll_id).order_asc("created_at"))
            .await?;
        let votes = self.votes.list(&Query::new().eq("poll_id", poll_id)).await?;
        Ok(PollTally::from_votes(&options, &votes))
    }
}
