use crate::core::error::MatchError;
use crate::core::locks::KeyedLocks;
use crate::models::{MatchProposal, ProposalStatus};
use crate::services::events::{DomainEvent, EventBus};
use crate::services::store::{EventStore, ProposalStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Result of a `propose` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposed {
    pub proposal: MatchProposal,
    /// False when an existing pending proposal was returned
    pub created: bool,
}

/// Creates and resolves match proposals
///
/// State machine: `pending -> accepted` and `pending -> declined`, both
/// terminal. Acceptance writes attendance to the event store before the
/// proposal leaves `pending`, and there is no way back out of `accepted`.
pub struct ProposalEngine {
    proposals: Arc<dyn ProposalStore>,
    events: Arc<dyn EventStore>,
    bus: EventBus,
    pair_locks: KeyedLocks<(String, String)>,
    proposal_locks: KeyedLocks<Uuid>,
}

impl ProposalEngine {
    pub fn new(proposals: Arc<dyn ProposalStore>, events: Arc<dyn EventStore>, bus: EventBus) -> Self {
        Self {
            proposals,
            events,
            bus,
            pair_locks: KeyedLocks::new(),
            proposal_locks: KeyedLocks::new(),
        }
    }

    /// Propose `event_id` to `player_id`, idempotent per pending pair
    pub async fn propose(&self, player_id: &str, event_id: &str) -> Result<MatchProposal, MatchError> {
        Ok(self.propose_at(player_id, event_id, Utc::now()).await?.proposal)
    }

    pub async fn propose_at(
        &self,
        player_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Proposed, MatchError> {
        if player_id.trim().is_empty() || event_id.trim().is_empty() {
            return Err(MatchError::Validation(
                "player id and event id are required".to_string(),
            ));
        }

        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("event {}", event_id)))?;

        if !event.is_open {
            return Err(MatchError::Validation(format!(
                "event {} is not looking for players",
                event_id
            )));
        }

        let _guard = self
            .pair_locks
            .lock(&(player_id.to_string(), event_id.to_string()))
            .await;

        let (proposal, created) = self.proposals.insert_pending(player_id, event_id, now).await?;

        if created {
            tracing::info!(
                "Created proposal {} for player {} on event {}",
                proposal.id,
                player_id,
                event_id
            );
            self.bus.emit(DomainEvent::ProposalCreated {
                proposal: proposal.clone(),
            });
        } else {
            tracing::debug!(
                "Proposal {} already pending for player {} on event {}",
                proposal.id,
                player_id,
                event_id
            );
        }

        Ok(Proposed { proposal, created })
    }

    /// Accept a pending proposal; binding once it succeeds
    ///
    /// The attendance write happens first. If it fails the proposal stays
    /// `pending` and the call can be retried; the write is idempotent.
    ///
    /// The proposal lock only serializes callers within this process. With a
    /// shared database another instance can decline the proposal between the
    /// attendance write and the status change; the compare-and-set then fails,
    /// the conflict is logged as an error and `InvalidTransition` is returned
    /// while the attendance record stays in place.
    pub async fn accept(&self, proposal_id: Uuid, actor: &str) -> Result<MatchProposal, MatchError> {
        let _guard = self.proposal_locks.lock(&proposal_id).await;
        let proposal = self.load_pending(proposal_id, actor, ProposalStatus::Accepted).await?;

        if let Err(e) = self
            .events
            .record_attendance(&proposal.player_id, &proposal.event_id)
            .await
        {
            tracing::warn!(
                "Attendance write failed for proposal {}, leaving it pending: {}",
                proposal_id,
                e
            );
            return Err(e.into());
        }

        let accepted = match self.finish(&proposal, ProposalStatus::Accepted).await {
            Ok(accepted) => accepted,
            Err(e @ MatchError::InvalidTransition { .. }) => {
                tracing::error!(
                    "Attendance recorded for player {} on event {} but proposal {} was resolved elsewhere: {}",
                    proposal.player_id,
                    proposal.event_id,
                    proposal_id,
                    e
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "Player {} accepted proposal {} for event {}",
            accepted.player_id,
            accepted.id,
            accepted.event_id
        );
        self.bus.emit(DomainEvent::ProposalAccepted {
            proposal: accepted.clone(),
        });

        Ok(accepted)
    }

    pub async fn decline(&self, proposal_id: Uuid, actor: &str) -> Result<MatchProposal, MatchError> {
        let _guard = self.proposal_locks.lock(&proposal_id).await;
        let proposal = self.load_pending(proposal_id, actor, ProposalStatus::Declined).await?;

        let declined = self.finish(&proposal, ProposalStatus::Declined).await?;

        tracing::info!(
            "Player {} declined proposal {} for event {}",
            declined.player_id,
            declined.id,
            declined.event_id
        );
        self.bus.emit(DomainEvent::ProposalDeclined {
            proposal: declined.clone(),
        });

        Ok(declined)
    }

    pub async fn get(&self, proposal_id: Uuid) -> Result<MatchProposal, MatchError> {
        self.proposals
            .get(proposal_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("proposal {}", proposal_id)))
    }

    pub async fn list_for_player(&self, player_id: &str) -> Result<Vec<MatchProposal>, MatchError> {
        Ok(self.proposals.list_for_player(player_id).await?)
    }

    async fn load_pending(
        &self,
        proposal_id: Uuid,
        actor: &str,
        to: ProposalStatus,
    ) -> Result<MatchProposal, MatchError> {
        let proposal = self.get(proposal_id).await?;

        if proposal.player_id != actor {
            return Err(MatchError::Forbidden(format!(
                "proposal {} belongs to another player",
                proposal_id
            )));
        }

        if proposal.status != ProposalStatus::Pending {
            return Err(MatchError::InvalidTransition {
                id: proposal_id,
                from: proposal.status,
                to,
            });
        }

        Ok(proposal)
    }

    async fn finish(&self, proposal: &MatchProposal, to: ProposalStatus) -> Result<MatchProposal, MatchError> {
        match self
            .proposals
            .transition(proposal.id, ProposalStatus::Pending, to, Utc::now())
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                // Resolved concurrently by another process
                let current = self.get(proposal.id).await?;
                Err(MatchError::InvalidTransition {
                    id: proposal.id,
                    from: current.status,
                    to,
                })
            }
        }
    }
}
