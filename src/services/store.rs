use crate::models::{normalize_sport, Availability, CandidateEvent, GameFilters, MatchProposal, ProposalStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Errors raised at a storage boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Failed to decode stored record: {0}")]
    Decode(String),
}

/// Single active availability record per player
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Insert or replace the player's record
    async fn upsert(&self, availability: Availability) -> Result<Availability, StoreError>;

    /// Remove the player's record, returning whether one existed
    async fn delete(&self, player_id: &str) -> Result<bool, StoreError>;

    /// Raw read; expiry is applied by the caller
    async fn get(&self, player_id: &str) -> Result<Option<Availability>, StoreError>;

    /// Windows for `sport` (case-insensitive) still active at `now`
    async fn list_active(&self, sport: &str, now: DateTime<Utc>) -> Result<Vec<Availability>, StoreError>;
}

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Atomically insert a pending proposal unless one is already pending for
    /// the pair. Returns the pending proposal and whether it was created.
    async fn insert_pending(
        &self,
        player_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(MatchProposal, bool), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<MatchProposal>, StoreError>;

    /// Compare-and-set on status. `None` when the stored status is not `from`
    /// (or the proposal does not exist).
    async fn transition(
        &self,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchProposal>, StoreError>;

    /// Newest first
    async fn list_for_player(&self, player_id: &str) -> Result<Vec<MatchProposal>, StoreError>;
}

/// External event store: read open events, write attendance on acceptance
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_open(&self, filters: &GameFilters) -> Result<Vec<CandidateEvent>, StoreError>;

    async fn get(&self, event_id: &str) -> Result<Option<CandidateEvent>, StoreError>;

    /// Must be idempotent per (player, event)
    async fn record_attendance(&self, player_id: &str, event_id: &str) -> Result<(), StoreError>;
}

/// In-process availability store
#[derive(Default)]
pub struct MemoryAvailabilityStore {
    records: Mutex<HashMap<String, Availability>>,
}

impl MemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityStore for MemoryAvailabilityStore {
    async fn upsert(&self, availability: Availability) -> Result<Availability, StoreError> {
        let mut records = self.records.lock().await;
        records.insert(availability.player_id.clone(), availability.clone());
        Ok(availability)
    }

    async fn delete(&self, player_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().await.remove(player_id).is_some())
    }

    async fn get(&self, player_id: &str) -> Result<Option<Availability>, StoreError> {
        Ok(self.records.lock().await.get(player_id).cloned())
    }

    async fn list_active(&self, sport: &str, now: DateTime<Utc>) -> Result<Vec<Availability>, StoreError> {
        let wanted = normalize_sport(sport);
        let records = self.records.lock().await;
        let mut active: Vec<Availability> = records
            .values()
            .filter(|a| a.is_active_at(now) && normalize_sport(&a.sport) == wanted)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(active)
    }
}

/// In-process proposal store; the map lock makes check-and-insert atomic
#[derive(Default)]
pub struct MemoryProposalStore {
    proposals: Mutex<Vec<MatchProposal>>,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProposalStore for MemoryProposalStore {
    async fn insert_pending(
        &self,
        player_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(MatchProposal, bool), StoreError> {
        let mut proposals = self.proposals.lock().await;

        if let Some(existing) = proposals.iter().find(|p| {
            p.player_id == player_id && p.event_id == event_id && p.status == ProposalStatus::Pending
        }) {
            return Ok((existing.clone(), false));
        }

        let proposal = MatchProposal::pending(player_id, event_id, now);
        proposals.push(proposal.clone());
        Ok((proposal, true))
    }

    async fn get(&self, id: Uuid) -> Result<Option<MatchProposal>, StoreError> {
        Ok(self.proposals.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchProposal>, StoreError> {
        let mut proposals = self.proposals.lock().await;

        match proposals.iter_mut().find(|p| p.id == id && p.status == from) {
            Some(proposal) => {
                proposal.status = to;
                proposal.resolved_at = Some(now);
                Ok(Some(proposal.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_for_player(&self, player_id: &str) -> Result<Vec<MatchProposal>, StoreError> {
        let proposals = self.proposals.lock().await;
        let mut owned: Vec<MatchProposal> = proposals
            .iter()
            .filter(|p| p.player_id == player_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

/// In-process event store with an attendance set
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<CandidateEvent>>,
    attendance: Mutex<HashSet<(String, String)>>,
    failures_remaining: Mutex<u32>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CandidateEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    pub async fn insert(&self, event: CandidateEvent) {
        let mut events = self.events.lock().await;
        events.retain(|e| e.event_id != event.event_id);
        events.push(event);
    }

    /// Make the next `count` attendance writes fail as unavailable
    pub async fn fail_next_attendance_writes(&self, count: u32) {
        *self.failures_remaining.lock().await = count;
    }

    pub async fn attendance(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self.attendance.lock().await.iter().cloned().collect();
        rows.sort();
        rows
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn list_open(&self, filters: &GameFilters) -> Result<Vec<CandidateEvent>, StoreError> {
        let events = self.events.lock().await;
        Ok(events.iter().filter(|e| filters.matches(e)).cloned().collect())
    }

    async fn get(&self, event_id: &str) -> Result<Option<CandidateEvent>, StoreError> {
        let events = self.events.lock().await;
        Ok(events.iter().find(|e| e.event_id == event_id).cloned())
    }

    async fn record_attendance(&self, player_id: &str, event_id: &str) -> Result<(), StoreError> {
        {
            let mut failures = self.failures_remaining.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(StoreError::Unavailable("attendance write failed".to_string()));
            }
        }

        self.attendance
            .lock()
            .await
            .insert((player_id.to_string(), event_id.to_string()));
        Ok(())
    }
}
