use crate::models::{Availability, MatchProposal};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity for the event bus
const DEFAULT_CAPACITY: usize = 1024;

/// Domain events published for downstream notification delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AvailabilityOpened { availability: Availability },
    AvailabilityCancelled { player_id: String },
    ProposalCreated { proposal: MatchProposal },
    ProposalAccepted { proposal: MatchProposal },
    ProposalDeclined { proposal: MatchProposal },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::AvailabilityOpened { .. } => "availability_opened",
            DomainEvent::AvailabilityCancelled { .. } => "availability_cancelled",
            DomainEvent::ProposalCreated { .. } => "proposal_created",
            DomainEvent::ProposalAccepted { .. } => "proposal_accepted",
            DomainEvent::ProposalDeclined { .. } => "proposal_declined",
        }
    }

    /// The player a notification should be addressed to
    pub fn player_id(&self) -> &str {
        match self {
            DomainEvent::AvailabilityOpened { availability } => &availability.player_id,
            DomainEvent::AvailabilityCancelled { player_id } => player_id,
            DomainEvent::ProposalCreated { proposal }
            | DomainEvent::ProposalAccepted { proposal }
            | DomainEvent::ProposalDeclined { proposal } => &proposal.player_id,
        }
    }
}

/// Broadcast bus for domain events
///
/// Emission is fire-and-forget: with no subscribers the event is dropped, and
/// slow subscribers may lag and miss events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of subscribers that received the event
    pub fn emit(&self, event: DomainEvent) -> usize {
        tracing::debug!("Emitting {} for player {}", event.name(), event.player_id());
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward domain events to the notification log until the bus closes
pub async fn run_notification_forwarder(mut receiver: broadcast::Receiver<DomainEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let payload = serde_json::to_string(&event).unwrap_or_default();
                tracing::info!(
                    event = event.name(),
                    player_id = event.player_id(),
                    "Notification queued: {}",
                    payload
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Notification forwarder lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Event bus closed, stopping notification forwarder");
                break;
            }
        }
    }
}
