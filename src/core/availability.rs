use crate::core::error::MatchError;
use crate::core::locks::KeyedLocks;
use crate::models::Availability;
use crate::services::events::{DomainEvent, EventBus};
use crate::services::store::AvailabilityStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Parameters for opening a window
#[derive(Debug, Clone)]
pub struct OpenWindow {
    pub sport: String,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub district: Option<String>,
    pub skill_level: Option<u8>,
}

/// Keeps at most one active "looking to play" window per player
///
/// `open` and `cancel` are serialized per player; the store's upsert keeps the
/// single-row invariant across processes. Expiry is applied lazily on read.
pub struct AvailabilityRegistry {
    store: Arc<dyn AvailabilityStore>,
    events: EventBus,
    locks: KeyedLocks<String>,
}

impl AvailabilityRegistry {
    pub fn new(store: Arc<dyn AvailabilityStore>, events: EventBus) -> Self {
        Self {
            store,
            events,
            locks: KeyedLocks::new(),
        }
    }

    /// Open a window for `player_id`, replacing any prior one
    pub async fn open(&self, player_id: &str, window: OpenWindow) -> Result<Availability, MatchError> {
        self.open_at(player_id, window, Utc::now()).await
    }

    pub async fn open_at(
        &self,
        player_id: &str,
        window: OpenWindow,
        now: DateTime<Utc>,
    ) -> Result<Availability, MatchError> {
        validate_window(player_id, &window)?;

        let availability = Availability {
            player_id: player_id.to_string(),
            sport: window.sport.trim().to_string(),
            from: window.from,
            until: window.until,
            district: window.district.filter(|d| !d.trim().is_empty()),
            skill_level: window.skill_level,
            created_at: now,
        };

        let _guard = self.locks.lock(&availability.player_id).await;

        let previous = self.store.get(player_id).await?;
        let stored = self.store.upsert(availability).await?;

        if previous.is_some() {
            tracing::info!("Replaced availability for player {} ({})", player_id, stored.sport);
        } else {
            tracing::info!("Opened availability for player {} ({})", player_id, stored.sport);
        }

        self.events.emit(DomainEvent::AvailabilityOpened {
            availability: stored.clone(),
        });

        Ok(stored)
    }

    /// Remove the player's window; a no-op when none exists
    pub async fn cancel(&self, player_id: &str) -> Result<(), MatchError> {
        let _guard = self.locks.lock(&player_id.to_string()).await;

        if self.store.delete(player_id).await? {
            tracing::info!("Cancelled availability for player {}", player_id);
            self.events.emit(DomainEvent::AvailabilityCancelled {
                player_id: player_id.to_string(),
            });
        } else {
            tracing::debug!("No availability to cancel for player {}", player_id);
        }

        Ok(())
    }

    pub async fn current(&self, player_id: &str) -> Result<Option<Availability>, MatchError> {
        self.current_at(player_id, Utc::now()).await
    }

    /// The active window at `now`; an expired window reads as absent
    pub async fn current_at(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Availability>, MatchError> {
        let record = self.store.get(player_id).await?;
        Ok(record.filter(|a| a.is_active_at(now)))
    }

    /// Active windows for a sport, used by reactive matching
    pub async fn active_for_sport(
        &self,
        sport: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Availability>, MatchError> {
        Ok(self.store.list_active(sport, now).await?)
    }
}

fn validate_window(player_id: &str, window: &OpenWindow) -> Result<(), MatchError> {
    if player_id.trim().is_empty() {
        return Err(MatchError::Validation("player id is required".to_string()));
    }

    if window.sport.trim().is_empty() {
        return Err(MatchError::Validation("sport is required".to_string()));
    }

    if window.from >= window.until {
        return Err(MatchError::Validation(format!(
            "window start {} must be before its end {}",
            window.from, window.until
        )));
    }

    if let Some(level) = window.skill_level {
        if !(1..=5).contains(&level) {
            return Err(MatchError::Validation(format!(
                "skill level {} is outside 1-5",
                level
            )));
        }
    }

    Ok(())
}
