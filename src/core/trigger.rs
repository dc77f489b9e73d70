use crate::core::availability::AvailabilityRegistry;
use crate::core::discovery::GameDiscovery;
use crate::core::error::MatchError;
use crate::core::proposals::ProposalEngine;
use crate::models::GameFilters;
use crate::services::store::EventStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Thresholds for turning scores into proposals
#[derive(Debug, Clone, Copy)]
pub struct TriggerSettings {
    /// Minimum total score worth proposing
    pub min_score: u8,
    /// Cap on proposals created by one reactive run for a player
    pub max_proposals: usize,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            min_score: 70,
            max_proposals: 10,
        }
    }
}

/// Outcome of a matching run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReport {
    /// Pairs scored
    pub candidates: usize,
    /// Proposals newly created
    pub proposed: usize,
    /// Pairs that already had a pending proposal
    pub already_pending: usize,
    /// Pairs whose event closed or vanished before the proposal was made
    #[serde(default)]
    pub skipped: usize,
}

/// Inbound entry point for background matching
///
/// Runs when an event starts looking for players, or when a player opens an
/// availability window. Single pass: score, filter by threshold, propose.
pub struct MatchingTrigger {
    registry: Arc<AvailabilityRegistry>,
    discovery: GameDiscovery,
    engine: Arc<ProposalEngine>,
    events: Arc<dyn EventStore>,
    settings: TriggerSettings,
}

impl MatchingTrigger {
    pub fn new(
        registry: Arc<AvailabilityRegistry>,
        discovery: GameDiscovery,
        engine: Arc<ProposalEngine>,
        events: Arc<dyn EventStore>,
        settings: TriggerSettings,
    ) -> Self {
        Self {
            registry,
            discovery,
            engine,
            events,
            settings,
        }
    }

    /// Propose a newly opened event to every player whose window fits it
    pub async fn on_event_opened(&self, event_id: &str) -> Result<TriggerReport, MatchError> {
        self.on_event_opened_at(event_id, Utc::now()).await
    }

    pub async fn on_event_opened_at(
        &self,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TriggerReport, MatchError> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("event {}", event_id)))?;

        let mut report = TriggerReport::default();

        let sport = match event.sport.as_deref().map(str::trim) {
            Some(sport) if event.is_open && !sport.is_empty() => sport,
            _ => {
                tracing::debug!("Event {} is closed or has no sport, nothing to match", event_id);
                return Ok(report);
            }
        };

        let windows = self.registry.active_for_sport(sport, now).await?;
        let scorer = self.discovery.scorer();

        for availability in &windows {
            report.candidates += 1;

            let score = scorer.score(availability, &event);
            if score.total < self.settings.min_score || !score.sport_matches() {
                continue;
            }

            self.propose_candidate(&availability.player_id, &event.event_id, now, &mut report)
                .await?;
        }

        tracing::info!(
            "Matching for event {}: {} candidates, {} proposed, {} already pending, {} skipped",
            event_id,
            report.candidates,
            report.proposed,
            report.already_pending,
            report.skipped
        );

        Ok(report)
    }

    /// Propose the best open games to a player who just opened a window
    pub async fn on_availability_opened(&self, player_id: &str) -> Result<TriggerReport, MatchError> {
        self.on_availability_opened_at(player_id, Utc::now()).await
    }

    pub async fn on_availability_opened_at(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TriggerReport, MatchError> {
        let availability = self
            .registry
            .current_at(player_id, now)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("active availability for player {}", player_id)))?;

        // Sport is left to the scorer, which compares case-insensitively
        let games = self
            .discovery
            .list_open_games(&GameFilters::default(), Some(&availability), None)
            .await?;

        let mut report = TriggerReport::default();

        for game in games {
            report.candidates += 1;

            let score = match game.score {
                Some(score) => score,
                None => break,
            };
            // Ranked descending, so nothing below this point qualifies either
            if score.total < self.settings.min_score
                || report.proposed + report.already_pending >= self.settings.max_proposals
            {
                break;
            }
            if !score.sport_matches() {
                continue;
            }

            self.propose_candidate(player_id, &game.event.event_id, now, &mut report)
                .await?;
        }

        tracing::info!(
            "Matching for player {}: {} candidates, {} proposed, {} already pending, {} skipped",
            player_id,
            report.candidates,
            report.proposed,
            report.already_pending,
            report.skipped
        );

        Ok(report)
    }

    /// Propose one pair, recording the outcome in `report`
    ///
    /// Listings may be served from cache, so an event can close or disappear
    /// between scoring and proposing. Such a pair is skipped; store failures
    /// still end the run.
    async fn propose_candidate(
        &self,
        player_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
        report: &mut TriggerReport,
    ) -> Result<(), MatchError> {
        match self.engine.propose_at(player_id, event_id, now).await {
            Ok(proposed) if proposed.created => report.proposed += 1,
            Ok(_) => report.already_pending += 1,
            Err(e @ (MatchError::Validation(_) | MatchError::NotFound(_))) => {
                tracing::debug!("Skipping event {} for player {}: {}", event_id, player_id, e);
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }
}
