// Route exports
pub mod availability;
pub mod games;
pub mod health;
pub mod matching;
pub mod proposals;

use crate::config::MatchingSettings;
use crate::core::{
    AvailabilityRegistry, DistrictGraph, GameDiscovery, MatchError, MatchScorer, MatchingTrigger,
    ProposalEngine, TriggerSettings,
};
use crate::models::ErrorResponse;
use crate::services::{AvailabilityStore, EventBus, EventStore, PostgresClient, ProposalStore, StoreError};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AvailabilityRegistry>,
    pub engine: Arc<ProposalEngine>,
    pub discovery: GameDiscovery,
    pub trigger: Arc<MatchingTrigger>,
    pub graph: Arc<DistrictGraph>,
    pub matching: MatchingSettings,
    pub postgres: Option<Arc<PostgresClient>>,
}

impl AppState {
    /// Wire the matching core over the given stores
    pub fn new(
        availability: Arc<dyn AvailabilityStore>,
        proposals: Arc<dyn ProposalStore>,
        events: Arc<dyn EventStore>,
        graph: Arc<DistrictGraph>,
        bus: EventBus,
        matching: MatchingSettings,
    ) -> Self {
        let registry = Arc::new(AvailabilityRegistry::new(availability, bus.clone()));
        let engine = Arc::new(ProposalEngine::new(proposals, events.clone(), bus));
        let discovery = GameDiscovery::new(events.clone(), MatchScorer::new(graph.clone()));
        let trigger = Arc::new(MatchingTrigger::new(
            registry.clone(),
            discovery.clone(),
            engine.clone(),
            events,
            TriggerSettings {
                min_score: matching.min_proposal_score,
                max_proposals: matching.max_proposals_per_run,
            },
        ));

        Self {
            registry,
            engine,
            discovery,
            trigger,
            graph,
            matching,
            postgres: None,
        }
    }

    pub fn with_postgres(mut self, postgres: Arc<PostgresClient>) -> Self {
        self.postgres = Some(postgres);
        self
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(availability::configure)
            .configure(games::configure)
            .configure(proposals::configure)
            .configure(matching::configure),
    );
}

impl MatchError {
    fn error_code(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_failed",
            MatchError::NotFound(_) => "not_found",
            MatchError::InvalidTransition { .. } => "invalid_transition",
            MatchError::Forbidden(_) => "forbidden",
            MatchError::Store(StoreError::Unavailable(_)) => "store_unavailable",
            MatchError::Store(_) => "store_error",
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::InvalidTransition { .. } => StatusCode::CONFLICT,
            MatchError::Forbidden(_) => StatusCode::FORBIDDEN,
            MatchError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Validate a request body, mapping failures to a 400
pub(crate) fn validate<T: validator::Validate>(req: &T) -> Result<(), MatchError> {
    req.validate()
        .map_err(|errors| MatchError::Validation(errors.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(MatchError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(MatchError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MatchError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            MatchError::InvalidTransition {
                id: Uuid::nil(),
                from: crate::models::ProposalStatus::Accepted,
                to: crate::models::ProposalStatus::Declined,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MatchError::Store(StoreError::Unavailable("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
