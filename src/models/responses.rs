use serde::{Deserialize, Serialize};
use crate::core::trigger::TriggerReport;
use crate::models::domain::{MatchProposal, RankedGame};

/// Response for the open games listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGamesResponse {
    pub games: Vec<RankedGame>,
    /// Whether the requester had an active availability and results are score-ranked
    pub ranked: bool,
    pub total_results: usize,
}

/// Response for a player's proposals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalsResponse {
    pub proposals: Vec<MatchProposal>,
    pub count: usize,
}

/// Response for a matching trigger invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub report: TriggerReport,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
