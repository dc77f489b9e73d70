use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to open (or replace) a player's availability window
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenAvailabilityRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "player_id", rename = "playerId")]
    pub player_id: String,
    #[validate(length(min = 1))]
    pub sport: String,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    #[serde(default)]
    pub district: Option<String>,
    #[validate(range(min = 1, max = 5))]
    #[serde(alias = "skill_level", rename = "skillLevel", default)]
    pub skill_level: Option<u8>,
}

/// Query parameters for the open games listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListGamesQuery {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(alias = "player_id", rename = "playerId", default)]
    pub player_id: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// "Express interest" request creating a proposal for a player and an event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProposeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "player_id", rename = "playerId")]
    pub player_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "event_id", rename = "eventId")]
    pub event_id: String,
}

/// Body of accept/decline calls, naming the acting player
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveProposalRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "player_id", rename = "playerId")]
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlayerQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "player_id", rename = "playerId")]
    pub player_id: String,
}
