use crate::models::{CandidateEvent, GameFilters};
use crate::services::store::{EventStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Namespace for deterministic attendance document ids
const ATTENDANCE_NAMESPACE: Uuid = Uuid::from_u128(0x6d61_7463_6861_7474_656e_6461_6e63_6531);

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Appwrite unavailable: {0}")]
    Unavailable(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AppwriteError> for StoreError {
    fn from(value: AppwriteError) -> Self {
        match value {
            AppwriteError::RequestError(e) if e.is_timeout() || e.is_connect() => {
                StoreError::Unavailable(e.to_string())
            }
            AppwriteError::Unavailable(msg) => StoreError::Unavailable(msg),
            AppwriteError::InvalidResponse(msg) => StoreError::Decode(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub events: String,
    pub attendance: String,
}

/// Event document as stored in Appwrite
#[derive(Debug, Deserialize)]
struct EventDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sport: Option<String>,
    #[serde(rename = "startTime")]
    start_time: DateTime<Utc>,
    #[serde(rename = "endTime", default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    district: Option<String>,
    #[serde(rename = "skillMin", default)]
    skill_min: Option<u8>,
    #[serde(rename = "skillMax", default)]
    skill_max: Option<u8>,
    #[serde(rename = "lookingForPlayers", default)]
    looking_for_players: bool,
}

impl From<EventDocument> for CandidateEvent {
    fn from(doc: EventDocument) -> Self {
        CandidateEvent {
            event_id: doc.id,
            title: doc.title,
            sport: doc.sport,
            start_time: doc.start_time,
            end_time: doc.end_time,
            district: doc.district,
            skill_min: doc.skill_min,
            skill_max: doc.skill_max,
            is_open: doc.looking_for_players,
        }
    }
}

/// Appwrite API client for the external event store
///
/// Handles:
/// - Querying open events by sport/district
/// - Reading a single event
/// - Writing attendance when a proposal is accepted
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    /// Query events flagged as looking for players
    pub async fn query_open_events(&self, filters: &GameFilters) -> Result<Vec<CandidateEvent>, AppwriteError> {
        let mut queries = vec![
            "equal(\"lookingForPlayers\", [true])".to_string(),
            "orderAsc(\"startTime\")".to_string(),
        ];

        if let Some(sport) = &filters.sport {
            queries.push(format!("equal(\"sport\", [{}])", json!(sport)));
        }
        if let Some(district) = &filters.district {
            queries.push(format!("equal(\"district\", [{}])", json!(district)));
        }

        let query_string = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.documents_url(&self.collections.events), query_string);

        tracing::debug!("Querying open events: {:?}", filters);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let json: Value = check_status(response, "query events").await?.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let events: Vec<CandidateEvent> = documents
            .iter()
            .filter_map(|doc| match serde_json::from_value::<EventDocument>(doc.clone()) {
                Ok(parsed) => Some(parsed.into()),
                Err(e) => {
                    tracing::warn!("Skipping malformed event document: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Queried {} open events", events.len());

        Ok(events)
    }

    /// Get a single event by id
    pub async fn get_event(&self, event_id: &str) -> Result<Option<CandidateEvent>, AppwriteError> {
        let url = format!(
            "{}/{}",
            self.documents_url(&self.collections.events),
            urlencoding::encode(event_id)
        );

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: EventDocument = check_status(response, "fetch event")
            .await?
            .json()
            .await
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse event: {}", e)))?;

        Ok(Some(doc.into()))
    }

    /// Create the attendance document for (player, event)
    ///
    /// The document id is derived from the pair, so a repeated write hits a
    /// conflict and is treated as already done.
    pub async fn create_attendance(&self, player_id: &str, event_id: &str) -> Result<(), AppwriteError> {
        let url = self.documents_url(&self.collections.attendance);

        let payload = json!({
            "documentId": attendance_document_id(player_id, event_id),
            "data": {
                "playerId": player_id,
                "eventId": event_id,
                "status": "going",
                "source": "match_proposal",
            }
        });

        let response = self
            .client
            .post(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("Attendance already recorded: {} -> {}", player_id, event_id);
            return Ok(());
        }

        check_status(response, "record attendance").await?;

        tracing::debug!("Recorded attendance: {} -> {}", player_id, event_id);

        Ok(())
    }
}

/// Deterministic Appwrite document id for an attendance row
pub fn attendance_document_id(player_id: &str, event_id: &str) -> String {
    let name = format!("{}:{}", player_id, event_id);
    Uuid::new_v5(&ATTENDANCE_NAMESPACE, name.as_bytes())
        .simple()
        .to_string()
}

async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response, AppwriteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Failed to {}: {} - {}", action, status, body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(AppwriteError::Unauthorized)
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(AppwriteError::Unavailable(format!("Failed to {}: {}", action, status)))
    } else {
        Err(AppwriteError::ApiError(format!("Failed to {}: {}", action, status)))
    }
}

#[async_trait]
impl EventStore for AppwriteClient {
    async fn list_open(&self, filters: &GameFilters) -> Result<Vec<CandidateEvent>, StoreError> {
        Ok(self.query_open_events(filters).await?)
    }

    async fn get(&self, event_id: &str) -> Result<Option<CandidateEvent>, StoreError> {
        Ok(self.get_event(event_id).await?)
    }

    async fn record_attendance(&self, player_id: &str, event_id: &str) -> Result<(), StoreError> {
        Ok(self.create_attendance(player_id, event_id).await?)
    }
}
