use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Broad geographic grouping of districts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Central,
    /// North of the river
    RightBank,
    /// South of the river
    LeftBank,
    OuterRing,
}

/// Named district with its zone and authored neighbours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
    #[serde(rename = "altName", default)]
    pub alt_name: Option<String>,
    pub zone: Zone,
    #[serde(default)]
    pub adjacent: Vec<String>,
}

/// A player's single active "looking to play" window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub sport: String,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(rename = "skillLevel", default)]
    pub skill_level: Option<u8>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Availability {
    /// A window is active until its `until` instant has passed
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.until >= now
    }
}

/// Canonical form of a sport name: trimmed and lowercased (Unicode-aware)
pub fn normalize_sport(sport: &str) -> String {
    sport.trim().to_lowercase()
}

/// Read-only projection of an event from the external event store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(rename = "skillMin", default)]
    pub skill_min: Option<u8>,
    #[serde(rename = "skillMax", default)]
    pub skill_max: Option<u8>,
    #[serde(rename = "lookingForPlayers", default)]
    pub is_open: bool,
}

impl CandidateEvent {
    /// Midpoint of the event; an event without an end collapses to its start
    pub fn midpoint(&self) -> DateTime<Utc> {
        match self.end_time {
            Some(end) if end > self.start_time => {
                self.start_time + Duration::milliseconds((end - self.start_time).num_milliseconds() / 2)
            }
            _ => self.start_time,
        }
    }
}

/// Qualitative bucket for a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLabel {
    Perfect,
    Great,
    Good,
    Fair,
}

impl MatchLabel {
    pub fn from_total(total: u8) -> Self {
        if total >= 85 {
            MatchLabel::Perfect
        } else if total >= 70 {
            MatchLabel::Great
        } else if total >= 50 {
            MatchLabel::Good
        } else {
            MatchLabel::Fair
        }
    }
}

/// Transient compatibility score between one availability and one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub total: u8,
    pub sport: u8,
    pub location: u8,
    pub time: u8,
    pub skill: u8,
    pub label: MatchLabel,
}

impl MatchScore {
    /// A game of another sport is never labelled above `fair`
    pub fn new(sport: u8, location: u8, time: u8, skill: u8) -> Self {
        let total = sport + location + time + skill;
        let label = if sport == 0 {
            MatchLabel::Fair
        } else {
            MatchLabel::from_total(total)
        };

        Self {
            total,
            sport,
            location,
            time,
            skill,
            label,
        }
    }

    pub fn sport_matches(&self) -> bool {
        self.sport > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Declined,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "accepted" => Ok(ProposalStatus::Accepted),
            "declined" => Ok(ProposalStatus::Declined),
            other => Err(format!("unknown proposal status: {}", other)),
        }
    }
}

/// Candidate pairing between a player and an open event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProposal {
    pub id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub status: ProposalStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "resolvedAt", default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl MatchProposal {
    pub fn pending(player_id: &str, event_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.to_string(),
            player_id: player_id.to_string(),
            status: ProposalStatus::Pending,
            created_at: now,
            resolved_at: None,
        }
    }
}

/// Filters applied to the open-event listing before ranking
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameFilters {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

impl GameFilters {
    pub fn matches(&self, event: &CandidateEvent) -> bool {
        if let Some(sport) = &self.sport {
            if event.sport.as_deref() != Some(sport.as_str()) {
                return false;
            }
        }

        if let Some(district) = &self.district {
            if event.district.as_deref() != Some(district.as_str()) {
                return false;
            }
        }

        event.is_open
    }
}

/// Discovery result: an event with its score when the requester is looking to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedGame {
    pub event: CandidateEvent,
    #[serde(rename = "matchScore")]
    pub score: Option<MatchScore>,
}
