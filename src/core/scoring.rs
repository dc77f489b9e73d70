use crate::core::districts::DistrictGraph;
use crate::models::{normalize_sport, Availability, CandidateEvent, MatchScore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const SPORT_MAX: u8 = 30;
pub const LOCATION_MAX: u8 = 25;
pub const TIME_MAX: u8 = 25;
pub const SKILL_MAX: u8 = 20;

const LOCATION_NEUTRAL: u8 = 15;
const LOCATION_ADJACENT: u8 = 18;
const LOCATION_SAME_ZONE: u8 = 12;
const LOCATION_FAR: u8 = 5;

const TIME_FLOOR: u8 = 15;

const SKILL_NEUTRAL: u8 = 15;
const SKILL_DEFAULT_MIN: u8 = 1;
const SKILL_DEFAULT_MAX: u8 = 5;

/// Scores one availability window against one candidate event
///
/// Scoring formula (additive, no cross terms):
/// score = (
///     sport     0 | 30     # exact, case-insensitive
///     location  5..=25     # same > adjacent > same zone > elsewhere
///     time      0 | 15..25 # start must fall inside the window
///     skill     0..=20     # inside the event's range, else by distance
/// )
#[derive(Debug, Clone)]
pub struct MatchScorer {
    graph: Arc<DistrictGraph>,
}

impl MatchScorer {
    pub fn new(graph: Arc<DistrictGraph>) -> Self {
        Self { graph }
    }

    pub fn score(&self, availability: &Availability, event: &CandidateEvent) -> MatchScore {
        calculate_match_score(&self.graph, availability, event)
    }
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(Arc::new(DistrictGraph::default()))
    }
}

/// Calculate the composite score (0-100) for an availability/event pair
pub fn calculate_match_score(
    graph: &DistrictGraph,
    availability: &Availability,
    event: &CandidateEvent,
) -> MatchScore {
    let sport = sport_score(&availability.sport, event.sport.as_deref());

    let location = location_score(
        graph,
        availability.district.as_deref(),
        event.district.as_deref(),
    );

    let time = time_score(availability.from, availability.until, event);

    let skill = skill_score(availability.skill_level, event.skill_min, event.skill_max);

    MatchScore::new(sport, location, time, skill)
}

/// Sport score: all or nothing
#[inline]
pub fn sport_score(wanted: &str, offered: Option<&str>) -> u8 {
    match offered {
        Some(offered) if !offered.trim().is_empty() && normalize_sport(offered) == normalize_sport(wanted) => {
            SPORT_MAX
        }
        _ => 0,
    }
}

/// Location score: strict priority cascade, first match wins
#[inline]
pub fn location_score(graph: &DistrictGraph, wanted: Option<&str>, offered: Option<&str>) -> u8 {
    let (wanted, offered) = match (wanted, offered) {
        (Some(w), Some(o)) => (w, o),
        _ => return LOCATION_NEUTRAL,
    };

    if wanted == offered {
        LOCATION_MAX
    } else if graph.adjacent(wanted, offered) {
        LOCATION_ADJACENT
    } else if graph.same_zone(wanted, offered) {
        LOCATION_SAME_ZONE
    } else {
        LOCATION_FAR
    }
}

/// Time score: hard gate on the event start, then centering of midpoints
#[inline]
pub fn time_score(from: DateTime<Utc>, until: DateTime<Utc>, event: &CandidateEvent) -> u8 {
    if event.start_time < from || event.start_time > until {
        return 0;
    }

    let half_width = (until - from).num_milliseconds() as f64 / 2.0;
    if half_width <= 0.0 {
        return TIME_MAX;
    }

    let window_mid = from + (until - from) / 2;
    let distance = (event.midpoint() - window_mid).num_milliseconds().abs() as f64;

    let raw = TIME_MAX as i64 - ((distance / half_width) * 10.0).round() as i64;
    raw.clamp(TIME_FLOOR as i64, TIME_MAX as i64) as u8
}

/// Skill score: full marks inside the range, stepping down by distance outside it
#[inline]
pub fn skill_score(level: Option<u8>, min: Option<u8>, max: Option<u8>) -> u8 {
    let level = match level {
        Some(level) if min.is_some() || max.is_some() => level,
        _ => return SKILL_NEUTRAL,
    };

    let min = min.unwrap_or(SKILL_DEFAULT_MIN);
    let max = max.unwrap_or(SKILL_DEFAULT_MAX);

    if level >= min && level <= max {
        return SKILL_MAX;
    }

    let distance = if level < min { min - level } else { level - max };
    match distance {
        1 => 10,
        2 => 5,
        _ => 0,
    }
}
