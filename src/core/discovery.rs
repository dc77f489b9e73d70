use crate::core::error::MatchError;
use crate::core::scoring::MatchScorer;
use crate::models::{Availability, CandidateEvent, GameFilters, RankedGame};
use crate::services::store::EventStore;
use std::cmp::Ordering;
use std::sync::Arc;

/// Read-side listing of open games
///
/// # Pipeline Stages
/// 1. Sport/district filter against the event store
/// 2. Scoring against the requester's availability, when there is one
/// 3. Ordering: score descending then start ascending, or start ascending
/// 4. Limit
#[derive(Clone)]
pub struct GameDiscovery {
    events: Arc<dyn EventStore>,
    scorer: MatchScorer,
}

impl GameDiscovery {
    pub fn new(events: Arc<dyn EventStore>, scorer: MatchScorer) -> Self {
        Self { events, scorer }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// List open games matching `filters`, ranked for `requester` if present
    pub async fn list_open_games(
        &self,
        filters: &GameFilters,
        requester: Option<&Availability>,
        limit: Option<usize>,
    ) -> Result<Vec<RankedGame>, MatchError> {
        let candidates: Vec<CandidateEvent> = self
            .events
            .list_open(filters)
            .await?
            .into_iter()
            // The store may be coarser than the filter
            .filter(|event| filters.matches(event))
            .collect();

        tracing::debug!(
            "Discovery found {} open games for filters {:?}",
            candidates.len(),
            filters
        );

        let mut games = rank_games(&self.scorer, candidates, requester);

        if let Some(limit) = limit {
            games.truncate(limit);
        }

        Ok(games)
    }
}

/// Score and order events; pure, so it is shared with the matching trigger
pub fn rank_games(
    scorer: &MatchScorer,
    events: Vec<CandidateEvent>,
    requester: Option<&Availability>,
) -> Vec<RankedGame> {
    let mut games: Vec<RankedGame> = events
        .into_iter()
        .map(|event| {
            let score = requester.map(|availability| scorer.score(availability, &event));
            RankedGame { event, score }
        })
        .collect();

    games.sort_by(|a, b| compare_games(a, b));
    games
}

fn compare_games(a: &RankedGame, b: &RankedGame) -> Ordering {
    let by_score = match (&a.score, &b.score) {
        (Some(sa), Some(sb)) => sb.total.cmp(&sa.total),
        _ => Ordering::Equal,
    };

    by_score
        .then_with(|| a.event.start_time.cmp(&b.event.start_time))
        .then_with(|| a.event.event_id.cmp(&b.event.event_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryEventStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn create_event(id: &str, sport: &str, district: &str, start_hours: i64) -> CandidateEvent {
        CandidateEvent {
            event_id: id.to_string(),
            title: None,
            sport: Some(sport.to_string()),
            start_time: base() + Duration::hours(start_hours),
            end_time: Some(base() + Duration::hours(start_hours + 2)),
            district: Some(district.to_string()),
            skill_min: Some(2),
            skill_max: Some(4),
            is_open: true,
        }
    }

    fn create_availability() -> Availability {
        Availability {
            player_id: "p1".to_string(),
            sport: "football".to_string(),
            from: base(),
            until: base() + Duration::days(7),
            district: Some("75011".to_string()),
            skill_level: Some(3),
            created_at: base(),
        }
    }

    fn discovery(events: Vec<CandidateEvent>) -> GameDiscovery {
        GameDiscovery::new(Arc::new(MemoryEventStore::with_events(events)), MatchScorer::default())
    }

    #[tokio::test]
    async fn test_unranked_listing_sorts_by_start() {
        let discovery = discovery(vec![
            create_event("late", "football", "75011", 50),
            create_event("early", "football", "75011", 5),
            create_event("mid", "football", "75020", 20),
        ]);

        let games = discovery
            .list_open_games(&GameFilters::default(), None, None)
            .await
            .unwrap();

        let ids: Vec<&str> = games.iter().map(|g| g.event.event_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
        assert!(games.iter().all(|g| g.score.is_none()));
    }

    #[tokio::test]
    async fn test_ranked_listing_is_non_increasing() {
        let discovery = discovery(vec![
            create_event("edge", "football", "75011", 1),
            create_event("centre", "football", "75011", 83),
            create_event("far", "football", "75015", 83),
            create_event("other-sport", "basketball", "75011", 83),
        ]);
        let availability = create_availability();

        let games = discovery
            .list_open_games(&GameFilters::default(), Some(&availability), None)
            .await
            .unwrap();

        assert_eq!(games[0].event.event_id, "centre");
        assert_eq!(games.last().unwrap().event.event_id, "other-sport");
        for pair in games.windows(2) {
            assert!(pair[0].score.unwrap().total >= pair[1].score.unwrap().total);
        }
    }

    #[tokio::test]
    async fn test_ties_break_on_earliest_start() {
        // Two events equally far from the window centre on either side
        let discovery = discovery(vec![
            create_event("after", "football", "75011", 107),
            create_event("before", "football", "75011", 59),
        ]);
        let availability = create_availability();

        let games = discovery
            .list_open_games(&GameFilters::default(), Some(&availability), None)
            .await
            .unwrap();

        assert_eq!(games[0].score.unwrap().total, games[1].score.unwrap().total);
        assert_eq!(games[0].event.event_id, "before");
    }

    #[tokio::test]
    async fn test_filters_and_limit() {
        let mut closed = create_event("closed", "football", "75011", 3);
        closed.is_open = false;
        let discovery = discovery(vec![
            create_event("a", "football", "75011", 1),
            create_event("b", "football", "75011", 2),
            create_event("c", "football", "75020", 3),
            create_event("d", "tennis", "75011", 4),
            closed,
        ]);

        let filters = GameFilters {
            sport: Some("football".to_string()),
            district: Some("75011".to_string()),
        };
        let games = discovery.list_open_games(&filters, None, None).await.unwrap();
        let ids: Vec<&str> = games.iter().map(|g| g.event.event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let games = discovery.list_open_games(&filters, None, Some(1)).await.unwrap();
        assert_eq!(games.len(), 1);
    }
}
