// Integration tests for Playmatch

use actix_web::{http::StatusCode, test, web, App};
use chrono::{DateTime, Duration, Utc};
use playmatch::config::MatchingSettings;
use playmatch::core::DistrictGraph;
use playmatch::models::{
    CandidateEvent, ListGamesResponse, MatchProposal, ProposalStatus, ProposalsResponse, TriggerResponse,
};
use playmatch::routes::{self, AppState};
use playmatch::services::{
    DomainEvent, EventBus, MemoryAvailabilityStore, MemoryEventStore, MemoryProposalStore,
};
use serde_json::json;
use std::sync::Arc;

fn create_event(id: &str, sport: &str, district: &str, start: DateTime<Utc>) -> CandidateEvent {
    CandidateEvent {
        event_id: id.to_string(),
        title: Some(format!("Game {}", id)),
        sport: Some(sport.to_string()),
        start_time: start,
        end_time: Some(start + Duration::hours(2)),
        district: Some(district.to_string()),
        skill_min: Some(2),
        skill_max: Some(4),
        is_open: true,
    }
}

struct Harness {
    state: AppState,
    events: Arc<MemoryEventStore>,
    bus: EventBus,
}

fn harness(events: Vec<CandidateEvent>) -> Harness {
    let events = Arc::new(MemoryEventStore::with_events(events));
    let bus = EventBus::new();
    let settings = MatchingSettings {
        attendance_retries: 2,
        ..MatchingSettings::default()
    };

    let state = AppState::new(
        Arc::new(MemoryAvailabilityStore::new()),
        Arc::new(MemoryProposalStore::new()),
        events.clone(),
        Arc::new(DistrictGraph::paris()),
        bus.clone(),
        settings,
    );

    Harness { state, events, bus }
}

fn window_body(player_id: &str, district: &str) -> serde_json::Value {
    let now = Utc::now();
    json!({
        "playerId": player_id,
        "sport": "football",
        "from": now,
        "until": now + Duration::days(2),
        "district": district,
        "skillLevel": 3
    })
}

#[tokio::test]
async fn test_integration_open_trigger_accept() {
    let now = Utc::now();
    let h = harness(vec![
        create_event("near", "football", "75011", now + Duration::hours(23)),
        create_event("far", "football", "75015", now + Duration::hours(40)),
    ]);
    let mut notifications = h.bus.subscribe();

    let window = playmatch::core::OpenWindow {
        sport: "football".to_string(),
        from: now,
        until: now + Duration::days(2),
        district: Some("75011".to_string()),
        skill_level: Some(3),
    };
    h.state.registry.open_at("p1", window, now).await.unwrap();

    let report = h.state.trigger.on_availability_opened_at("p1", now).await.unwrap();
    assert_eq!(report.candidates, 2);
    assert_eq!(report.proposed, 2);

    let proposals = h.state.engine.list_for_player("p1").await.unwrap();
    let near = proposals.iter().find(|p| p.event_id == "near").unwrap();

    let accepted = h.state.engine.accept(near.id, "p1").await.unwrap();
    assert_eq!(accepted.status, ProposalStatus::Accepted);
    assert_eq!(h.events.attendance().await, vec![("p1".to_string(), "near".to_string())]);

    // Terminal: cannot be declined afterwards
    assert!(h.state.engine.decline(near.id, "p1").await.is_err());

    let mut names = Vec::new();
    while let Ok(event) = notifications.try_recv() {
        names.push(event.name());
    }
    assert_eq!(
        names,
        vec![
            "availability_opened",
            "proposal_created",
            "proposal_created",
            "proposal_accepted"
        ]
    );
}

#[tokio::test]
async fn test_integration_decline_then_repropose_creates_new_proposal() {
    let now = Utc::now();
    let h = harness(vec![create_event("e1", "football", "75011", now + Duration::days(1))]);

    let first = h.state.engine.propose("p1", "e1").await.unwrap();
    let declined = h.state.engine.decline(first.id, "p1").await.unwrap();
    assert_eq!(declined.status, ProposalStatus::Declined);

    let second = h.state.engine.propose("p1", "e1").await.unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(second.status, ProposalStatus::Pending);

    let history = h.state.engine.list_for_player("p1").await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_integration_concurrent_proposals_are_deduplicated() {
    let now = Utc::now();
    let h = harness(vec![create_event("e1", "football", "75011", now + Duration::days(1))]);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.state.engine.clone();
            tokio::spawn(async move { engine.propose("p1", "e1").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();

    assert_eq!(ids.len(), 1);
    assert_eq!(h.state.engine.list_for_player("p1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_integration_ranking_is_monotonic() {
    let now = Utc::now();
    let events = ["75011", "75020", "75016", "75015", "92"]
        .iter()
        .enumerate()
        .map(|(i, district)| {
            create_event(&format!("e{}", i), "football", district, now + Duration::hours(6 + 7 * i as i64))
        })
        .collect();
    let h = harness(events);

    let availability = h
        .state
        .registry
        .open(
            "p1",
            playmatch::core::OpenWindow {
                sport: "football".to_string(),
                from: now,
                until: now + Duration::days(2),
                district: Some("75011".to_string()),
                skill_level: Some(3),
            },
        )
        .await
        .unwrap();

    let games = h
        .state
        .discovery
        .list_open_games(&Default::default(), Some(&availability), None)
        .await
        .unwrap();

    assert_eq!(games.len(), 5);
    let totals: Vec<u8> = games.iter().map(|g| g.score.unwrap().total).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]), "{:?}", totals);
}

#[actix_web::test]
async fn test_http_availability_lifecycle() {
    let h = harness(vec![]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/availability")
        .set_json(window_body("p1", "75011"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/api/v1/availability/p1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete().uri("/api/v1/availability/p1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/v1/availability/p1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_http_rejects_invalid_window() {
    let h = harness(vec![]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let mut body = window_body("p1", "75011");
    body["skillLevel"] = json!(9);

    let req = test::TestRequest::post()
        .uri("/api/v1/availability")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_http_proposal_flow() {
    let now = Utc::now();
    let h = harness(vec![create_event("e1", "football", "75011", now + Duration::days(1))]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/proposals")
        .set_json(json!({ "playerId": "p1", "eventId": "e1" }))
        .to_request();
    let proposal: MatchProposal = test::call_and_read_body_json(&app, req).await;
    assert_eq!(proposal.status, ProposalStatus::Pending);

    // Someone else cannot accept it
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/proposals/{}/accept", proposal.id))
        .set_json(json!({ "playerId": "intruder" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // One transient failure is absorbed by the retry
    h.events.fail_next_attendance_writes(1).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/proposals/{}/accept", proposal.id))
        .set_json(json!({ "playerId": "p1" }))
        .to_request();
    let accepted: MatchProposal = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted.status, ProposalStatus::Accepted);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/proposals/{}/decline", proposal.id))
        .set_json(json!({ "playerId": "p1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get().uri("/api/v1/proposals?playerId=p1").to_request();
    let listed: ProposalsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.count, 1);
}

#[actix_web::test]
async fn test_http_accept_stays_pending_when_store_keeps_failing() {
    let now = Utc::now();
    let h = harness(vec![create_event("e1", "football", "75011", now + Duration::days(1))]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let proposal = h.state.engine.propose("p1", "e1").await.unwrap();
    h.events.fail_next_attendance_writes(10).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/proposals/{}/accept", proposal.id))
        .set_json(json!({ "playerId": "p1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let current = h.state.engine.get(proposal.id).await.unwrap();
    assert_eq!(current.status, ProposalStatus::Pending);
    assert!(h.events.attendance().await.is_empty());
}

#[actix_web::test]
async fn test_http_games_and_matching() {
    let now = Utc::now();
    let h = harness(vec![
        create_event("e1", "football", "75011", now + Duration::days(1)),
        create_event("e2", "tennis", "75015", now + Duration::days(1)),
    ]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/games?sport=football").to_request();
    let listing: ListGamesResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.total_results, 1);
    assert!(!listing.ranked);
    assert!(listing.games[0].score.is_none());

    h.state
        .registry
        .open(
            "p1",
            playmatch::core::OpenWindow {
                sport: "football".to_string(),
                from: now,
                until: now + Duration::days(2),
                district: Some("75011".to_string()),
                skill_level: Some(3),
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::get().uri("/api/v1/games?playerId=p1&limit=1").to_request();
    let listing: ListGamesResponse = test::call_and_read_body_json(&app, req).await;
    assert!(listing.ranked);
    assert_eq!(listing.total_results, 1);
    assert_eq!(listing.games[0].event.event_id, "e1");

    let req = test::TestRequest::post().uri("/api/v1/matching/events/e1").to_request();
    let triggered: TriggerResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(triggered.report.candidates, 1);
    assert_eq!(triggered.report.proposed + triggered.report.already_pending, 1);

    let req = test::TestRequest::post().uri("/api/v1/matching/events/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_http_districts_and_health() {
    let h = harness(vec![]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(h.state.clone()))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/districts").to_request();
    let districts: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(districts.len(), 23);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[core::prelude::v1::test]
fn test_domain_event_serialization() {
    let proposal = MatchProposal::pending("p1", "e1", Utc::now());
    let event = DomainEvent::ProposalCreated { proposal };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "proposal_created");
}
