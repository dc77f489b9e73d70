// Criterion benchmarks for Playmatch

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use playmatch::core::{calculate_match_score, rank_games, DistrictGraph, MatchScorer};
use playmatch::models::{Availability, CandidateEvent};
use std::sync::Arc;

const DISTRICTS: [&str; 8] = ["75001", "75011", "75015", "75016", "75020", "92", "93", "94"];

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
}

fn create_candidate(id: usize) -> CandidateEvent {
    let start = t0() + Duration::hours((id % 168) as i64);
    CandidateEvent {
        event_id: format!("evt-{}", id),
        title: None,
        sport: Some(if id % 4 == 0 { "tennis" } else { "football" }.to_string()),
        start_time: start,
        end_time: Some(start + Duration::hours(2)),
        district: Some(DISTRICTS[id % DISTRICTS.len()].to_string()),
        skill_min: Some(1 + (id % 3) as u8),
        skill_max: Some(3 + (id % 3) as u8),
        is_open: true,
    }
}

fn create_availability() -> Availability {
    Availability {
        player_id: "current_player".to_string(),
        sport: "football".to_string(),
        from: t0(),
        until: t0() + Duration::days(7),
        district: Some("75011".to_string()),
        skill_level: Some(3),
        created_at: t0(),
    }
}

fn bench_match_score(c: &mut Criterion) {
    let graph = DistrictGraph::paris();
    let availability = create_availability();
    let event = create_candidate(7);

    c.bench_function("calculate_match_score", |b| {
        b.iter(|| calculate_match_score(black_box(&graph), black_box(&availability), black_box(&event)));
    });
}

fn bench_district_lookup(c: &mut Criterion) {
    let graph = DistrictGraph::paris();

    c.bench_function("district_adjacency", |b| {
        b.iter(|| {
            DISTRICTS
                .iter()
                .filter(|d| graph.adjacent(black_box("75011"), black_box(d)))
                .count()
        });
    });
}

fn bench_ranking(c: &mut Criterion) {
    let scorer = MatchScorer::new(Arc::new(DistrictGraph::paris()));
    let availability = create_availability();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<CandidateEvent> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("rank_games", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    rank_games(
                        black_box(&scorer),
                        black_box(candidates.clone()),
                        black_box(Some(&availability)),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_match_score, bench_district_lookup, bench_ranking);

criterion_main!(benches);
