use crate::core::MatchError;
use crate::models::{GameFilters, ListGamesQuery, ListGamesResponse};
use crate::routes::{validate, AppState};
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/games", web::get().to(list_games))
        .route("/districts", web::get().to(list_districts));
}

/// List open games
///
/// GET /api/v1/games?sport=football&district=75011&playerId=abc&limit=20
///
/// When `playerId` has an active availability the games are score-ranked,
/// otherwise they come back by start time without scores.
async fn list_games(
    state: web::Data<AppState>,
    query: web::Query<ListGamesQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let limit = query
        .limit
        .unwrap_or(state.matching.default_limit)
        .min(state.matching.max_limit) as usize;

    let requester = match query.player_id.as_deref() {
        Some(player_id) => state.registry.current(player_id).await?,
        None => None,
    };

    let filters = GameFilters {
        sport: query.sport.clone().filter(|s| !s.is_empty()),
        district: query.district.clone().filter(|d| !d.is_empty()),
    };

    let games = state
        .discovery
        .list_open_games(&filters, requester.as_ref(), Some(limit))
        .await?;

    tracing::info!(
        "Returning {} open games (ranked: {})",
        games.len(),
        requester.is_some()
    );

    Ok(HttpResponse::Ok().json(ListGamesResponse {
        total_results: games.len(),
        ranked: requester.is_some(),
        games,
    }))
}

/// GET /api/v1/districts
async fn list_districts(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.graph.districts())
}
