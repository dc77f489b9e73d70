use crate::core::MatchError;
use crate::models::TriggerResponse;
use crate::routes::AppState;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matching/events/{event_id}", web::post().to(match_event))
        .route("/matching/players/{player_id}", web::post().to(match_player));
}

/// Run matching for an event that started looking for players
///
/// POST /api/v1/matching/events/{eventId}
async fn match_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let report = state.trigger.on_event_opened(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TriggerResponse { report }))
}

/// Run matching for a player's current availability
///
/// POST /api/v1/matching/players/{playerId}
async fn match_player(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let report = state.trigger.on_availability_opened(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TriggerResponse { report }))
}
