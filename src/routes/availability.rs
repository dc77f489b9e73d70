use crate::core::{MatchError, OpenWindow};
use crate::models::OpenAvailabilityRequest;
use crate::routes::{validate, AppState};
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/availability", web::post().to(open_availability))
        .route("/availability/{player_id}", web::get().to(get_availability))
        .route("/availability/{player_id}", web::delete().to(cancel_availability));
}

/// Open or replace a player's availability window
///
/// POST /api/v1/availability
///
/// Request body:
/// ```json
/// {
///   "playerId": "string",
///   "sport": "football",
///   "from": "2026-06-01T18:00:00Z",
///   "until": "2026-06-08T18:00:00Z",
///   "district": "75011",
///   "skillLevel": 3
/// }
/// ```
///
/// Reactive matching for the player runs in the background.
async fn open_availability(
    state: web::Data<AppState>,
    req: web::Json<OpenAvailabilityRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let req = req.into_inner();
    let availability = state
        .registry
        .open(
            &req.player_id,
            OpenWindow {
                sport: req.sport,
                from: req.from,
                until: req.until,
                district: req.district,
                skill_level: req.skill_level,
            },
        )
        .await?;

    let trigger = state.trigger.clone();
    let player_id = availability.player_id.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = trigger.on_availability_opened(&player_id).await {
            tracing::warn!("Reactive matching for player {} failed: {}", player_id, e);
        }
    });

    Ok(HttpResponse::Created().json(availability))
}

/// GET /api/v1/availability/{playerId}
async fn get_availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let player_id = path.into_inner();

    match state.registry.current(&player_id).await? {
        Some(availability) => Ok(HttpResponse::Ok().json(availability)),
        None => Err(MatchError::NotFound(format!(
            "active availability for player {}",
            player_id
        ))),
    }
}

/// DELETE /api/v1/availability/{playerId}
async fn cancel_availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    state.registry.cancel(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
