use crate::core::{MatchError, ProposalEngine};
use crate::models::{MatchProposal, PlayerQuery, ProposalsResponse, ProposeRequest, ResolveProposalRequest};
use crate::routes::{validate, AppState};
use actix_web::{web, HttpResponse};
use std::time::Duration;
use uuid::Uuid;

/// Base delay between attendance write attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/proposals", web::post().to(create_proposal))
        .route("/proposals", web::get().to(list_proposals))
        .route("/proposals/{id}/accept", web::post().to(accept_proposal))
        .route("/proposals/{id}/decline", web::post().to(decline_proposal));
}

/// Express interest in an event
///
/// POST /api/v1/proposals
///
/// Request body:
/// ```json
/// { "playerId": "string", "eventId": "string" }
/// ```
///
/// Returns the existing pending proposal if there is one.
async fn create_proposal(
    state: web::Data<AppState>,
    req: web::Json<ProposeRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let proposal = state.engine.propose(&req.player_id, &req.event_id).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

/// GET /api/v1/proposals?playerId={playerId}
async fn list_proposals(
    state: web::Data<AppState>,
    query: web::Query<PlayerQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let proposals = state.engine.list_for_player(&query.player_id).await?;
    Ok(HttpResponse::Ok().json(ProposalsResponse {
        count: proposals.len(),
        proposals,
    }))
}

/// Accept a proposal; binding
///
/// POST /api/v1/proposals/{id}/accept
///
/// The attendance write is retried a bounded number of times while the event
/// store is unavailable. The proposal stays pending until it succeeds.
async fn accept_proposal(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<ResolveProposalRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let proposal = accept_with_retry(
        &state.engine,
        path.into_inner(),
        &req.player_id,
        state.matching.attendance_retries,
    )
    .await?;

    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/v1/proposals/{id}/decline
async fn decline_proposal(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<ResolveProposalRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let proposal = state.engine.decline(path.into_inner(), &req.player_id).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

/// Accept, retrying up to `retries` more times on transient store failures
pub async fn accept_with_retry(
    engine: &ProposalEngine,
    proposal_id: Uuid,
    actor: &str,
    retries: u32,
) -> Result<MatchProposal, MatchError> {
    let mut attempt = 0;

    loop {
        match engine.accept(proposal_id, actor).await {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    "Accept of proposal {} failed (attempt {}/{}), retrying: {}",
                    proposal_id,
                    attempt,
                    retries + 1,
                    e
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            result => return result,
        }
    }
}
