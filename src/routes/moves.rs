use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::moves::{MoveQuery, MoveRecord},
    error::AppError,
    services::history_service,
    state::SharedState,
};

/// Routes exposing the persisted move log.
pub fn router() -> Router<SharedState> {
    Router::new().route("/jugadas", get(list_moves))
}

/// List persisted group moves, optionally for a single game sorted by turn.
#[utoipa::path(
    get,
    path = "/jugadas",
    tag = "records",
    params(MoveQuery),
    responses(
        (status = 200, description = "Persisted moves", body = [MoveRecord]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_moves(
    State(state): State<SharedState>,
    Query(query): Query<MoveQuery>,
) -> Result<Json<Vec<MoveRecord>>, AppError> {
    Ok(Json(history_service::list_moves(&state, query.partida).await?))
}
