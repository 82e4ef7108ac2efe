use uuid::Uuid;

use crate::{
    dao::storage::with_timeout, dto::moves::MoveRecord, error::ServiceError, state::SharedState,
};

/// Persisted move log, for one game sorted by turn or for every game in insertion order.
pub async fn list_moves(
    state: &SharedState,
    game_id: Option<Uuid>,
) -> Result<Vec<MoveRecord>, ServiceError> {
    let store = state.require_game_store().await?;
    let moves = with_timeout(
        "list_moves",
        state.config().store_timeout(),
        store.list_moves(game_id),
    )
    .await?;
    Ok(moves.into_iter().map(Into::into).collect())
}
