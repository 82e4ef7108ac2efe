use tracing::warn;

use crate::{dao::storage::with_timeout, dto::health::HealthResponse, state::SharedState};

/// Report whether the backend runs with a reachable store, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_game_store().await {
        Ok(store) => {
            if let Err(err) = with_timeout(
                "health_check",
                state.config().store_timeout(),
                store.health_check(),
            )
            .await
            {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let connections = state.connections().len();
    let group_players = state.lobby().lock().await.game.roster().len();

    if state.is_degraded().await {
        HealthResponse::degraded(connections, group_players)
    } else {
        HealthResponse::ok(connections, group_players)
    }
}
