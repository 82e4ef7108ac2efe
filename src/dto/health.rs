use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while no store is reachable.
    pub status: String,
    /// Open player sockets.
    pub connections: usize,
    /// Players seated in the group game.
    pub group_players: usize,
}

impl HealthResponse {
    /// Healthy backend with the given load.
    pub fn ok(connections: usize, group_players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            connections,
            group_players,
        }
    }

    /// Backend running without storage.
    pub fn degraded(connections: usize, group_players: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            connections,
            group_players,
        }
    }
}
