use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod guesses;
pub mod health;
pub mod moves;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(websocket::router())
        .merge(guesses::router())
        .merge(moves::router());

    api_router.merge(docs::router()).with_state(state)
}
