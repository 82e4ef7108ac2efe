use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Balanza Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
        crate::routes::guesses::create_guess,
        crate::routes::guesses::list_guesses,
        crate::routes::moves::list_moves,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::guess::GuessRequest,
            crate::dto::guess::GuessBlock,
            crate::dto::guess::GuessRecord,
            crate::dto::moves::MoveRecord,
            crate::state::blocks::BlockColor,
            crate::state::game::Side,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "WebSocket game protocol for players"),
        (name = "records", description = "Stored guesses and move history"),
    )
)]
pub struct ApiDoc;
