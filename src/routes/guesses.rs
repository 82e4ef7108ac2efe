use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use axum_valid::{Valid, ValidRejection};

use crate::{
    dto::guess::{GuessQuery, GuessRecord, GuessRequest},
    error::AppError,
    services::guess_service,
    state::SharedState,
};

/// Routes storing and listing post-game guesses.
pub fn router() -> Router<SharedState> {
    Router::new().route("/adivinanzas", get(list_guesses).post(create_guess))
}

/// Validate and store a guess of the hidden block weights.
#[utoipa::path(
    post,
    path = "/adivinanzas",
    tag = "records",
    request_body = GuessRequest,
    responses(
        (status = 201, description = "Guess stored", body = GuessRecord),
        (status = 400, description = "Guess failed validation"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_guess(
    State(state): State<SharedState>,
    payload: Result<Valid<Json<GuessRequest>>, ValidRejection<JsonRejection>>,
) -> Result<(StatusCode, Json<GuessRecord>), AppError> {
    let Valid(Json(payload)) = payload?;
    let record = guess_service::submit_guess(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List stored guesses, newest first.
#[utoipa::path(
    get,
    path = "/adivinanzas",
    tag = "records",
    params(GuessQuery),
    responses(
        (status = 200, description = "Stored guesses", body = [GuessRecord]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_guesses(
    State(state): State<SharedState>,
    Query(query): Query<GuessQuery>,
) -> Result<Json<Vec<GuessRecord>>, AppError> {
    Ok(Json(guess_service::list_guesses(&state, query.jugador).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, routes, state::AppState,
    };

    use super::*;

    fn post_guess(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/adivinanzas")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_guess() -> Value {
        json!({
            "jugador": "Coco",
            "aciertos": 1,
            "bloques": [
                {"intento": 5, "pesoReal": 5, "acertado": true},
                {"intento": 9, "pesoReal": 14, "acertado": false}
            ]
        })
    }

    #[tokio::test]
    async fn stores_and_lists_guesses() {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        let app = routes::router(state);

        let response = app.clone().oneshot(post_guess(valid_guess())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["jugador"], "Coco");
        assert_eq!(created["bloques"][0]["pesoReal"], 5);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/adivinanzas?jugador=Coco")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_inconsistent_hit_count() {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        let app = routes::router(state);

        let mut guess = valid_guess();
        guess["aciertos"] = json!(2);
        let response = app.clone().oneshot(post_guess(guess)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().is_some_and(|detail| !detail.is_empty()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/adivinanzas")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].is_string());
    }

    #[tokio::test]
    async fn degraded_mode_returns_service_unavailable() {
        let app = routes::router(AppState::new(AppConfig::default()));
        let response = app.oneshot(post_guess(valid_guess())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
