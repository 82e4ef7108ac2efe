use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{models::GuessEntity, storage::with_timeout},
    dto::guess::{GuessRecord, GuessRequest},
    error::ServiceError,
    state::SharedState,
};

/// Validate and store a post-game guess.
pub async fn submit_guess(
    state: &SharedState,
    request: GuessRequest,
) -> Result<GuessRecord, ServiceError> {
    request.validate()?;
    let store = state.require_game_store().await?;

    let entity = GuessEntity {
        id: Uuid::new_v4(),
        jugador: request.jugador,
        aciertos: request.aciertos,
        bloques: request.bloques.into_iter().map(Into::into).collect(),
        fecha: SystemTime::now(),
    };

    with_timeout(
        "save_guess",
        state.config().store_timeout(),
        store.save_guess(entity.clone()),
    )
    .await?;
    info!(player = %entity.jugador, hits = entity.aciertos, "guess stored");

    Ok(entity.into())
}

/// Stored guesses, newest first, optionally for a single player.
pub async fn list_guesses(
    state: &SharedState,
    player: Option<String>,
) -> Result<Vec<GuessRecord>, ServiceError> {
    let store = state.require_game_store().await?;
    let guesses = with_timeout(
        "list_guesses",
        state.config().store_timeout(),
        store.list_guesses(player),
    )
    .await?;
    Ok(guesses.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, dto::guess::GuessBlock,
        state::AppState,
    };

    fn request(aciertos: u32) -> GuessRequest {
        GuessRequest {
            jugador: "Coco".into(),
            bloques: vec![
                GuessBlock {
                    intento: 8,
                    peso_real: 8,
                    acertado: true,
                },
                GuessBlock {
                    intento: 10,
                    peso_real: 12,
                    acertado: false,
                },
            ],
            aciertos,
        }
    }

    #[tokio::test]
    async fn stores_valid_guess() {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;

        let record = submit_guess(&state, request(1)).await.unwrap();
        assert_eq!(record.aciertos, 1);
        assert_eq!(record.bloques.len(), 2);

        let listed = list_guesses(&state, Some("Coco".into())).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert!(list_guesses(&state, Some("Ana".into())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inconsistent_guess_is_not_persisted() {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;

        let err = submit_guess(&state, request(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(list_guesses(&state, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn degraded_mode_rejects_guesses() {
        let state = AppState::new(AppConfig::default());
        let err = submit_guess(&state, request(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
