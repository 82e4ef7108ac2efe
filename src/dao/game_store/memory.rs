use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GuessEntity, MoveEntity},
    storage::StorageResult,
};

/// Process-local store used when no database is configured.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    moves: Vec<MoveEntity>,
    guesses: Vec<GuessEntity>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn append_move(&self, record: MoveEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.moves.push(record);
            Ok(())
        })
    }

    fn list_moves(&self, game_id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Vec<MoveEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            let mut moves: Vec<MoveEntity> = guard
                .moves
                .iter()
                .filter(|record| game_id.is_none_or(|id| record.game_id == id))
                .cloned()
                .collect();
            match game_id {
                Some(_) => moves.sort_by_key(|record| record.turno),
                None => moves.sort_by_key(|record| (record.created_at, record.turno)),
            }
            Ok(moves)
        })
    }

    fn save_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.guesses.push(guess);
            Ok(())
        })
    }

    fn list_guesses(&self, player: Option<String>) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .guesses
                .iter()
                .rev()
                .filter(|guess| player.as_deref().is_none_or(|name| guess.jugador == name))
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
