pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GuessEntity, MoveEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for the move log and guesses.
pub trait GameStore: Send + Sync {
    /// Append an accepted move to the log.
    fn append_move(&self, record: MoveEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Moves sorted by turn, for one game or for every game.
    fn list_moves(&self, game_id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Vec<MoveEntity>>>;
    /// Persist a post-game guess.
    fn save_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Stored guesses, newest first, optionally filtered by player.
    fn list_guesses(&self, player: Option<String>) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
