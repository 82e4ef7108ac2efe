use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{MongoGuessDocument, MongoMoveDocument},
};
use crate::dao::{
    game_store::GameStore,
    models::{GuessEntity, MoveEntity},
    storage::StorageResult,
};

const MOVE_COLLECTION_NAME: &str = "jugadas";
const GUESS_COLLECTION_NAME: &str = "adivinanzas";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    // Swapped wholesale on reconnect; the handle owns its client.
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = self.config.open().await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = config.open().await?;
        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let moves = self.move_collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"game_id": 1, "turno": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("move_game_turn_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        moves
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MOVE_COLLECTION_NAME,
                index: "game_id,turno",
                source,
            })?;

        let guesses = self.guess_collection().await;
        let guess_index = mongodb::IndexModel::builder()
            .keys(doc! {"jugador": 1, "fecha": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("guess_player_idx".to_owned()))
                    .build(),
            )
            .build();

        guesses
            .create_index(guess_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GUESS_COLLECTION_NAME,
                index: "jugador,fecha",
                source,
            })?;

        Ok(())
    }

    async fn move_collection(&self) -> Collection<MongoMoveDocument> {
        self.inner
            .database
            .read()
            .await
            .collection::<MongoMoveDocument>(MOVE_COLLECTION_NAME)
    }

    async fn guess_collection(&self) -> Collection<MongoGuessDocument> {
        self.inner
            .database
            .read()
            .await
            .collection::<MongoGuessDocument>(GUESS_COLLECTION_NAME)
    }

    async fn append_move(&self, record: MoveEntity) -> MongoResult<()> {
        let (game_id, turno) = (record.game_id, record.turno);
        let document: MongoMoveDocument = record.into();
        self.move_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendMove {
                game_id,
                turno,
                source,
            })?;
        Ok(())
    }

    async fn list_moves(&self, game_id: Option<Uuid>) -> MongoResult<Vec<MoveEntity>> {
        let (filter, sort) = match game_id {
            Some(id) => (doc! {"game_id": id.to_string()}, doc! {"turno": 1}),
            None => (doc! {}, doc! {"created_at": 1, "turno": 1}),
        };

        let documents: Vec<MongoMoveDocument> = self
            .move_collection()
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::ListMoves { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMoves { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_guess(&self, guess: GuessEntity) -> MongoResult<()> {
        let id = guess.id;
        let document: MongoGuessDocument = guess.into();
        self.guess_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveGuess { id, source })?;
        Ok(())
    }

    async fn list_guesses(&self, player: Option<String>) -> MongoResult<Vec<GuessEntity>> {
        let filter = match player {
            Some(name) => doc! {"jugador": name},
            None => doc! {},
        };

        let documents: Vec<MongoGuessDocument> = self
            .guess_collection()
            .await
            .find(filter)
            .sort(doc! {"fecha": -1})
            .await
            .map_err(|source| MongoDaoError::ListGuesses { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGuesses { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }
}

impl GameStore for MongoGameStore {
    fn append_move(&self, record: MoveEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_move(record).await.map_err(Into::into) })
    }

    fn list_moves(&self, game_id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Vec<MoveEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_moves(game_id).await.map_err(Into::into) })
    }

    fn save_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_guess(guess).await.map_err(Into::into) })
    }

    fn list_guesses(&self, player: Option<String>) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_guesses(player).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
