use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB database `{database}` did not answer the initial ping")]
    InitialPing {
        database: String,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to append move {turno} of game `{game_id}`")]
    AppendMove {
        game_id: Uuid,
        turno: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to list moves")]
    ListMoves {
        #[source]
        source: MongoError,
    },
    #[error("failed to save guess `{id}`")]
    SaveGuess {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list guesses")]
    ListGuesses {
        #[source]
        source: MongoError,
    },
    #[error("stored document has an invalid identifier `{value}`")]
    InvalidId {
        value: String,
        #[source]
        source: uuid::Error,
    },
}
