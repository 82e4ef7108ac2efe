use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GuessBlockEntity, GuessEntity},
    dto::{
        format_system_time,
        validation::{validate_guess_consistency, validate_player_name},
    },
};

/// Post-game guess of the hidden block weights.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[validate(schema(function = "validate_guess_consistency"))]
pub struct GuessRequest {
    /// Player submitting the guess.
    #[validate(custom(function = "validate_player_name"))]
    pub jugador: String,
    /// Per-block guesses, in the order the blocks were dealt.
    #[validate(length(min = 1, max = 10), nested)]
    pub bloques: Vec<GuessBlock>,
    /// Number of correctly guessed blocks.
    pub aciertos: u32,
}

/// Guess for a single block.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuessBlock {
    /// Guessed weight.
    #[validate(range(min = 2, max = 20))]
    pub intento: u32,
    /// Actual weight revealed in the summary.
    #[validate(range(min = 2, max = 20))]
    pub peso_real: u32,
    /// Whether the guess matched.
    pub acertado: bool,
}

/// Stored guess returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GuessRecord {
    pub id: Uuid,
    pub jugador: String,
    pub aciertos: u32,
    pub bloques: Vec<GuessBlock>,
    /// RFC 3339 submission timestamp.
    pub fecha: String,
}

/// Query filter for listing stored guesses.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GuessQuery {
    /// Only return guesses made by this player.
    pub jugador: Option<String>,
}

impl From<GuessBlock> for GuessBlockEntity {
    fn from(value: GuessBlock) -> Self {
        Self {
            intento: value.intento,
            peso_real: value.peso_real,
            acertado: value.acertado,
        }
    }
}

impl From<GuessBlockEntity> for GuessBlock {
    fn from(value: GuessBlockEntity) -> Self {
        Self {
            intento: value.intento,
            peso_real: value.peso_real,
            acertado: value.acertado,
        }
    }
}

impl From<GuessEntity> for GuessRecord {
    fn from(value: GuessEntity) -> Self {
        Self {
            id: value.id,
            jugador: value.jugador,
            aciertos: value.aciertos,
            bloques: value.bloques.into_iter().map(Into::into).collect(),
            fecha: format_system_time(value.fecha),
        }
    }
}
