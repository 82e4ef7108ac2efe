use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{GuessBlockEntity, GuessEntity, MoveEntity},
    state::{blocks::BlockColor, game::Side},
};

/// Identifiers are stored as hyphenated strings so they can be filtered on directly.
fn parse_id(value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|source| MongoDaoError::InvalidId {
        value: value.to_owned(),
        source,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMoveDocument {
    pub game_id: String,
    pub jugador: String,
    pub turno: u32,
    pub peso: u32,
    pub color: BlockColor,
    pub lado: Side,
    #[serde(default)]
    pub equipo: Option<u32>,
    pub created_at: DateTime,
}

impl From<MoveEntity> for MongoMoveDocument {
    fn from(value: MoveEntity) -> Self {
        Self {
            game_id: value.game_id.to_string(),
            jugador: value.jugador,
            turno: value.turno,
            peso: value.peso,
            color: value.color,
            lado: value.lado,
            equipo: value.equipo,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoMoveDocument> for MoveEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMoveDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            game_id: parse_id(&value.game_id)?,
            jugador: value.jugador,
            turno: value.turno,
            peso: value.peso,
            color: value.color,
            lado: value.lado,
            equipo: value.equipo,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGuessDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub jugador: String,
    pub aciertos: u32,
    pub bloques: Vec<GuessBlockEntity>,
    pub fecha: DateTime,
}

impl From<GuessEntity> for MongoGuessDocument {
    fn from(value: GuessEntity) -> Self {
        Self {
            id: value.id.to_string(),
            jugador: value.jugador,
            aciertos: value.aciertos,
            bloques: value.bloques,
            fecha: DateTime::from_system_time(value.fecha),
        }
    }
}

impl TryFrom<MongoGuessDocument> for GuessEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGuessDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            jugador: value.jugador,
            aciertos: value.aciertos,
            bloques: value.bloques,
            fecha: value.fecha.to_system_time(),
        })
    }
}
