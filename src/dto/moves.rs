use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dao::models::MoveEntity,
    dto::format_system_time,
    state::{blocks::BlockColor, game::Side},
};

/// Persisted block placement as exposed by `/jugadas`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MoveRecord {
    /// Group game the move belongs to.
    pub partida: Uuid,
    pub jugador: String,
    pub turno: u32,
    pub peso: u32,
    pub color: BlockColor,
    pub lado: Side,
    /// Team of the player when the move was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipo: Option<u32>,
    /// RFC 3339 timestamp of the move.
    pub fecha: String,
}

/// Query filter for the move log.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MoveQuery {
    /// Restrict the log to a single group game.
    pub partida: Option<Uuid>,
}

impl From<MoveEntity> for MoveRecord {
    fn from(value: MoveEntity) -> Self {
        Self {
            partida: value.game_id,
            jugador: value.jugador,
            turno: value.turno,
            peso: value.peso,
            color: value.color,
            lado: value.lado,
            equipo: value.equipo,
            fecha: format_system_time(value.created_at),
        }
    }
}
