use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{blocks::BlockColor, game::Side};

/// Accepted group-mode move as recorded in the append-only move log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveEntity {
    /// Group game the move belongs to.
    pub game_id: Uuid,
    /// Player who placed the block.
    pub jugador: String,
    /// 1-based position in the game's accepted move order.
    pub turno: u32,
    /// Client-reported block weight.
    pub peso: u32,
    /// Block color.
    pub color: BlockColor,
    /// Pan the block landed on.
    pub lado: Side,
    /// Team of the player at the time of the move.
    pub equipo: Option<u32>,
    /// When the move was accepted.
    pub created_at: SystemTime,
}

/// Stored post-game guess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessEntity {
    /// Stable identifier for the guess.
    pub id: Uuid,
    /// Player who submitted the guess.
    pub jugador: String,
    /// Number of correctly guessed blocks.
    pub aciertos: u32,
    /// Per-block detail.
    pub bloques: Vec<GuessBlockEntity>,
    /// Submission time.
    pub fecha: SystemTime,
}

/// Guess detail for a single block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessBlockEntity {
    /// Guessed weight.
    pub intento: u32,
    /// Real weight.
    pub peso_real: u32,
    /// Whether the guess matched.
    pub acertado: bool,
}
