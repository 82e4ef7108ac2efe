use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    dto::guess::GuessRequest,
    state::{
        blocks::{Block, BlockColor},
        game::{ScaleTotals, Side, Winner},
    },
};

/// Game flavour requested by a client on entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Single-player session keyed by name.
    Individual,
    /// Shared turn-based game.
    #[default]
    Multijugador,
}

/// Messages accepted from player WebSocket clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// Join a solo or group game.
    Entrada {
        jugador: String,
        #[serde(default)]
        modo: Option<GameMode>,
    },
    /// Drop a block on one of the pans.
    Jugada {
        #[serde(default)]
        jugador: Option<String>,
        peso: u32,
        color: BlockColor,
        lado: Side,
    },
    /// Explicitly leave the game.
    Salir {
        #[serde(default)]
        jugador: Option<String>,
    },
    /// Post-game guess of the hidden weights.
    Adivinanza(GuessRequest),
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Decode a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Messages pushed to player WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Whose turn it is, from the receiver's point of view.
    Turno {
        tu_turno: bool,
        jugador_en_turno: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        equipo: Option<u32>,
        #[serde(rename = "compañeros", skip_serializing_if = "Option::is_none")]
        companeros: Option<Vec<String>>,
    },
    /// New scale totals after an accepted move.
    ActualizarBalanza {
        izquierdo: u32,
        derecho: u32,
        jugador: String,
    },
    /// Free-form notice shown to every player.
    Mensaje { contenido: String },
    /// Sent to a player removed for inactivity.
    Eliminado { mensaje: String },
    /// Roster size after a join.
    Entrada { total_jugadores: usize },
    /// Pairing countdown; `null` once cancelled.
    Temporizador { tiempo_restante: Option<u32> },
    /// Current team layout.
    Equipos { lista: Vec<Vec<String>> },
    /// End-of-game report.
    Resumen(SummaryReport),
    /// Rejected request.
    Error { mensaje: String },
    /// Acknowledgement of a stored guess.
    AdivinanzaResultado { resultado: String },
}

impl ServerMessage {
    /// Build a `TURNO` message without team information (solo mode).
    pub fn solo_turn(player: &str) -> Self {
        ServerMessage::Turno {
            tu_turno: true,
            jugador_en_turno: player.to_string(),
            equipo: None,
            companeros: None,
        }
    }

    /// Build an `ERROR` message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            mensaje: message.into(),
        }
    }
}

/// One line of the move history in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub jugador: String,
    pub turno: u32,
    pub peso: u32,
    pub color: Option<BlockColor>,
}

/// Final snapshot of a game, revealing every original block weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    /// Solo player the report belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jugador: Option<String>,
    /// Accepted moves ordered by turn.
    pub contenido: Vec<SummaryEntry>,
    /// Final pan totals.
    pub totales: ScaleTotals,
    /// Players who were never eliminated.
    pub sobrevivientes: Vec<String>,
    /// Lighter pan, or a tie.
    pub ganador: Winner,
    /// Generated block set of every player.
    pub bloques_por_jugador: IndexMap<String, Vec<Block>>,
}
