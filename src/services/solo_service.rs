use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    dto::ws::ServerMessage,
    services::websocket_service::{PlayError, send_message_to_websocket},
    state::{SharedState, blocks::BlockColor, game::Side},
};

/// Attach the connection to the solo session of `name` and hand it the turn.
///
/// Re-entering an in-progress session resumes it untouched.
pub fn enter(
    state: &SharedState,
    tx: &mpsc::UnboundedSender<Message>,
    name: &str,
) -> Result<(), PlayError> {
    let (session, created) = state.solo_sessions().get_or_create(name);
    if created {
        info!(player = name, "solo session created");
    } else {
        info!(player = name, moves = session.jugadas.len(), "solo session resumed");
    }

    send_message_to_websocket(tx, &ServerMessage::solo_turn(name))
}

/// Record a solo move, then send either the next turn or the summary.
pub fn play(
    state: &SharedState,
    tx: &mpsc::UnboundedSender<Message>,
    name: &str,
    color: BlockColor,
    peso: u32,
    lado: Side,
) -> Result<(), PlayError> {
    let outcome = state
        .solo_sessions()
        .record_move(name, color, peso, lado)?;

    send_message_to_websocket(
        tx,
        &ServerMessage::ActualizarBalanza {
            izquierdo: outcome.totales.izquierdo,
            derecho: outcome.totales.derecho,
            jugador: name.to_owned(),
        },
    )?;

    if outcome.terminado {
        let summary = state.solo_sessions().build_summary(name)?;
        info!(player = name, winner = ?summary.ganador, "solo session finished");
        send_message_to_websocket(tx, &ServerMessage::Resumen(summary))
    } else {
        send_message_to_websocket(tx, &ServerMessage::solo_turn(name))
    }
}
