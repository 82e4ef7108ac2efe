use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        validation::validate_player_name,
        ws::{GameMode, InboundMessage, ServerMessage},
    },
    error::ServiceError,
    services::{group_service, guess_service, solo_service},
    state::{
        PlayerConnection, SharedState,
        group::{JoinError, MoveError},
        session::SessionError,
    },
};

/// Failures while handling a player message.
///
/// Distinct from `ServiceError`, which is used for HTTP responses: these decide what, if
/// anything, the player sees and whether the socket stays open.
#[derive(Debug, Error)]
pub enum PlayError {
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
    /// Group join with a name already seated.
    #[error("the name `{0}` is already taken")]
    DuplicateName(String),
    /// Group join after the game ended.
    #[error("the group game already finished")]
    GameFinished,
    /// Malformed JSON or unknown message type.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// Action on a finished or missing solo session.
    #[error("stale session action: {0}")]
    StaleSessionAction(SessionError),
    /// Move reporting a weight no dealt block can have.
    #[error("block weight {0} is out of range")]
    InvalidWeight(u32),
    /// Move from a connection that does not hold the turn.
    #[error("out of turn: {holder} holds the turn")]
    OutOfTurn { holder: String },
    /// Move while no group game is running.
    #[error("moves are ignored while the game is not in progress")]
    NotInProgress,
    /// Game action before a successful entry.
    #[error("connection has not entered a game")]
    NotInGame,
    /// Payload names another player than the one seated on this connection.
    #[error("player mismatch (expected {expected}, got {got})")]
    MismatchedPlayer { expected: String, got: String },
    /// Rejected guess submission.
    #[error("validation failed: {0}")]
    ValidationFailure(String),
    /// Error from persistence or other services.
    #[error("service error: {0}")]
    Service(ServiceError),
}

impl From<JoinError> for PlayError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::DuplicateName(name) => PlayError::DuplicateName(name),
            JoinError::GameFinished => PlayError::GameFinished,
        }
    }
}

impl From<MoveError> for PlayError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::NotInProgress => PlayError::NotInProgress,
            MoveError::NotInRoster => PlayError::NotInGame,
            MoveError::OutOfTurn { holder } => PlayError::OutOfTurn { holder },
            MoveError::InvalidWeight(peso) => PlayError::InvalidWeight(peso),
        }
    }
}

impl From<SessionError> for PlayError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidWeight(peso) => PlayError::InvalidWeight(peso),
            other => PlayError::StaleSessionAction(other),
        }
    }
}

impl From<ServiceError> for PlayError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => PlayError::ValidationFailure(message),
            other => PlayError::Service(other),
        }
    }
}

impl PlayError {
    /// `ERROR` text shown to the player, if the failure is user-visible.
    fn reply(&self) -> Option<String> {
        match self {
            PlayError::DuplicateName(_) => Some("Este nombre de jugador ya está en uso.".into()),
            PlayError::GameFinished => Some("La partida ya terminó.".into()),
            PlayError::OutOfTurn { holder } => Some(format!("No es tu turno. Juega {holder}.")),
            PlayError::InvalidWeight(peso) => Some(format!("Peso de bloque inválido: {peso}.")),
            PlayError::ValidationFailure(message) => Some(message.clone()),
            PlayError::Service(_) => Some("No se pudo guardar la adivinanza.".into()),
            PlayError::ConnectionClosed
            | PlayError::InvalidMessage(_)
            | PlayError::StaleSessionAction(_)
            | PlayError::NotInProgress
            | PlayError::NotInGame
            | PlayError::MismatchedPlayer { .. } => None,
        }
    }

    fn closes_connection(&self) -> bool {
        matches!(
            self,
            PlayError::ConnectionClosed | PlayError::DuplicateName(_) | PlayError::GameFinished
        )
    }
}

/// Game a connection entered.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seat {
    Solo(String),
    Group(String),
}

impl Seat {
    fn name(&self) -> &str {
        match self {
            Seat::Solo(name) | Seat::Group(name) => name,
        }
    }
}

/// What the read loop does after a message.
enum Flow {
    Continue,
    Close,
}

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.connections().insert(
        connection_id,
        PlayerConnection {
            id: connection_id,
            tx: outbound_tx.clone(),
        },
    );
    info!(connection = %connection_id, "player connected");

    let mut seat: Option<Seat> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(connection = %connection_id, payload = %text, "received player message");

                match handle_text(&state, connection_id, &outbound_tx, &mut seat, &text).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Close) => {
                        let _ = outbound_tx.send(Message::Close(None));
                        break;
                    }
                    Err(err) => {
                        if let Flow::Close = report_failure(&outbound_tx, connection_id, &err) {
                            break;
                        }
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection_id, "player closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    if let Some(Seat::Group(_)) = seat {
        group_service::leave(&state, connection_id).await;
    }
    state.connections().remove(&connection_id);
    info!(connection = %connection_id, "player disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Log a failed message, send its `ERROR` reply and close the socket when the failure demands it.
fn report_failure(
    tx: &mpsc::UnboundedSender<Message>,
    connection_id: Uuid,
    err: &PlayError,
) -> Flow {
    warn!(connection = %connection_id, error = %err, "error while handling player message");
    if let Some(reply) = err.reply() {
        let _ = send_message_to_websocket(tx, &ServerMessage::error(reply));
    }
    if err.closes_connection() {
        let _ = tx.send(Message::Close(None));
        Flow::Close
    } else {
        Flow::Continue
    }
}

async fn handle_text(
    state: &SharedState,
    connection_id: Uuid,
    tx: &mpsc::UnboundedSender<Message>,
    seat: &mut Option<Seat>,
    text: &str,
) -> Result<Flow, PlayError> {
    let message =
        InboundMessage::from_json_str(text).map_err(|err| PlayError::InvalidMessage(err.to_string()))?;

    match message {
        InboundMessage::Entrada { jugador, modo } => {
            handle_entry(state, connection_id, tx, seat, jugador, modo.unwrap_or_default()).await?;
            Ok(Flow::Continue)
        }
        InboundMessage::Jugada {
            jugador,
            peso,
            color,
            lado,
        } => {
            let current = seat.as_ref().ok_or(PlayError::NotInGame)?;
            if let Some(claimed) = jugador
                && claimed != current.name()
            {
                return Err(PlayError::MismatchedPlayer {
                    expected: current.name().to_owned(),
                    got: claimed,
                });
            }
            match current {
                Seat::Solo(name) => solo_service::play(state, tx, name, color, peso, lado)?,
                Seat::Group(_) => {
                    group_service::submit_move(state, connection_id, color, peso, lado).await?
                }
            }
            Ok(Flow::Continue)
        }
        InboundMessage::Salir { .. } => {
            if let Some(Seat::Group(name)) = seat.take() {
                info!(connection = %connection_id, player = %name, "player left on request");
                group_service::leave(state, connection_id).await;
            }
            Ok(Flow::Close)
        }
        InboundMessage::Adivinanza(request) => {
            guess_service::submit_guess(state, request).await?;
            send_message_to_websocket(
                tx,
                &ServerMessage::AdivinanzaResultado {
                    resultado: "ok".into(),
                },
            )?;
            Ok(Flow::Continue)
        }
        InboundMessage::Unknown => Err(PlayError::InvalidMessage("unknown message type".into())),
    }
}

async fn handle_entry(
    state: &SharedState,
    connection_id: Uuid,
    tx: &mpsc::UnboundedSender<Message>,
    seat: &mut Option<Seat>,
    jugador: String,
    modo: GameMode,
) -> Result<(), PlayError> {
    validate_player_name(&jugador)
        .map_err(|_| PlayError::InvalidMessage(format!("invalid player name `{jugador}`")))?;

    match (seat.as_ref(), modo) {
        (None, GameMode::Individual) => {
            solo_service::enter(state, tx, &jugador)?;
            *seat = Some(Seat::Solo(jugador));
        }
        (None, GameMode::Multijugador) => {
            group_service::join(state, connection_id, &jugador).await?;
            *seat = Some(Seat::Group(jugador));
        }
        (Some(Seat::Solo(current)), GameMode::Individual) if *current == jugador => {
            solo_service::enter(state, tx, &jugador)?;
        }
        (Some(current), _) => {
            warn!(
                connection = %connection_id,
                seated = %current.name(),
                requested = %jugador,
                "ignoring repeated entry on the same connection"
            );
        }
    }

    Ok(())
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Returns `Ok(())` if the message was queued or if serialization failed (permanent error, no
/// point retrying). Returns `Err(PlayError::ConnectionClosed)` if the writer channel is closed.
pub fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), PlayError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}` (permanent error, not retrying)");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| PlayError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
