use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    dao::{models::MoveEntity, storage::with_timeout},
    dto::ws::ServerMessage,
    services::{summary, websocket_service::PlayError},
    state::{
        GroupLobby, SharedState,
        blocks::BlockColor,
        game::Side,
        group::{CountdownTick, Effects, TimerCommand},
    },
};

/// Seat a player in the group game.
pub async fn join(state: &SharedState, connection_id: Uuid, name: &str) -> Result<(), PlayError> {
    let mut lobby = state.lobby().lock().await;
    let effects = lobby.game.join(connection_id, name)?;
    apply_effects(state, &mut lobby, effects).await;
    Ok(())
}

/// Remove the player seated from `connection_id`, if any.
pub async fn leave(state: &SharedState, connection_id: Uuid) {
    let mut lobby = state.lobby().lock().await;
    if let Some(effects) = lobby.game.leave(connection_id) {
        apply_effects(state, &mut lobby, effects).await;
    }
}

/// Apply a move from the turn holder, persist it, and broadcast the outcome.
pub async fn submit_move(
    state: &SharedState,
    connection_id: Uuid,
    color: BlockColor,
    peso: u32,
    lado: Side,
) -> Result<(), PlayError> {
    let mut lobby = state.lobby().lock().await;
    let accepted = lobby.game.submit_move(connection_id, color, peso, lado)?;
    persist_move(state, accepted.record).await;
    apply_effects(state, &mut lobby, accepted.effects).await;
    Ok(())
}

/// Append a move to the log. Failures are logged; the in-memory game is not rolled back.
async fn persist_move(state: &SharedState, record: MoveEntity) {
    let Some(store) = state.game_store().await else {
        error!(game = %record.game_id, turno = record.turno, "storage unavailable; move not persisted");
        return;
    };
    let (game_id, turno) = (record.game_id, record.turno);
    if let Err(err) = with_timeout(
        "append_move",
        state.config().store_timeout(),
        store.append_move(record),
    )
    .await
    {
        error!(game = %game_id, turno, error = %err, "failed to persist move");
    }
}

async fn apply_effects(state: &SharedState, lobby: &mut GroupLobby, effects: Effects) {
    let Effects {
        messages,
        countdown,
        turn_timer,
        finished,
    } = effects;

    state.dispatch(messages);

    match countdown {
        Some(TimerCommand::Start) => schedule_countdown(state, lobby),
        Some(TimerCommand::Cancel) => {
            lobby.countdown.cancel();
        }
        None => {}
    }
    match turn_timer {
        Some(TimerCommand::Start) => schedule_turn_timeout(state, lobby),
        Some(TimerCommand::Cancel) => {
            lobby.turn_timer.cancel();
        }
        None => {}
    }

    if finished {
        broadcast_summary(state, lobby).await;
    }
}

async fn broadcast_summary(state: &SharedState, lobby: &mut GroupLobby) {
    lobby.countdown.cancel();
    lobby.turn_timer.cancel();

    let report = match lobby.game.summary() {
        Some(report) => report.clone(),
        None => {
            let report = summary::build_group_summary(state, &lobby.game).await;
            lobby.game.store_summary(report.clone());
            report
        }
    };

    let message = ServerMessage::Resumen(report);
    let recipients: Vec<Uuid> = lobby
        .game
        .roster()
        .iter()
        .map(|entry| entry.connection_id)
        .collect();
    info!(game = %lobby.game.id(), players = recipients.len(), "broadcasting group summary");
    for connection_id in recipients {
        state.send_to(connection_id, &message);
    }
}

fn schedule_countdown(state: &SharedState, lobby: &mut GroupLobby) {
    let epoch = lobby.game.countdown_epoch();
    let tick = lobby.game.timings().tick;
    let weak = Arc::downgrade(state);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(state) = weak.upgrade() else {
                break;
            };
            if !countdown_tick(&state, epoch).await {
                break;
            }
        }
    });

    lobby.countdown.replace(handle);
}

/// Run one countdown tick. Returns whether the countdown keeps going.
async fn countdown_tick(state: &SharedState, epoch: u64) -> bool {
    let mut lobby = state.lobby().lock().await;
    match lobby.game.countdown_tick(epoch) {
        CountdownTick::Stale => {
            debug!(epoch, "stale countdown tick ignored");
            false
        }
        CountdownTick::Running(effects) => {
            apply_effects(state, &mut lobby, effects).await;
            true
        }
        CountdownTick::Elapsed(effects) => {
            lobby.countdown.release();
            apply_effects(state, &mut lobby, effects).await;
            false
        }
    }
}

fn schedule_turn_timeout(state: &SharedState, lobby: &mut GroupLobby) {
    let epoch = lobby.game.turn_epoch();
    let after = lobby.game.timings().turn_timeout();
    let weak = Arc::downgrade(state);

    let handle = tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(state) = weak.upgrade() {
            turn_timeout(&state, epoch).await;
        }
    });

    lobby.turn_timer.replace(handle);
}

async fn turn_timeout(state: &SharedState, epoch: u64) {
    let mut lobby = state.lobby().lock().await;
    match lobby.game.turn_timeout(epoch) {
        Some(effects) => {
            lobby.turn_timer.release();
            apply_effects(state, &mut lobby, effects).await;
        }
        None => debug!(epoch, "stale turn timeout ignored"),
    }
}
