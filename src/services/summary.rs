use tracing::warn;

use crate::{
    dao::{models::MoveEntity, storage::with_timeout},
    dto::ws::{SummaryEntry, SummaryReport},
    state::{SharedState, group::GroupGame},
};

/// Build the end-of-game report of a group game.
///
/// History comes from the persisted move log of this game. When storage is unreachable or
/// missed some moves, the in-memory log is used instead.
pub async fn build_group_summary(state: &SharedState, game: &GroupGame) -> SummaryReport {
    let history = match persisted_history(state, game).await {
        Some(entries) => entries,
        None => memory_history(game),
    };
    compose_report(game, history)
}

async fn persisted_history(state: &SharedState, game: &GroupGame) -> Option<Vec<SummaryEntry>> {
    let Some(store) = state.game_store().await else {
        warn!(game = %game.id(), "storage unavailable; summarizing from memory");
        return None;
    };

    match with_timeout(
        "list_moves",
        state.config().store_timeout(),
        store.list_moves(Some(game.id())),
    )
    .await
    {
        Ok(records) if records.len() >= game.moves().len() => {
            Some(records.into_iter().map(SummaryEntry::from).collect())
        }
        Ok(records) => {
            warn!(
                game = %game.id(),
                persisted = records.len(),
                played = game.moves().len(),
                "persisted move log incomplete; summarizing from memory"
            );
            None
        }
        Err(err) => {
            warn!(game = %game.id(), error = %err, "failed to load move log; summarizing from memory");
            None
        }
    }
}

fn memory_history(game: &GroupGame) -> Vec<SummaryEntry> {
    game.moves()
        .iter()
        .map(|jugada| SummaryEntry {
            jugador: jugada.jugador.clone(),
            turno: jugada.turno,
            peso: jugada.peso,
            color: Some(jugada.color),
        })
        .collect()
}

/// Assemble the report from a history and the game's final state.
pub fn compose_report(game: &GroupGame, contenido: Vec<SummaryEntry>) -> SummaryReport {
    let totales = game.totals();
    SummaryReport {
        jugador: None,
        contenido,
        totales,
        sobrevivientes: game.survivors(),
        ganador: totales.winner(),
        bloques_por_jugador: game.blocks().clone(),
    }
}

impl From<MoveEntity> for SummaryEntry {
    fn from(value: MoveEntity) -> Self {
        Self {
            jugador: value.jugador,
            turno: value.turno,
            peso: value.peso,
            color: Some(value.color),
        }
    }
}
