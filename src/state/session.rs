use dashmap::{DashMap, mapref::entry::Entry};
use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    dto::ws::{SummaryEntry, SummaryReport},
    state::{
        blocks::{BLOCKS_PER_PLAYER, Block, BlockColor, generate_block_set, is_block_weight},
        game::{Move, ScaleTotals, Side},
    },
};

/// Single-player session. Finishes after one move per dealt block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoloSession {
    /// Pan totals so far.
    pub totales: ScaleTotals,
    /// Blocks dealt when the session was created.
    pub bloques: Vec<Block>,
    /// Accepted moves in order.
    pub jugadas: Vec<Move>,
    /// Set once every block has been placed.
    pub terminado: bool,
}

impl SoloSession {
    fn new() -> Self {
        Self {
            totales: ScaleTotals::default(),
            bloques: generate_block_set(),
            jugadas: Vec::with_capacity(BLOCKS_PER_PLAYER),
            terminado: false,
        }
    }
}

/// Errors raised by solo session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session was ever created for this name.
    #[error("no solo session for `{0}`")]
    NotFound(String),
    /// The session already recorded all its moves.
    #[error("solo session `{0}` is already finished")]
    Finished(String),
    /// A summary was requested before the last move.
    #[error("solo session `{0}` is still in progress")]
    NotFinished(String),
    /// The reported weight is outside the dealt range.
    #[error("block weight {0} is out of range")]
    InvalidWeight(u32),
}

/// Result of recording a solo move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Pan totals after the move.
    pub totales: ScaleTotals,
    /// Whether this move completed the session.
    pub terminado: bool,
}

/// Process-wide solo sessions keyed by player name.
///
/// Any connection claiming a name resumes that name's session; there is no session token.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SoloSession>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the in-progress session for `name`, creating a fresh one when none exists or the
    /// previous one is finished. The boolean tells whether a new session was dealt.
    pub fn get_or_create(&self, name: &str) -> (SoloSession, bool) {
        match self.sessions.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                if entry.get().terminado {
                    entry.insert(SoloSession::new());
                    (entry.get().clone(), true)
                } else {
                    (entry.get().clone(), false)
                }
            }
            Entry::Vacant(entry) => {
                let session = entry.insert(SoloSession::new());
                (session.value().clone(), true)
            }
        }
    }

    /// Append a move to an in-progress session.
    pub fn record_move(
        &self,
        name: &str,
        color: BlockColor,
        peso: u32,
        lado: Side,
    ) -> Result<MoveOutcome, SessionError> {
        let mut session = self
            .sessions
            .get_mut(name)
            .ok_or_else(|| SessionError::NotFound(name.to_owned()))?;

        if session.terminado {
            return Err(SessionError::Finished(name.to_owned()));
        }
        if !is_block_weight(peso) {
            return Err(SessionError::InvalidWeight(peso));
        }

        let turno = session.jugadas.len() as u32 + 1;
        session.jugadas.push(Move {
            jugador: name.to_owned(),
            color,
            peso,
            lado,
            turno,
        });
        session.totales.add(lado, peso);

        if session.jugadas.len() >= BLOCKS_PER_PLAYER {
            session.terminado = true;
        }

        Ok(MoveOutcome {
            totales: session.totales,
            terminado: session.terminado,
        })
    }

    /// Build the end-of-session report. The player is always the only survivor.
    pub fn build_summary(&self, name: &str) -> Result<SummaryReport, SessionError> {
        let session = self
            .sessions
            .get(name)
            .ok_or_else(|| SessionError::NotFound(name.to_owned()))?;

        if !session.terminado {
            return Err(SessionError::NotFinished(name.to_owned()));
        }

        let mut bloques_por_jugador = IndexMap::new();
        bloques_por_jugador.insert(name.to_owned(), session.bloques.clone());

        Ok(SummaryReport {
            jugador: Some(name.to_owned()),
            contenido: session
                .jugadas
                .iter()
                .map(|jugada| SummaryEntry {
                    jugador: jugada.jugador.clone(),
                    turno: jugada.turno,
                    peso: jugada.peso,
                    color: Some(jugada.color),
                })
                .collect(),
            totales: session.totales,
            sobrevivientes: vec![name.to_owned()],
            ganador: session.totales.winner(),
            bloques_por_jugador,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::Winner;

    fn play_all(store: &SessionStore, name: &str) {
        for i in 0..BLOCKS_PER_PLAYER {
            let side = if i % 2 == 0 {
                Side::Izquierdo
            } else {
                Side::Derecho
            };
            store.record_move(name, BlockColor::Red, 3, side).unwrap();
        }
    }

    #[test]
    fn reentry_does_not_regenerate_in_progress_session() {
        let store = SessionStore::new();
        let (first, created) = store.get_or_create("Coco");
        assert!(created);

        store
            .record_move("Coco", BlockColor::Blue, 7, Side::Izquierdo)
            .unwrap();

        let (again, created) = store.get_or_create("Coco");
        assert!(!created);
        assert_eq!(again.bloques, first.bloques);
        assert_eq!(again.totales.izquierdo, 7);
        assert_eq!(again.jugadas.len(), 1);
    }

    #[test]
    fn finishes_after_ten_moves() {
        let store = SessionStore::new();
        store.get_or_create("Coco");

        for i in 0..BLOCKS_PER_PLAYER - 1 {
            let outcome = store
                .record_move("Coco", BlockColor::Green, 2, Side::Derecho)
                .unwrap();
            assert!(!outcome.terminado, "finished early at move {}", i + 1);
        }
        let last = store
            .record_move("Coco", BlockColor::Green, 2, Side::Derecho)
            .unwrap();
        assert!(last.terminado);
        assert_eq!(last.totales.derecho, 20);

        assert_eq!(
            store.record_move("Coco", BlockColor::Green, 2, Side::Derecho),
            Err(SessionError::Finished("Coco".into()))
        );
    }

    #[test]
    fn out_of_range_weight_is_not_applied() {
        let store = SessionStore::new();
        store.get_or_create("Coco");

        for peso in [0, 1, 21, u32::MAX] {
            assert_eq!(
                store.record_move("Coco", BlockColor::Red, peso, Side::Izquierdo),
                Err(SessionError::InvalidWeight(peso))
            );
        }
        let outcome = store
            .record_move("Coco", BlockColor::Red, 20, Side::Izquierdo)
            .unwrap();
        assert_eq!(outcome.totales.izquierdo, 20);
        assert!(!outcome.terminado);
    }

    #[test]
    fn move_without_session_is_rejected() {
        let store = SessionStore::new();
        assert_eq!(
            store.record_move("Nadie", BlockColor::Red, 2, Side::Izquierdo),
            Err(SessionError::NotFound("Nadie".into()))
        );
    }

    #[test]
    fn summary_reveals_generated_blocks() {
        let store = SessionStore::new();
        let (session, _) = store.get_or_create("Coco");
        assert_eq!(
            store.build_summary("Coco"),
            Err(SessionError::NotFinished("Coco".into()))
        );

        play_all(&store, "Coco");
        let summary = store.build_summary("Coco").unwrap();

        assert_eq!(summary.jugador.as_deref(), Some("Coco"));
        assert_eq!(summary.sobrevivientes, vec!["Coco".to_string()]);
        assert_eq!(summary.bloques_por_jugador["Coco"], session.bloques);
        assert_eq!(summary.contenido.len(), BLOCKS_PER_PLAYER);
        assert_eq!(summary.totales.izquierdo, 15);
        assert_eq!(summary.totales.derecho, 15);
        assert_eq!(summary.ganador, Winner::Empate);
        assert_eq!(
            summary.contenido.iter().map(|e| e.turno).collect::<Vec<_>>(),
            (1..=10).collect::<Vec<u32>>()
        );
    }

    #[test]
    fn finished_session_is_replaced_on_reentry() {
        let store = SessionStore::new();
        store.get_or_create("Coco");
        play_all(&store, "Coco");

        let (fresh, created) = store.get_or_create("Coco");
        assert!(created);
        assert!(!fresh.terminado);
        assert!(fresh.jugadas.is_empty());
        assert_eq!(fresh.totales, ScaleTotals::default());
    }
}
