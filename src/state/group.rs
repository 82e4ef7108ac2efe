use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::GameTimings,
    dao::models::MoveEntity,
    dto::ws::{ServerMessage, SummaryReport},
    services::pairing,
    state::{
        blocks::{BLOCKS_PER_PLAYER, Block, BlockColor, generate_block_set, is_block_weight},
        game::{Move, ScaleTotals, Side},
        state_machine::{FinishReason, GroupEvent, GroupPhase, GroupStateMachine},
    },
};

/// Notice sent privately to a player removed for inactivity.
pub const ELIMINATION_NOTICE: &str = "Fuiste eliminado por inactividad.";

/// A player seated in the group game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Connection the player joined from.
    pub connection_id: Uuid,
    /// Display name, unique within the roster.
    pub nombre: String,
    /// Eliminated players keep their seat but never get the turn again.
    pub eliminado: bool,
}

/// What the caller must do with a timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Schedule a fresh task, replacing any pending one.
    Start,
    /// Abort the pending task.
    Cancel,
}

/// Side effects produced by a game operation, in causal order.
#[derive(Debug, Default)]
pub struct Effects {
    /// Messages to deliver, addressed by connection.
    pub messages: Vec<(Uuid, ServerMessage)>,
    /// Countdown timer change, if any.
    pub countdown: Option<TimerCommand>,
    /// Turn timer change, if any.
    pub turn_timer: Option<TimerCommand>,
    /// The game just finished and the summary must be produced.
    pub finished: bool,
}

impl Effects {
    fn send(&mut self, to: Uuid, message: ServerMessage) {
        self.messages.push((to, message));
    }
}

/// Reasons a player cannot join the group game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Another seated player already uses the name.
    #[error("the name `{0}` is already taken")]
    DuplicateName(String),
    /// The game ended and is waiting for its players to leave.
    #[error("the game already finished")]
    GameFinished,
}

/// Reasons a move is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Turns are only played while the game is running.
    #[error("the game is not in progress")]
    NotInProgress,
    /// The connection has no seat in the game.
    #[error("connection is not part of the game")]
    NotInRoster,
    /// Somebody else holds the turn.
    #[error("it is {holder}'s turn")]
    OutOfTurn {
        /// Current turn holder.
        holder: String,
    },
    /// The reported weight is outside the dealt range.
    #[error("block weight {0} is out of range")]
    InvalidWeight(u32),
}

/// A move applied in memory, with the record to persist.
#[derive(Debug)]
pub struct AcceptedMove {
    /// Entry for the persisted move log.
    pub record: MoveEntity,
    /// Broadcasts and timer changes triggered by the move.
    pub effects: Effects,
}

/// Outcome of a countdown tick.
#[derive(Debug)]
pub enum CountdownTick {
    /// The countdown was cancelled or replaced; the ticking task must stop.
    Stale,
    /// Ticks remain.
    Running(Effects),
    /// The countdown reached zero and the game started.
    Elapsed(Effects),
}

/// The shared turn-based game. Exactly one exists per process.
#[derive(Debug)]
pub struct GroupGame {
    id: Uuid,
    machine: GroupStateMachine,
    timings: GameTimings,
    roster: Vec<RosterEntry>,
    turn_index: usize,
    teams: Vec<Vec<String>>,
    team_of: IndexMap<String, u32>,
    blocks: IndexMap<String, Vec<Block>>,
    totals: ScaleTotals,
    moves: Vec<Move>,
    countdown_remaining: Option<u32>,
    countdown_epoch: u64,
    turn_epoch: u64,
    summary: Option<SummaryReport>,
}

impl GroupGame {
    /// Create an empty game waiting for players.
    pub fn new(timings: GameTimings) -> Self {
        Self {
            id: Uuid::new_v4(),
            machine: GroupStateMachine::new(),
            timings,
            roster: Vec::new(),
            turn_index: 0,
            teams: Vec::new(),
            team_of: IndexMap::new(),
            blocks: IndexMap::new(),
            totals: ScaleTotals::default(),
            moves: Vec::new(),
            countdown_remaining: None,
            countdown_epoch: 0,
            turn_epoch: 0,
            summary: None,
        }
    }

    /// Identifier scoping the persisted move log.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> GroupPhase {
        self.machine.phase()
    }

    /// Seated players in join order.
    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    /// Current turn holder while the game is running.
    pub fn turn_holder(&self) -> Option<&RosterEntry> {
        if self.phase() != GroupPhase::InProgress {
            return None;
        }
        self.roster
            .get(self.turn_index)
            .filter(|entry| !entry.eliminado)
    }

    /// Team number of `player`, if paired.
    pub fn team_of(&self, player: &str) -> Option<u32> {
        self.team_of.get(player).copied()
    }

    /// Blocks dealt to every player who ever joined this game.
    pub fn blocks(&self) -> &IndexMap<String, Vec<Block>> {
        &self.blocks
    }

    /// Pan totals so far.
    pub fn totals(&self) -> ScaleTotals {
        self.totals
    }

    /// Accepted moves in order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves after which the game ends.
    pub fn total_blocks(&self) -> usize {
        self.blocks.len() * BLOCKS_PER_PLAYER
    }

    /// Seated players never eliminated.
    pub fn survivors(&self) -> Vec<String> {
        self.roster
            .iter()
            .filter(|entry| !entry.eliminado)
            .map(|entry| entry.nombre.clone())
            .collect()
    }

    /// Ticks left on the start countdown.
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown_remaining
    }

    /// Generation of the current countdown.
    pub fn countdown_epoch(&self) -> u64 {
        self.countdown_epoch
    }

    /// Generation of the current turn.
    pub fn turn_epoch(&self) -> u64 {
        self.turn_epoch
    }

    /// Timings the game was created with.
    pub fn timings(&self) -> GameTimings {
        self.timings
    }

    /// Cached end-of-game report.
    pub fn summary(&self) -> Option<&SummaryReport> {
        self.summary.as_ref()
    }

    /// Cache the end-of-game report. Only the first report is kept.
    pub fn store_summary(&mut self, report: SummaryReport) {
        if self.summary.is_none() {
            self.summary = Some(report);
        }
    }

    /// Seat a player.
    pub fn join(&mut self, connection_id: Uuid, name: &str) -> Result<Effects, JoinError> {
        if self.phase() == GroupPhase::Finished {
            return Err(JoinError::GameFinished);
        }
        if self.roster.iter().any(|entry| entry.nombre == name) {
            return Err(JoinError::DuplicateName(name.to_owned()));
        }

        self.blocks
            .entry(name.to_owned())
            .or_insert_with(generate_block_set);
        self.roster.push(RosterEntry {
            connection_id,
            nombre: name.to_owned(),
            eliminado: false,
        });
        info!(game = %self.id, player = name, roster = self.roster.len(), "player joined group game");

        let mut effects = Effects::default();
        self.broadcast(
            &mut effects,
            ServerMessage::Entrada {
                total_jugadores: self.roster.len(),
            },
        );
        self.on_roster_changed(&mut effects);
        if self.phase() == GroupPhase::InProgress {
            self.push_turn_messages(&mut effects);
        }

        Ok(effects)
    }

    /// Remove the player seated from `connection_id`. Returns `None` when it had no seat.
    pub fn leave(&mut self, connection_id: Uuid) -> Option<Effects> {
        let index = self
            .roster
            .iter()
            .position(|entry| entry.connection_id == connection_id)?;
        let entry = self.roster.remove(index);
        info!(game = %self.id, player = %entry.nombre, roster = self.roster.len(), "player left group game");

        let mut effects = Effects::default();
        if self.roster.is_empty() {
            info!(game = %self.id, "roster empty; resetting group game");
            self.reset();
            effects.countdown = Some(TimerCommand::Cancel);
            effects.turn_timer = Some(TimerCommand::Cancel);
            return Some(effects);
        }

        self.broadcast(
            &mut effects,
            ServerMessage::Mensaje {
                contenido: format!("{} salió de la partida.", entry.nombre),
            },
        );
        self.on_roster_changed(&mut effects);

        if self.phase() == GroupPhase::InProgress {
            if index < self.turn_index {
                self.turn_index -= 1;
            } else if index == self.turn_index {
                match self.next_active_from(index % self.roster.len()) {
                    Some(next) => {
                        self.turn_index = next;
                        self.assign_turn(&mut effects);
                    }
                    None => self.finish(FinishReason::NoActivePlayers, &mut effects),
                }
            }
        }

        Some(effects)
    }

    /// Advance the start countdown by one tick.
    pub fn countdown_tick(&mut self, epoch: u64) -> CountdownTick {
        if epoch != self.countdown_epoch || self.phase() != GroupPhase::PairingCountdown {
            return CountdownTick::Stale;
        }
        let Some(remaining) = self.countdown_remaining else {
            return CountdownTick::Stale;
        };

        let remaining = remaining.saturating_sub(1);
        let mut effects = Effects::default();
        self.broadcast(
            &mut effects,
            ServerMessage::Temporizador {
                tiempo_restante: Some(remaining),
            },
        );

        if remaining > 0 {
            self.countdown_remaining = Some(remaining);
            return CountdownTick::Running(effects);
        }

        self.countdown_remaining = None;
        self.transition(GroupEvent::CountdownElapsed);
        self.regroup(&mut effects);
        self.turn_index = 0;
        self.assign_turn(&mut effects);
        info!(game = %self.id, players = self.roster.len(), "group game started");

        CountdownTick::Elapsed(effects)
    }

    /// Apply a move from `connection_id`.
    pub fn submit_move(
        &mut self,
        connection_id: Uuid,
        color: BlockColor,
        peso: u32,
        lado: Side,
    ) -> Result<AcceptedMove, MoveError> {
        if self.phase() != GroupPhase::InProgress {
            return Err(MoveError::NotInProgress);
        }
        let index = self
            .roster
            .iter()
            .position(|entry| entry.connection_id == connection_id)
            .ok_or(MoveError::NotInRoster)?;
        if index != self.turn_index || self.roster[index].eliminado {
            return Err(MoveError::OutOfTurn {
                holder: self
                    .roster
                    .get(self.turn_index)
                    .map(|entry| entry.nombre.clone())
                    .unwrap_or_default(),
            });
        }
        if !is_block_weight(peso) {
            return Err(MoveError::InvalidWeight(peso));
        }

        let jugador = self.roster[index].nombre.clone();
        let equipo = self.team_of(&jugador);
        let turno = self.moves.len() as u32 + 1;
        self.totals.add(lado, peso);
        self.moves.push(Move {
            jugador: jugador.clone(),
            color,
            peso,
            lado,
            turno,
        });

        let mut effects = Effects {
            turn_timer: Some(TimerCommand::Cancel),
            ..Effects::default()
        };
        self.broadcast(
            &mut effects,
            ServerMessage::ActualizarBalanza {
                izquierdo: self.totals.izquierdo,
                derecho: self.totals.derecho,
                jugador: jugador.clone(),
            },
        );

        if self.moves.len() >= self.total_blocks() {
            self.finish(FinishReason::AllBlocksPlaced, &mut effects);
        } else {
            self.advance_turn(&mut effects);
        }

        Ok(AcceptedMove {
            record: MoveEntity {
                game_id: self.id,
                jugador,
                turno,
                peso,
                color,
                lado,
                equipo,
                created_at: SystemTime::now(),
            },
            effects,
        })
    }

    /// Eliminate the turn holder for inactivity. Returns `None` for a stale timer.
    pub fn turn_timeout(&mut self, epoch: u64) -> Option<Effects> {
        if epoch != self.turn_epoch || self.phase() != GroupPhase::InProgress {
            return None;
        }
        let entry = self.roster.get_mut(self.turn_index)?;
        if entry.eliminado {
            return None;
        }
        entry.eliminado = true;
        let connection_id = entry.connection_id;
        let name = entry.nombre.clone();
        info!(game = %self.id, player = %name, "turn holder eliminated for inactivity");

        let mut effects = Effects::default();
        effects.send(
            connection_id,
            ServerMessage::Eliminado {
                mensaje: ELIMINATION_NOTICE.to_owned(),
            },
        );
        self.broadcast(
            &mut effects,
            ServerMessage::Mensaje {
                contenido: format!("{name} fue eliminado por inactividad."),
            },
        );
        self.advance_turn(&mut effects);

        Some(effects)
    }

    fn on_roster_changed(&mut self, effects: &mut Effects) {
        match self.phase() {
            GroupPhase::Finished => {}
            GroupPhase::InProgress => self.regroup(effects),
            GroupPhase::WaitingForPlayers | GroupPhase::PairingCountdown => {
                self.regroup(effects);
                let size = self.roster.len();
                let ready = size >= 2 && size % 2 == 0;
                match (self.phase(), ready) {
                    (GroupPhase::WaitingForPlayers, true) => self.start_countdown(effects),
                    (GroupPhase::PairingCountdown, false) => self.cancel_countdown(effects),
                    _ => {}
                }
            }
        }
    }

    fn regroup(&mut self, effects: &mut Effects) {
        let names: Vec<String> = self
            .roster
            .iter()
            .map(|entry| entry.nombre.clone())
            .collect();
        self.teams = pairing::pair_players(&names, &mut rand::rng());
        self.team_of = pairing::team_assignments(&self.teams);
        self.broadcast(
            effects,
            ServerMessage::Equipos {
                lista: self.teams.clone(),
            },
        );
    }

    fn start_countdown(&mut self, effects: &mut Effects) {
        self.transition(GroupEvent::RosterReady);
        self.countdown_remaining = Some(self.timings.countdown_for(self.roster.len()));
        self.countdown_epoch += 1;
        effects.countdown = Some(TimerCommand::Start);
    }

    fn cancel_countdown(&mut self, effects: &mut Effects) {
        self.transition(GroupEvent::RosterUnready);
        self.countdown_remaining = None;
        self.countdown_epoch += 1;
        effects.countdown = Some(TimerCommand::Cancel);
        self.broadcast(
            effects,
            ServerMessage::Temporizador {
                tiempo_restante: None,
            },
        );
    }

    /// First non-eliminated seat scanning forward from `start`, wrapping once.
    fn next_active_from(&self, start: usize) -> Option<usize> {
        let len = self.roster.len();
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| !self.roster[index].eliminado)
    }

    fn advance_turn(&mut self, effects: &mut Effects) {
        match self.next_active_from(self.turn_index + 1) {
            Some(next) => {
                self.turn_index = next;
                self.assign_turn(effects);
            }
            None => self.finish(FinishReason::NoActivePlayers, effects),
        }
    }

    fn assign_turn(&mut self, effects: &mut Effects) {
        self.turn_epoch += 1;
        self.push_turn_messages(effects);
        effects.turn_timer = Some(TimerCommand::Start);
    }

    fn push_turn_messages(&self, effects: &mut Effects) {
        let Some(holder) = self.roster.get(self.turn_index) else {
            return;
        };
        for (index, entry) in self.roster.iter().enumerate() {
            let equipo = self.team_of(&entry.nombre);
            effects.send(
                entry.connection_id,
                ServerMessage::Turno {
                    tu_turno: index == self.turn_index,
                    jugador_en_turno: holder.nombre.clone(),
                    equipo,
                    companeros: equipo
                        .map(|team| pairing::teammates(&self.teams, team, &entry.nombre)),
                },
            );
        }
    }

    fn finish(&mut self, reason: FinishReason, effects: &mut Effects) {
        self.transition(GroupEvent::Finish(reason));
        self.countdown_remaining = None;
        effects.turn_timer = Some(TimerCommand::Cancel);
        effects.finished = true;
        info!(game = %self.id, ?reason, moves = self.moves.len(), "group game finished");
    }

    /// Start over with a new id and no players, keeping the lifecycle in the state machine.
    fn reset(&mut self) {
        self.transition(GroupEvent::Reset);
        let machine = std::mem::take(&mut self.machine);
        *self = GroupGame {
            machine,
            ..GroupGame::new(self.timings)
        };
    }

    fn transition(&mut self, event: GroupEvent) {
        if let Err(err) = self.machine.apply(event) {
            warn!(game = %self.id, error = %err, "ignoring invalid group transition");
        }
    }

    fn broadcast(&self, effects: &mut Effects, message: ServerMessage) {
        for entry in &self.roster {
            effects.send(entry.connection_id, message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GroupGame {
        GroupGame::new(GameTimings::default())
    }

    fn messages_for(effects: &Effects, id: Uuid) -> Vec<&ServerMessage> {
        effects
            .messages
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, message)| message)
            .collect()
    }

    fn turn_for(effects: &Effects, id: Uuid) -> Option<(bool, String)> {
        messages_for(effects, id)
            .into_iter()
            .rev()
            .find_map(|message| match message {
                ServerMessage::Turno {
                    tu_turno,
                    jugador_en_turno,
                    ..
                } => Some((*tu_turno, jugador_en_turno.clone())),
                _ => None,
            })
    }

    fn run_countdown(game: &mut GroupGame) -> Effects {
        let epoch = game.countdown_epoch();
        loop {
            match game.countdown_tick(epoch) {
                CountdownTick::Running(_) => continue,
                CountdownTick::Elapsed(effects) => return effects,
                CountdownTick::Stale => panic!("countdown went stale"),
            }
        }
    }

    fn started(names: &[&str]) -> (GroupGame, Vec<Uuid>, Effects) {
        let mut game = game();
        let ids: Vec<Uuid> = names.iter().map(|_| Uuid::new_v4()).collect();
        for (id, name) in ids.iter().zip(names) {
            game.join(*id, name).unwrap();
        }
        let effects = run_countdown(&mut game);
        (game, ids, effects)
    }

    #[test]
    fn first_join_waits_for_players() {
        let mut game = game();
        let ana = Uuid::new_v4();
        let effects = game.join(ana, "Ana").unwrap();

        assert_eq!(game.phase(), GroupPhase::WaitingForPlayers);
        assert_eq!(
            messages_for(&effects, ana)[0],
            &ServerMessage::Entrada { total_jugadores: 1 }
        );
        assert_eq!(effects.countdown, None);
        assert_eq!(game.total_blocks(), 10);
    }

    #[test]
    fn two_players_play_through_countdown_and_first_turns() {
        let mut game = game();
        let (ana, beto) = (Uuid::new_v4(), Uuid::new_v4());
        game.join(ana, "Ana").unwrap();
        let effects = game.join(beto, "Beto").unwrap();

        assert_eq!(effects.countdown, Some(TimerCommand::Start));
        assert_eq!(game.phase(), GroupPhase::PairingCountdown);
        assert_eq!(game.countdown_remaining(), Some(20));

        let epoch = game.countdown_epoch();
        let mut broadcast = Vec::new();
        let started = loop {
            match game.countdown_tick(epoch) {
                CountdownTick::Running(effects) => broadcast.extend(effects.messages),
                CountdownTick::Elapsed(effects) => break effects,
                CountdownTick::Stale => panic!("countdown went stale"),
            }
        };
        let remaining: Vec<Option<u32>> = broadcast
            .iter()
            .filter(|(to, _)| *to == ana)
            .filter_map(|(_, message)| match message {
                ServerMessage::Temporizador { tiempo_restante } => Some(*tiempo_restante),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, (1..=19).rev().map(Some).collect::<Vec<_>>());

        assert_eq!(game.phase(), GroupPhase::InProgress);
        assert_eq!(started.turn_timer, Some(TimerCommand::Start));
        assert_eq!(turn_for(&started, ana), Some((true, "Ana".into())));
        assert_eq!(turn_for(&started, beto), Some((false, "Ana".into())));
        assert_eq!(game.team_of("Ana"), Some(1));
        assert_eq!(game.team_of("Beto"), Some(1));

        let accepted = game
            .submit_move(ana, BlockColor::Red, 7, Side::Izquierdo)
            .unwrap();
        assert_eq!(accepted.record.turno, 1);
        assert_eq!(accepted.record.equipo, Some(1));
        assert_eq!(accepted.record.game_id, game.id());
        assert_eq!(
            messages_for(&accepted.effects, beto)[0],
            &ServerMessage::ActualizarBalanza {
                izquierdo: 7,
                derecho: 0,
                jugador: "Ana".into()
            }
        );
        assert_eq!(turn_for(&accepted.effects, beto), Some((true, "Beto".into())));
        assert_eq!(turn_for(&accepted.effects, ana), Some((false, "Beto".into())));
        assert_eq!(accepted.effects.turn_timer, Some(TimerCommand::Start));

        assert_eq!(
            game.submit_move(ana, BlockColor::Red, 5, Side::Derecho)
                .unwrap_err(),
            MoveError::OutOfTurn {
                holder: "Beto".into()
            }
        );
        assert_eq!(game.totals().derecho, 0);
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn out_of_range_weight_keeps_the_turn() {
        let (mut game, ids, _) = started(&["Ana", "Beto"]);
        let epoch = game.turn_epoch();

        assert_eq!(
            game.submit_move(ids[0], BlockColor::Red, u32::MAX, Side::Izquierdo)
                .unwrap_err(),
            MoveError::InvalidWeight(u32::MAX)
        );
        assert_eq!(
            game.submit_move(ids[0], BlockColor::Red, 1, Side::Izquierdo)
                .unwrap_err(),
            MoveError::InvalidWeight(1)
        );
        assert_eq!(game.totals(), ScaleTotals::default());
        assert!(game.moves().is_empty());
        assert_eq!(game.turn_holder().unwrap().nombre, "Ana");
        assert_eq!(game.turn_epoch(), epoch);

        game.submit_move(ids[0], BlockColor::Red, 20, Side::Izquierdo)
            .unwrap();
        assert_eq!(game.totals().izquierdo, 20);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut game = game();
        game.join(Uuid::new_v4(), "Ana").unwrap();
        assert_eq!(
            game.join(Uuid::new_v4(), "Ana").unwrap_err(),
            JoinError::DuplicateName("Ana".into())
        );
        assert_eq!(game.roster().len(), 1);
    }

    #[test]
    fn odd_roster_cancels_countdown() {
        let mut game = game();
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        game.join(ids[0], "Ana").unwrap();
        game.join(ids[1], "Beto").unwrap();
        let epoch = game.countdown_epoch();

        let effects = game.join(ids[2], "Caro").unwrap();
        assert_eq!(effects.countdown, Some(TimerCommand::Cancel));
        assert_eq!(game.phase(), GroupPhase::WaitingForPlayers);
        let cancellations = messages_for(&effects, ids[0])
            .into_iter()
            .filter(|message| {
                **message
                    == ServerMessage::Temporizador {
                        tiempo_restante: None,
                    }
            })
            .count();
        assert_eq!(cancellations, 1);
        assert!(matches!(game.countdown_tick(epoch), CountdownTick::Stale));
    }

    #[test]
    fn full_roster_uses_short_countdown() {
        let mut game = game();
        for index in 0..8 {
            game.join(Uuid::new_v4(), &format!("P{index}")).unwrap();
        }
        assert_eq!(game.countdown_remaining(), Some(20));

        // The ninth player cancels, the tenth restarts with the short countdown.
        game.join(Uuid::new_v4(), "P8").unwrap();
        assert_eq!(game.phase(), GroupPhase::WaitingForPlayers);
        game.join(Uuid::new_v4(), "P9").unwrap();
        assert_eq!(game.phase(), GroupPhase::PairingCountdown);
        assert_eq!(game.countdown_remaining(), Some(5));
    }

    #[test]
    fn game_finishes_after_every_block_is_placed() {
        let (mut game, ids, _) = started(&["Ana", "Beto"]);
        let mut last = None;
        for turn in 0..20 {
            let holder = ids[turn % 2];
            let accepted = game
                .submit_move(holder, BlockColor::Blue, 2, Side::Derecho)
                .unwrap();
            last = Some(accepted.effects);
        }

        let effects = last.unwrap();
        assert!(effects.finished);
        assert_eq!(effects.turn_timer, Some(TimerCommand::Cancel));
        assert_eq!(game.phase(), GroupPhase::Finished);
        assert_eq!(game.totals().derecho, 40);
        assert_eq!(
            game.moves().iter().map(|m| m.peso).sum::<u32>(),
            game.totals().izquierdo + game.totals().derecho
        );
        assert_eq!(
            game.submit_move(ids[0], BlockColor::Blue, 2, Side::Derecho)
                .unwrap_err(),
            MoveError::NotInProgress
        );
        assert_eq!(
            game.join(Uuid::new_v4(), "Caro").unwrap_err(),
            JoinError::GameFinished
        );
    }

    #[test]
    fn timeout_eliminates_and_wraps_around() {
        let (mut game, ids, _) = started(&["Ana", "Beto", "Caro", "Dani"]);
        for (turn, id) in ids.iter().take(3).enumerate() {
            game.submit_move(*id, BlockColor::Green, 3 + turn as u32, Side::Izquierdo)
                .unwrap();
        }
        assert_eq!(game.turn_holder().unwrap().nombre, "Dani");

        let stale = game.turn_epoch() - 1;
        assert!(game.turn_timeout(stale).is_none());

        let effects = game.turn_timeout(game.turn_epoch()).unwrap();
        assert_eq!(
            messages_for(&effects, ids[3])[0],
            &ServerMessage::Eliminado {
                mensaje: ELIMINATION_NOTICE.into()
            }
        );
        assert!(messages_for(&effects, ids[0]).contains(&&ServerMessage::Mensaje {
            contenido: "Dani fue eliminado por inactividad.".into()
        }));
        assert_eq!(game.turn_holder().unwrap().nombre, "Ana");
        assert_eq!(turn_for(&effects, ids[0]), Some((true, "Ana".into())));
        assert_eq!(game.survivors(), vec!["Ana", "Beto", "Caro"]);
    }

    #[test]
    fn eliminating_everyone_finishes_the_game() {
        let (mut game, _, _) = started(&["Ana", "Beto"]);
        let first = game.turn_timeout(game.turn_epoch()).unwrap();
        assert!(!first.finished);
        assert_eq!(game.turn_holder().unwrap().nombre, "Beto");

        let second = game.turn_timeout(game.turn_epoch()).unwrap();
        assert!(second.finished);
        assert_eq!(game.phase(), GroupPhase::Finished);
        assert!(game.survivors().is_empty());
    }

    #[test]
    fn holder_leaving_passes_the_turn() {
        let (mut game, ids, _) = started(&["Ana", "Beto", "Caro", "Dani"]);
        game.submit_move(ids[0], BlockColor::Red, 4, Side::Derecho)
            .unwrap();
        let epoch = game.turn_epoch();

        let effects = game.leave(ids[1]).unwrap();
        assert_eq!(game.turn_holder().unwrap().nombre, "Caro");
        assert!(game.turn_epoch() > epoch);
        assert_eq!(effects.turn_timer, Some(TimerCommand::Start));
        assert_eq!(turn_for(&effects, ids[2]), Some((true, "Caro".into())));
        assert_eq!(game.total_blocks(), 40);
    }

    #[test]
    fn earlier_seat_leaving_keeps_the_holder() {
        let (mut game, ids, _) = started(&["Ana", "Beto", "Caro", "Dani"]);
        game.submit_move(ids[0], BlockColor::Red, 4, Side::Derecho)
            .unwrap();
        game.submit_move(ids[1], BlockColor::Red, 4, Side::Derecho)
            .unwrap();
        let epoch = game.turn_epoch();

        let effects = game.leave(ids[0]).unwrap();
        assert_eq!(game.turn_holder().unwrap().nombre, "Caro");
        assert_eq!(game.turn_epoch(), epoch);
        assert_eq!(effects.turn_timer, None);
    }

    #[test]
    fn late_join_learns_the_current_turn() {
        let (mut game, ids, _) = started(&["Ana", "Beto"]);
        let caro = Uuid::new_v4();
        let effects = game.join(caro, "Caro").unwrap();

        assert_eq!(game.phase(), GroupPhase::InProgress);
        assert_eq!(game.total_blocks(), 30);
        assert_eq!(turn_for(&effects, caro), Some((false, "Ana".into())));
        assert_eq!(turn_for(&effects, ids[0]), Some((true, "Ana".into())));
        assert_eq!(effects.turn_timer, None);
    }

    #[test]
    fn empty_roster_resets_the_game() {
        let (mut game, ids, _) = started(&["Ana", "Beto"]);
        let old_id = game.id();
        game.leave(ids[0]).unwrap();
        let effects = game.leave(ids[1]).unwrap();

        assert_eq!(effects.countdown, Some(TimerCommand::Cancel));
        assert_eq!(effects.turn_timer, Some(TimerCommand::Cancel));
        assert_ne!(game.id(), old_id);
        assert_eq!(game.phase(), GroupPhase::WaitingForPlayers);
        assert!(game.blocks().is_empty());
        assert!(game.leave(ids[0]).is_none());
    }

    #[test]
    fn finished_game_reopens_once_everyone_leaves() {
        let (mut game, ids, _) = started(&["Ana", "Beto"]);
        for _ in 0..ids.len() {
            game.turn_timeout(game.turn_epoch()).unwrap();
        }
        assert_eq!(game.phase(), GroupPhase::Finished);
        assert_eq!(
            game.join(Uuid::new_v4(), "Caro").unwrap_err(),
            JoinError::GameFinished
        );

        for id in &ids {
            game.leave(*id).unwrap();
        }
        assert_eq!(game.phase(), GroupPhase::WaitingForPlayers);
        game.join(Uuid::new_v4(), "Caro").unwrap();
        assert_eq!(game.roster().len(), 1);
    }

    #[test]
    fn rejoining_keeps_the_dealt_blocks() {
        let mut game = game();
        let (ana, beto) = (Uuid::new_v4(), Uuid::new_v4());
        game.join(ana, "Ana").unwrap();
        game.join(beto, "Beto").unwrap();
        let dealt = game.blocks()["Beto"].clone();

        game.leave(beto).unwrap();
        game.join(Uuid::new_v4(), "Beto").unwrap();
        assert_eq!(game.blocks()["Beto"], dealt);
        assert_eq!(game.blocks().len(), 2);
    }
}
