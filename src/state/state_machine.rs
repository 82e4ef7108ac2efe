use thiserror::Error;

/// Phases a group game moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPhase {
    /// Players are gathering; the roster is empty, odd, or below two.
    WaitingForPlayers,
    /// The roster is even and the start countdown is running.
    PairingCountdown,
    /// Turns are being played.
    InProgress,
    /// The summary has been produced; no more moves or joins.
    Finished,
}

/// Indicates why a running game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every dealt block was placed.
    AllBlocksPlaced,
    /// Every player still in the roster was eliminated.
    NoActivePlayers,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEvent {
    /// The roster became even with at least two players.
    RosterReady,
    /// The roster stopped being startable during the countdown.
    RosterUnready,
    /// The countdown reached zero.
    CountdownElapsed,
    /// The game ended.
    Finish(FinishReason),
    /// The roster emptied; start over from scratch.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GroupPhase,
    /// The event that cannot be applied from this phase.
    pub event: GroupEvent,
}

/// State machine for the lifecycle of one group game.
#[derive(Debug, Clone)]
pub struct GroupStateMachine {
    phase: GroupPhase,
}

impl Default for GroupStateMachine {
    fn default() -> Self {
        Self {
            phase: GroupPhase::WaitingForPlayers,
        }
    }
}

impl GroupStateMachine {
    /// Create a new state machine waiting for players.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GroupPhase {
        self.phase
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: GroupEvent) -> Result<GroupPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    fn compute_transition(&self, event: GroupEvent) -> Result<GroupPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GroupPhase::WaitingForPlayers, GroupEvent::RosterReady) => {
                GroupPhase::PairingCountdown
            }
            (GroupPhase::PairingCountdown, GroupEvent::RosterUnready) => {
                GroupPhase::WaitingForPlayers
            }
            (GroupPhase::PairingCountdown, GroupEvent::CountdownElapsed) => GroupPhase::InProgress,
            (GroupPhase::InProgress, GroupEvent::Finish(..)) => GroupPhase::Finished,
            (_, GroupEvent::Reset) => GroupPhase::WaitingForPlayers,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
