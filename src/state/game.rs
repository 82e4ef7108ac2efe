use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::blocks::BlockColor;

/// Pan of the scale a block is dropped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left pan.
    Izquierdo,
    /// Right pan.
    Derecho,
}

/// Outcome of a finished game.
///
/// The game rewards balance, so the *lighter* pan wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Winner {
    /// Left pan is lighter.
    Izquierdo,
    /// Right pan is lighter.
    Derecho,
    /// Both pans weigh the same.
    Empate,
}

impl Winner {
    /// Designate the winner from the final totals.
    pub fn from_totals(left: u32, right: u32) -> Self {
        match left.cmp(&right) {
            std::cmp::Ordering::Less => Winner::Izquierdo,
            std::cmp::Ordering::Greater => Winner::Derecho,
            std::cmp::Ordering::Equal => Winner::Empate,
        }
    }
}

/// Running weight on each pan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScaleTotals {
    /// Accumulated weight on the left pan.
    pub izquierdo: u32,
    /// Accumulated weight on the right pan.
    pub derecho: u32,
}

impl ScaleTotals {
    /// Add a block weight to the given pan. Saturates instead of wrapping.
    pub fn add(&mut self, side: Side, weight: u32) {
        let pan = match side {
            Side::Izquierdo => &mut self.izquierdo,
            Side::Derecho => &mut self.derecho,
        };
        *pan = pan.saturating_add(weight);
    }

    /// Lighter pan, or a tie.
    pub fn winner(&self) -> Winner {
        Winner::from_totals(self.izquierdo, self.derecho)
    }
}

/// An accepted block placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Player who placed the block.
    pub jugador: String,
    /// Color of the placed block.
    pub color: BlockColor,
    /// Client-reported weight of the block.
    pub peso: u32,
    /// Pan the block landed on.
    pub lado: Side,
    /// 1-based position in the accepted move order.
    pub turno: u32,
}
