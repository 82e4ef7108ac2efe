use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of blocks every player receives for a game.
pub const BLOCKS_PER_PLAYER: usize = 10;
/// Lightest weight a block can carry.
pub const MIN_BLOCK_WEIGHT: u32 = 2;
/// Heaviest weight a block can carry.
pub const MAX_BLOCK_WEIGHT: u32 = 20;

/// Whether a client-reported weight could belong to a dealt block.
pub fn is_block_weight(peso: u32) -> bool {
    (MIN_BLOCK_WEIGHT..=MAX_BLOCK_WEIGHT).contains(&peso)
}

/// Fixed block palette; each color is dealt twice per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlockColor {
    /// Red block.
    Red,
    /// Blue block.
    Blue,
    /// Green block.
    Green,
    /// Orange block.
    Orange,
    /// Purple block.
    Purple,
}

impl BlockColor {
    /// Palette in dealing order.
    pub const PALETTE: [BlockColor; 5] = [
        BlockColor::Red,
        BlockColor::Blue,
        BlockColor::Green,
        BlockColor::Orange,
        BlockColor::Purple,
    ];

    /// Wire name of the color.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockColor::Red => "red",
            BlockColor::Blue => "blue",
            BlockColor::Green => "green",
            BlockColor::Orange => "orange",
            BlockColor::Purple => "purple",
        }
    }
}

/// A weighted block. Generated once per player per game and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Palette color of the block.
    pub color: BlockColor,
    /// Hidden weight, revealed in the game summary.
    pub peso: u32,
}

/// Deal a fresh block set using the thread-local RNG.
pub fn generate_block_set() -> Vec<Block> {
    generate_block_set_with(&mut rand::rng())
}

/// Deal a fresh block set: two blocks per palette color, weights uniform in `[2, 20]`.
pub fn generate_block_set_with<R: Rng + ?Sized>(rng: &mut R) -> Vec<Block> {
    BlockColor::PALETTE
        .iter()
        .flat_map(|&color| [color, color])
        .map(|color| Block {
            color,
            peso: rng.random_range(MIN_BLOCK_WEIGHT..=MAX_BLOCK_WEIGHT),
        })
        .collect()
}
