use serde::{Deserialize, Serialize};

use crate::generator::PieceWeights;

/// Highest level; later requests are clamped to it.
pub const MAX_LEVEL: u32 = 10;

/// How hard the player wants boards to be.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Smaller boards, fewer blockers and a looser par.
    Easy,
    /// The standard level table.
    #[default]
    Normal,
    /// Bigger boards, more blockers, fewer crosses and a tighter par.
    Hard,
}

/// Everything that shapes one level's board and its par.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LevelParams {
    /// 1-based level number.
    pub level: u32,
    /// Cells on each side of the square board.
    pub size: usize,
    /// Number of sources.
    pub sources: usize,
    /// Number of targets.
    pub targets: usize,
    /// Odds of each filler piece.
    pub weights: PieceWeights,
    /// Move count a good solve should not exceed.
    pub par: u32,
}

impl LevelParams {
    /// Derive the parameters of `level` (1-based, clamped to `1..=MAX_LEVEL`).
    ///
    /// Boards grow a cell every two levels and pick up a target at the same pace; a second source joins at level 5.
    /// Blockers get more common as levels go on, and from level 8 they crowd the board.
    pub fn for_level(level: u32, difficulty: Difficulty) -> Self {
        let level = level.clamp(1, MAX_LEVEL);
        let step = (level - 1) as usize;

        let size = match difficulty {
            Difficulty::Easy => 3 + step / 2,
            Difficulty::Normal => 4 + step / 2,
            Difficulty::Hard => 5 + step / 2,
        };
        let sources = if level >= 5 { 2 } else { 1 };
        let targets = 1 + step / 2;

        let blocker = match level {
            1..=3 => 1,
            4..=7 => 2 + (level - 4),
            _ => 8 + 2 * (level - 8),
        };
        let weights = PieceWeights {
            straight: 4,
            corner: 4,
            cross: if difficulty == Difficulty::Hard { 1 } else { 2 },
            blocker: match difficulty {
                Difficulty::Easy => blocker.saturating_sub(1),
                Difficulty::Normal => blocker,
                Difficulty::Hard => blocker + 1,
            },
        };

        let base_par = (size * size / 2 + 2 * targets) as u32;
        let par = match difficulty {
            Difficulty::Easy => base_par + base_par / 2,
            Difficulty::Normal => base_par,
            Difficulty::Hard => base_par - base_par / 4,
        };

        Self { level, size, sources, targets, weights, par }
    }

    /// Score for finishing this level in `moves`: 100 per level, plus 10 for every move under par.
    pub fn score(&self, moves: u32) -> u64 {
        let base = 100 * u64::from(self.level);
        let bonus = u64::from(self.par.saturating_sub(moves)) * 10;
        base + bonus
    }

    /// Whether `moves` is within par.
    pub fn is_efficient(&self, moves: u32) -> bool {
        moves <= self.par
    }
}
