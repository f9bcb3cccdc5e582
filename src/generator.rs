//! Random board generation.
//!
//! Sources and targets land on distinct random cells; every other cell gets a random connector or blocker at a random rotation.
//! Boards never start out solved. Nothing here checks that the result can be solved unless [`GeneratorConfig::require_solvable`] asks for it.

use std::num::NonZero;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::Board;
use crate::cell::{Cell, PieceKind};
use crate::error::ConfigurationError;
use crate::level::LevelParams;
use crate::location::Location;
use crate::shape::Rotation;

/// Relative odds of each filler piece.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceWeights {
    /// Weight of [`PieceKind::Straight`].
    pub straight: u32,
    /// Weight of [`PieceKind::Corner`].
    pub corner: u32,
    /// Weight of [`PieceKind::Cross`].
    pub cross: u32,
    /// Weight of [`PieceKind::Blocker`]; blockers never carry power.
    pub blocker: u32,
}

impl Default for PieceWeights {
    fn default() -> Self {
        Self {
            straight: 4,
            corner: 4,
            cross: 2,
            blocker: 1,
        }
    }
}

impl PieceWeights {
    fn total(&self) -> u32 {
        self.straight + self.corner + self.cross + self.blocker
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        let mut roll = rng.random_range(0..self.total());
        for (kind, weight) in [
            (PieceKind::Straight, self.straight),
            (PieceKind::Corner, self.corner),
            (PieceKind::Cross, self.cross),
        ] {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }

        PieceKind::Blocker
    }
}

/// Knobs for [`generate`] that do not change from level to level.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Keep generating until the rotation solver proves the board can be solved.
    ///
    /// Off by default: late levels are meant to be close to impossible, and may well be.
    pub require_solvable: bool,
    /// How many boards to try before giving up, at most [`Self::MAX_ATTEMPTS`].
    pub max_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            require_solvable: false,
            max_attempts: 64,
        }
    }
}

impl GeneratorConfig {
    /// Upper bound on [`Self::max_attempts`]; every attempt may run the rotation solver.
    pub const MAX_ATTEMPTS: u32 = 256;

    /// This config with `max_attempts` pulled into `1..=MAX_ATTEMPTS`.
    pub fn sanitized(self) -> Self {
        Self {
            max_attempts: self.max_attempts.clamp(1, Self::MAX_ATTEMPTS),
            ..self
        }
    }
}

fn validate(size: usize, sources: usize, targets: usize, weights: &PieceWeights) -> Result<(), ConfigurationError> {
    if size < 2 {
        return Err(ConfigurationError::GridTooSmall { size });
    }

    let cells = size * size;
    if sources + targets >= cells {
        return Err(ConfigurationError::TooManyEndpoints { sources, targets, cells });
    }

    if weights.total() == 0 {
        return Err(ConfigurationError::NoPieceWeights);
    }

    Ok(())
}

fn generate_once<R: Rng + ?Sized>(
    size: NonZero<usize>,
    sources: usize,
    targets: usize,
    weights: &PieceWeights,
    rng: &mut R,
) -> Board {
    let side = size.get();
    let endpoints = rand::seq::index::sample(rng, side * side, sources + targets).into_vec();
    let to_location = |index: usize| Location(index % side, index / side);

    let source_locations: Vec<Location> = endpoints[..sources].iter().copied().map(to_location).collect();
    let target_locations: Vec<Location> = endpoints[sources..].iter().copied().map(to_location).collect();

    let cells = Array2::from_shape_simple_fn((side, side), || {
        Cell::new(weights.pick(rng), Rotation::from_quarter_turns(rng.random_range(0..4)))
    });

    let mut board = Board {
        cells,
        dims: (size, size),
        sources: source_locations,
        targets: target_locations,
    };

    for location in board.sources.clone() {
        board.cells[location.as_index()] = Cell::new(PieceKind::Source, Rotation::Deg0);
    }
    for location in board.targets.clone() {
        board.cells[location.as_index()] = Cell::new(PieceKind::Target, Rotation::Deg0);
    }

    board
}

/// Generate a `size × size` board with `sources` sources and `targets` targets.
///
/// Boards that already power every target are thrown away and drawn again, so a board with targets always needs at least one move.
/// With [`GeneratorConfig::require_solvable`] set, boards the rotation solver rejects are thrown away as well.
///
/// Fails with a [`ConfigurationError`] if `size < 2`, if the endpoints would leave no cell free, or if every weight is zero.
/// When [`GeneratorConfig::max_attempts`] boards in a row are thrown away it fails with
/// [`NoSolvableLayout`](ConfigurationError::NoSolvableLayout) if solvability was required,
/// [`NoUnsolvedLayout`](ConfigurationError::NoUnsolvedLayout) otherwise.
pub fn generate<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    size: usize,
    sources: usize,
    targets: usize,
    weights: &PieceWeights,
    rng: &mut R,
) -> Result<Board, ConfigurationError> {
    validate(size, sources, targets, weights)?;
    let size = NonZero::new(size).ok_or(ConfigurationError::GridTooSmall { size })?;

    let attempts = config.sanitized().max_attempts;
    for attempt in 1..=attempts {
        let board = generate_once(size, sources, targets, weights, rng);

        // with no targets there is nothing to solve, and every board is "solved"
        if targets > 0 && board.is_solved() {
            debug!(attempt, "discarding board that starts out solved");
            continue;
        }
        if config.require_solvable && board.solution().is_err() {
            debug!(attempt, "discarding unsolvable board");
            continue;
        }

        debug!(attempt, "generated board");
        return Ok(board);
    }

    warn!(attempts, size = size.get(), sources, targets, require_solvable = config.require_solvable, "gave up generating a board");
    if config.require_solvable {
        Err(ConfigurationError::NoSolvableLayout { attempts })
    } else {
        Err(ConfigurationError::NoUnsolvedLayout { attempts })
    }
}

/// [`generate`] with the size, endpoint counts and weights of `params`.
pub fn generate_level<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    params: &LevelParams,
    rng: &mut R,
) -> Result<Board, ConfigurationError> {
    generate(config, params.size, params.sources, params.targets, &params.weights, rng)
}
