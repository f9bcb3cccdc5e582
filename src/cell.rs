use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use strum::VariantArray;

use crate::shape::{Direction, Rotation};

/// What sits in a cell, which decides where its exits are.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, VariantArray)]
pub enum PieceKind {
    /// Nothing; never carries power and never turns.
    #[default]
    Empty,
    /// Two opposite exits.
    Straight,
    /// Two adjacent exits.
    Corner,
    /// All four exits.
    Cross,
    /// Where power comes from. Open on every side and never rotates.
    Source,
    /// Where power must arrive. Open on every side and never rotates.
    Target,
    /// No exits at all, but can still be turned.
    Blocker,
}

impl PieceKind {
    /// Exits of this kind at rotation 0.
    fn base_exits(&self) -> &'static [Direction] {
        match self {
            Self::Straight => &[Direction::Up, Direction::Down],
            Self::Corner => &[Direction::Up, Direction::Right],
            Self::Cross | Self::Source | Self::Target => Direction::VARIANTS,
            Self::Blocker | Self::Empty => &[],
        }
    }

    /// Endpoints and empty cells are fixed in place; everything else turns.
    pub fn is_rotatable(&self) -> bool {
        matches!(self, Self::Straight | Self::Corner | Self::Cross | Self::Blocker)
    }

    /// Sources and targets.
    pub fn is_endpoint(&self) -> bool {
        matches!(self, Self::Source | Self::Target)
    }
}

/// One board position: a piece and the way it is turned.
///
/// Whether a cell is connected or powered is not stored here; see [`Connectivity`](crate::Connectivity).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cell {
    /// What piece this is.
    pub kind: PieceKind,
    /// How far the piece is turned clockwise from its base orientation.
    pub rotation: Rotation,
}

impl Cell {
    pub fn new(kind: PieceKind, rotation: Rotation) -> Self {
        Self { kind, rotation }
    }

    /// The sides through which power can leave or enter this cell.
    pub fn exits(&self) -> HashSet<Direction> {
        self.exits_at(self.rotation)
    }

    /// The exits this cell would have if it were turned to `rotation`.
    pub fn exits_at(&self, rotation: Rotation) -> HashSet<Direction> {
        self.kind.base_exits()
            .iter()
            .map(|dir| dir.rotated(rotation))
            .collect()
    }

    /// Whether power can cross `side` of this cell as it is turned now.
    pub fn is_open(&self, side: Direction) -> bool {
        self.kind.base_exits().iter().any(|dir| dir.rotated(self.rotation) == side)
    }

    /// Rotations giving pairwise distinct exit sets, in clockwise order from 0.
    ///
    /// A straight piece only has two, a corner four; endpoints, crosses and blockers look the same every way round.
    pub fn distinct_orientations(&self) -> Vec<Rotation> {
        Rotation::VARIANTS.iter()
            .copied()
            .unique_by(|rotation| self.exits_at(*rotation).into_iter().sorted().collect_vec())
            .collect_vec()
    }

    fn glyph(&self) -> char {
        match self.kind {
            PieceKind::Empty => '.',
            PieceKind::Source => 'S',
            PieceKind::Target => 'T',
            PieceKind::Blocker => '#',
            PieceKind::Cross => '┼',
            PieceKind::Straight => match self.rotation {
                Rotation::Deg0 | Rotation::Deg180 => '│',
                Rotation::Deg90 | Rotation::Deg270 => '─',
            },
            PieceKind::Corner => match self.rotation {
                Rotation::Deg0 => '└',
                Rotation::Deg90 => '┌',
                Rotation::Deg180 => '┐',
                Rotation::Deg270 => '┘',
            },
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
