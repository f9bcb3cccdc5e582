use std::fmt::{Display, Formatter};

use strum::VariantArray;

use crate::location::{Dimension, Location};

/// A side of a square cell, and the step taken to reach the neighbour on that side.
///
/// Variants are declared in clockwise order starting from the top.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Towards higher columns.
    Right,
    /// Towards higher rows.
    Down,
    /// Towards column 0.
    Left,
}

impl Direction {
    /// Directions which step to a location indexed higher than the origin in row-major order.
    ///
    /// Walking only these from every cell visits each adjacent pair exactly once.
    pub const FORWARD_VARIANTS: &'static [Self] = &[Self::Right, Self::Down];

    /// Attempt the step from `location` in this direction and return the resultant [`Location`].
    ///
    /// Steps off the top or left edge wrap to a huge coordinate, which no board contains.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Right => location.offset_by((1, 0)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
        }
    }

    /// Like [`Self::attempt_from`], but only yields locations on a board of `dims`.
    pub fn step_within(&self, location: Location, dims: (Dimension, Dimension)) -> Option<Location> {
        Some(self.attempt_from(location)).filter(|next| next.within(dims))
    }

    /// The opposite side.
    pub fn invert(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// This side after the cell has been turned by `rotation`.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let index = Self::VARIANTS.iter().position(|dir| dir == self).unwrap_or(0);
        Self::VARIANTS[(index + rotation.quarter_turns()) % Self::VARIANTS.len()]
    }

    /// Determine the direction from `a` to `b`, if they are orthogonally adjacent.
    pub fn between(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|dir| dir.attempt_from(a) == b)
    }
}

/// Clockwise orientation of a piece, in quarter turns.
#[derive(Copy, Clone, Default, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Rotation {
    /// The base orientation.
    #[default]
    Deg0,
    /// One quarter turn clockwise.
    Deg90,
    /// Half a turn.
    Deg180,
    /// Three quarter turns clockwise.
    Deg270,
}

impl Rotation {
    /// The next orientation a quarter turn clockwise; 270 wraps to 0.
    pub fn next(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Clockwise quarter turns from 0.
    pub fn quarter_turns(self) -> usize {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// The rotation `turns` clockwise quarter turns from 0, wrapping every four.
    pub fn from_quarter_turns(turns: usize) -> Self {
        Self::VARIANTS[turns % Self::VARIANTS.len()]
    }

    /// Clockwise angle in degrees.
    pub fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }
}

impl Display for Rotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
