use std::fmt::{Display, Formatter};

use ndarray::Array2;
use tracing::trace;

use crate::cell::Cell;
use crate::connectivity::{self, Connectivity};
use crate::error::InvalidOperation;
use crate::location::{Dimension, Location};
use crate::shape::Rotation;
use crate::solver::{RotationSolver, Solution, SolverFailure};

/// A rectangular grid of [`Cell`]s together with where its sources and targets are.
///
/// Boards should be built using a [`BoardBuilder`](crate::builder::BoardBuilder) or the [`generator`](crate::generator).
/// Every location in [`sources`](Self::sources) holds a [`Source`](crate::PieceKind::Source), every one in [`targets`](Self::targets) a [`Target`](crate::PieceKind::Target), and no other cell holds either.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub(crate) cells: Array2<Cell>,
    // width, height
    pub(crate) dims: (Dimension, Dimension),
    pub(crate) sources: Vec<Location>,
    pub(crate) targets: Vec<Location>,
}

impl Board {
    /// `(width, height)`.
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.dims.0.get()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.dims.1.get()
    }

    /// The cell at `location`, or `None` off the board.
    pub fn cell(&self, location: Location) -> Option<&Cell> {
        self.cells.get(location.as_index())
    }

    /// Where the sources are, in placement order.
    pub fn sources(&self) -> &[Location] {
        &self.sources
    }

    /// Where the targets are, in placement order.
    pub fn targets(&self) -> &[Location] {
        &self.targets
    }

    /// Every cell with its location, row by row from the top left.
    pub fn cells(&self) -> impl Iterator<Item = (Location, &Cell)> + '_ {
        self.cells.indexed_iter().map(|(index, cell)| (Location::from(index), cell))
    }

    /// Turn the piece at `location` a quarter turn clockwise and return its new rotation.
    ///
    /// Sources, targets and empty cells are immutable; asking to rotate one, or a location off the board, changes nothing.
    /// Any [`Connectivity`] computed before this call is stale afterwards.
    pub fn rotate(&mut self, location: Location) -> Result<Rotation, InvalidOperation> {
        let cell = self.cells
            .get_mut(location.as_index())
            .ok_or(InvalidOperation::OutOfBounds { location })?;

        if !cell.kind.is_rotatable() {
            return Err(InvalidOperation::Immutable { location, kind: cell.kind });
        }

        cell.rotation = cell.rotation.next();
        trace!(x = location.0, y = location.1, rotation = %cell.rotation, "rotated cell");
        Ok(cell.rotation)
    }

    /// Work out which cells are powered right now. See [`connectivity::evaluate`].
    pub fn connectivity(&self) -> Connectivity {
        connectivity::evaluate(self)
    }

    /// Whether every target is powered.
    pub fn is_solved(&self) -> bool {
        self.connectivity().is_solved()
    }

    /// Find rotations for the turnable pieces under which this board is solved, leaving the board as it is.
    pub fn solution(&self) -> Result<Solution, SolverFailure> {
        RotationSolver::from(self).solve()
    }

    /// Solves this board, deferring to a [`RotationSolver`] and mutating and returning `self` accordingly.
    pub fn solve(mut self) -> Result<Self, SolverFailure> {
        let solution = self.solution()?;
        self.apply(&solution);
        Ok(self)
    }

    /// Set every cell named in `solution` to the rotation it calls for.
    ///
    /// Locations that are off the board or hold immutable pieces are skipped.
    pub fn apply(&mut self, solution: &Solution) {
        for (location, rotation) in solution.rotations() {
            if let Some(cell) = self.cells.get_mut(location.as_index()) {
                if cell.kind.is_rotatable() {
                    cell.rotation = rotation;
                }
            }
        }
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
