use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array2;

use crate::board::Board;
use crate::cell::{Cell, PieceKind};
use crate::location::{Dimension, Location};
use crate::shape::Rotation;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A piece was placed outside the bounds specified by `dims` on a builder.
    FeatureOutOfBounds,
    /// A source or target was added where a source or target already is.
    Overlapping,
    /// An ordinary piece was placed on top of a source or target.
    EndpointOverwritten,
    /// Text handed to [`BoardBuilder::from_glyphs`] was empty, ragged, or used a character no piece draws as.
    Unparseable,
}

/// A builder for explicit board layouts.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a builder is invalid, every further call does nothing and [`build`](Self::build) reports why.
#[derive(Clone, Debug)]
pub struct BoardBuilder {
    // width, height
    dims: (Dimension, Dimension),
    cells: Array2<Cell>,
    sources: Vec<Location>,
    targets: Vec<Location>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl BoardBuilder {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(x, y)` order.
    /// Every cell starts out [`Empty`](PieceKind::Empty).
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_shape_simple_fn((dims.1.get(), dims.0.get()), Cell::default),
            sources: Default::default(),
            targets: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    /// [`Self::with_dims`] for a `size × size` board.
    pub fn square(size: Dimension) -> Self {
        Self::with_dims((size, size))
    }

    /// Read a layout drawn the way [`Board`] displays itself, one line per row.
    ///
    /// Surrounding whitespace on each line is ignored, as are blank lines.
    pub fn from_glyphs(text: &str) -> Self {
        let rows = text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect_vec())
            .collect_vec();

        let width = rows.first().map_or(0, Vec::len);
        let dims = (NonZero::new(width), NonZero::new(rows.len()));
        let (Some(w), Some(h)) = dims else {
            return Self::unparseable();
        };
        if rows.iter().any(|row| row.len() != width) {
            return Self::unparseable();
        }

        let mut builder = Self::with_dims((w, h));
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.iter().enumerate() {
                let Some(cell) = parse_glyph(*glyph) else {
                    return Self::unparseable();
                };
                builder.place(Location(x, y), cell.kind, cell.rotation);
            }
        }

        builder
    }

    fn unparseable() -> Self {
        let mut builder = Self::square(NonZero::<usize>::MIN);
        builder.invalid_reasons.push(BuilderInvalidReason::Unparseable);
        builder
    }

    fn check_bounds(&mut self, location: Location) -> bool {
        if location.within(self.dims) {
            true
        } else {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            false
        }
    }

    fn is_endpoint(&self, location: Location) -> bool {
        self.sources.contains(&location) || self.targets.contains(&location)
    }

    fn add_endpoint(&mut self, location: Location, kind: PieceKind) -> &mut Self {
        if !self.invalid_reasons.is_empty() || !self.check_bounds(location) {
            return self;
        }

        if self.is_endpoint(location) {
            self.invalid_reasons.push(BuilderInvalidReason::Overlapping);
            return self;
        }

        self.cells[location.as_index()] = Cell::new(kind, Rotation::Deg0);
        match kind {
            PieceKind::Source => self.sources.push(location),
            _ => self.targets.push(location),
        }

        self
    }

    /// Add a source of power at `location`.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) or
    /// [`Overlapping`](BuilderInvalidReason::Overlapping) invalid state.
    pub fn add_source(&mut self, location: Location) -> &mut Self {
        self.add_endpoint(location, PieceKind::Source)
    }

    /// Add a target which power must reach, with the same failure modes as [`Self::add_source`].
    pub fn add_target(&mut self, location: Location) -> &mut Self {
        self.add_endpoint(location, PieceKind::Target)
    }

    /// Put a piece at `location`. Sources and targets are routed to [`Self::add_source`] and [`Self::add_target`].
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds,
    /// or an [`EndpointOverwritten`](BuilderInvalidReason::EndpointOverwritten) one if a source or target is already there.
    pub fn place(&mut self, location: Location, kind: PieceKind, rotation: Rotation) -> &mut Self {
        match kind {
            PieceKind::Source => return self.add_source(location),
            PieceKind::Target => return self.add_target(location),
            _ => {}
        }

        if !self.invalid_reasons.is_empty() || !self.check_bounds(location) {
            return self;
        }

        if self.is_endpoint(location) {
            self.invalid_reasons.push(BuilderInvalidReason::EndpointOverwritten);
            return self;
        }

        self.cells[location.as_index()] = Cell::new(kind, rotation);
        self
    }

    /// Set every cell that is not a source or target to the same piece.
    pub fn fill(&mut self, kind: PieceKind, rotation: Rotation) -> &mut Self {
        if !self.invalid_reasons.is_empty() || kind.is_endpoint() {
            return self;
        }

        self.cells
            .iter_mut()
            .filter(|cell| !cell.kind.is_endpoint())
            .for_each(|cell| *cell = Cell::new(kind, rotation));

        self
    }

    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Board`].
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Board, &Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        Ok(Board {
            cells: self.cells.clone(),
            dims: self.dims,
            sources: self.sources.clone(),
            targets: self.targets.clone(),
        })
    }
}

fn parse_glyph(glyph: char) -> Option<Cell> {
    let (kind, rotation) = match glyph {
        '.' => (PieceKind::Empty, Rotation::Deg0),
        'S' => (PieceKind::Source, Rotation::Deg0),
        'T' => (PieceKind::Target, Rotation::Deg0),
        '#' => (PieceKind::Blocker, Rotation::Deg0),
        '┼' => (PieceKind::Cross, Rotation::Deg0),
        '│' => (PieceKind::Straight, Rotation::Deg0),
        '─' => (PieceKind::Straight, Rotation::Deg90),
        '└' => (PieceKind::Corner, Rotation::Deg0),
        '┌' => (PieceKind::Corner, Rotation::Deg90),
        '┐' => (PieceKind::Corner, Rotation::Deg180),
        '┘' => (PieceKind::Corner, Rotation::Deg270),
        _ => return None,
    };

    Some(Cell::new(kind, rotation))
}
