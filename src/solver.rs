use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::identity;

use itertools::Itertools;
use strum::VariantArray;
use tracing::debug;
use unordered_pair::UnorderedPair;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::board::Board;
use crate::cell::Cell;
use crate::location::Location;
use crate::logic::{exactly_one, implies_any};
use crate::shape::{Direction, Rotation};

/// Reasons a [`RotationSolver`] may fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolverFailure {
    /// The SAT solver detected a logical inconsistency, i.e. no way of turning the pieces powers every target.
    Inconsistent,
    /// The SAT solver reported success but the model did not pick an orientation for some cell.
    /// This should probably never happen.
    NoModel,
}

/// Rotations for the turnable pieces of a board under which every target is powered.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Solution {
    rotations: BTreeMap<Location, Rotation>,
}

impl Solution {
    /// The rotation this solution gives the cell at `location`, if it has a choice.
    pub fn rotation_at(&self, location: Location) -> Option<Rotation> {
        self.rotations.get(&location).copied()
    }

    /// Every cell with a choice of orientation and the rotation chosen for it.
    pub fn rotations(&self) -> impl Iterator<Item = (Location, Rotation)> + '_ {
        self.rotations.iter().map(|(location, rotation)| (*location, *rotation))
    }

    /// Clockwise quarter turns that bring `cell` to an orientation with the same exits as `target`.
    fn turns_needed(cell: &Cell, target: Rotation) -> usize {
        let wanted = cell.exits_at(target);
        (0..Rotation::VARIANTS.len())
            .find(|turns| cell.exits_at(Rotation::from_quarter_turns(cell.rotation.quarter_turns() + turns)) == wanted)
            .unwrap_or(0)
    }

    /// How many single rotations it takes to turn `board` into this solution.
    pub fn moves_from(&self, board: &Board) -> usize {
        self.rotations()
            .filter_map(|(location, rotation)| board.cell(location).map(|cell| Self::turns_needed(cell, rotation)))
            .sum()
    }

    /// The first cell, in row-major order, that still needs turning to reach this solution.
    pub fn next_move(&self, board: &Board) -> Option<Location> {
        self.rotations
            .iter()
            .map(|(location, rotation)| (*location, *rotation))
            .sorted_by_key(|(location, _)| (location.1, location.0))
            .find(|(location, rotation)| {
                board.cell(*location).is_some_and(|cell| Self::turns_needed(cell, *rotation) > 0)
            })
            .map(|(location, _)| location)
    }
}

/// Decides whether the turnable pieces of a board can be rotated so that power reaches every target.
/// Use [`Self::solve`] to attempt to find such rotations.
///
/// # Logical setup
/// Each cell with more than one distinct orientation gets one variable per orientation, exactly one of which holds.
/// Each pair of adjacent cells which could ever face each other with open edges gets a "link" variable;
/// a link implies both cells are in an orientation open towards the other.
///
/// Reachability is layered. `reach[t][c]` says power has arrived at cell `c` within `t` steps.
/// Sources are reached at step 0 and nothing else is.
/// `c` reached at step `t` implies it was already reached at `t - 1`, or some linked neighbour was.
/// A simple path never visits more cells than there are, so every target must be reached by the final layer.
pub struct RotationSolver<'a> {
    board: &'a Board,
    orientations: HashMap<Location, Vec<(Rotation, Var)>>,
    links: HashMap<UnorderedPair<Location>, Var>,
    carriers: Vec<Location>,
    var_count: usize,
}

impl<'a> From<&'a Board> for RotationSolver<'a> {
    fn from(board: &'a Board) -> Self {
        let mut solver = Self {
            board,
            orientations: HashMap::new(),
            links: HashMap::new(),
            carriers: Vec::new(),
            var_count: 0,
        };

        for (location, cell) in board.cells() {
            if !cell.kind.is_rotatable() {
                continue;
            }
            let distinct = cell.distinct_orientations();
            if distinct.len() > 1 {
                let vars = distinct.into_iter().map(|rotation| (rotation, solver.fresh())).collect_vec();
                solver.orientations.insert(location, vars);
            }
        }

        for (location, _) in board.cells() {
            for direction in Direction::FORWARD_VARIANTS {
                let Some(neighbor) = direction.step_within(location, board.dims()) else {
                    continue;
                };
                if solver.could_open(location, *direction) && solver.could_open(neighbor, direction.invert()) {
                    let var = solver.fresh();
                    solver.links.insert(UnorderedPair(location, neighbor), var);
                }
            }
        }

        let linked: HashSet<Location> = solver.links.keys().flat_map(|pair| [pair.0, pair.1]).collect();
        solver.carriers = board.cells()
            .map(|(location, _)| location)
            .filter(|location| linked.contains(location) || board.sources().contains(location))
            .collect();

        solver
    }
}

impl RotationSolver<'_> {
    fn fresh(&mut self) -> Var {
        let var = Var::from_index(self.var_count);
        self.var_count += 1;
        var
    }

    /// Orientation literals under which the cell at `location` is open on `side`.
    ///
    /// `None` means the cell cannot turn, so whether it is open does not depend on any variable.
    fn open_literals(&self, location: Location, side: Direction) -> Option<Vec<Lit>> {
        let cell = self.board.cell(location)?;
        self.orientations.get(&location).map(|options| {
            options.iter()
                .filter(|(rotation, _)| cell.exits_at(*rotation).contains(&side))
                .map(|(_, var)| var.positive())
                .collect_vec()
        })
    }

    fn could_open(&self, location: Location, side: Direction) -> bool {
        match self.open_literals(location, side) {
            Some(literals) => !literals.is_empty(),
            None => self.board.cell(location).is_some_and(|cell| cell.is_open(side)),
        }
    }

    fn neighbors_of(&self, location: Location) -> Vec<(Location, Var)> {
        Direction::VARIANTS.iter()
            .filter_map(|direction| direction.step_within(location, self.board.dims()))
            .filter_map(|neighbor| self.links.get(&UnorderedPair(location, neighbor)).map(|var| (neighbor, *var)))
            .collect_vec()
    }

    /// Attempt to find rotations that power every target, returning [`Ok`] with a [`Solution`] or [`Err`] with a [`SolverFailure`] reason.
    ///
    /// The board itself is not changed. A board without targets is solved as it stands.
    pub fn solve(mut self) -> Result<Solution, SolverFailure> {
        if self.board.targets().is_empty() {
            return Ok(self.current_rotations());
        }
        if self.board.sources().is_empty() {
            return Err(SolverFailure::Inconsistent);
        }
        if self.board.targets().iter().any(|target| !self.carriers.contains(target)) {
            // a target with no possible link can never be reached
            return Err(SolverFailure::Inconsistent);
        }

        let mut formula = CnfFormula::new();

        for options in self.orientations.values() {
            for clause in exactly_one(options.iter().map(|(_, var)| var.positive()).collect_vec()) {
                formula.add_clause(&clause);
            }
        }

        for (pair, link) in &self.links {
            for (from, to) in [(pair.0, pair.1), (pair.1, pair.0)] {
                let Some(side) = Direction::between(from, to) else {
                    continue;
                };
                if let Some(literals) = self.open_literals(from, side) {
                    formula.add_clause(&implies_any(link.positive(), literals));
                }
            }
        }

        let steps = self.carriers.len() - 1;
        let carriers = self.carriers.clone();
        let mut reach: Vec<HashMap<Location, Var>> = Vec::with_capacity(steps + 1);

        let first_layer: HashMap<Location, Var> = carriers.iter().map(|location| (*location, self.fresh())).collect();
        for (location, var) in &first_layer {
            formula.add_clause(&[var.lit(self.board.sources().contains(location))]);
        }
        reach.push(first_layer);

        for step in 1..=steps {
            let layer: HashMap<Location, Var> = carriers.iter().map(|location| (*location, self.fresh())).collect();
            let previous = &reach[step - 1];

            for (location, var) in &layer {
                let mut support = vec![previous[location].positive()];

                for (neighbor, link) in self.neighbors_of(*location) {
                    // "via" holds when power arrives from this neighbour over this link
                    let via = self.fresh();
                    formula.add_clause(&[via.negative(), previous[&neighbor].positive()]);
                    formula.add_clause(&[via.negative(), link.positive()]);
                    support.push(via.positive());
                }

                formula.add_clause(&implies_any(var.positive(), support));
            }

            reach.push(layer);
        }

        let last = &reach[steps];
        for target in self.board.targets() {
            formula.add_clause(&[last[target].positive()]);
        }

        debug!(
            vars = self.var_count,
            clauses = formula.len(),
            carriers = carriers.len(),
            "solving rotation assignment"
        );

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        if !solver.solve().is_ok_and(identity) {
            return Err(SolverFailure::Inconsistent);
        }
        let model: HashSet<Lit> = solver.model().ok_or(SolverFailure::NoModel)?.into_iter().collect();

        let mut rotations = self.current_rotations().rotations;
        for (location, options) in &self.orientations {
            let chosen = options.iter()
                .find(|(_, var)| model.contains(&var.positive()))
                .map(|(rotation, _)| *rotation)
                .ok_or(SolverFailure::NoModel)?;
            rotations.insert(*location, chosen);
        }

        Ok(Solution { rotations })
    }

    /// The board's own rotations for every cell that has a choice of orientation.
    fn current_rotations(&self) -> Solution {
        Solution {
            rotations: self.orientations
                .keys()
                .filter_map(|location| self.board.cell(*location).map(|cell| (*location, cell.rotation)))
                .collect(),
        }
    }
}
