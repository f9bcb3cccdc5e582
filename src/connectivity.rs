//! Which cells carry power: a link graph over mutually open neighbours, searched breadth first from every source.

use std::collections::HashSet;

use petgraph::graphmap::UnGraphMap;
use petgraph::visit::{Bfs, VisitMap};

use crate::board::Board;
use crate::location::Location;
use crate::shape::Direction;

/// Which cells of a board are linked and powered, for one snapshot of its rotations.
///
/// This is an overlay keyed by location and is never stored on the cells themselves; rotating anything makes it stale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connectivity {
    powered: HashSet<Location>,
    connected: HashSet<Location>,
    targets_powered: usize,
    targets_total: usize,
}

impl Connectivity {
    /// Every target is powered.
    ///
    /// A board with no targets is solved no matter what, even one without sources.
    pub fn is_solved(&self) -> bool {
        self.targets_powered == self.targets_total
    }

    /// Power reaches `location` from some source.
    pub fn is_powered(&self, location: Location) -> bool {
        self.powered.contains(&location)
    }

    /// `location` shares at least one open edge with a neighbour, whether or not power flows through it.
    pub fn is_connected(&self, location: Location) -> bool {
        self.connected.contains(&location)
    }

    /// Every location power reaches, sources included.
    pub fn powered(&self) -> &HashSet<Location> {
        &self.powered
    }

    /// `(powered, total)` target counts.
    pub fn target_progress(&self) -> (usize, usize) {
        (self.targets_powered, self.targets_total)
    }
}

/// Build the graph whose edges join adjacent cells that are each open towards the other.
///
/// Every location on the board is a node, linked or not. The edge weight is the direction from the lower indexed location.
pub(crate) fn link_graph(board: &Board) -> UnGraphMap<Location, Direction> {
    let mut graph = UnGraphMap::with_capacity(
        board.width() * board.height(),
        // "horizontal" plus "vertical" neighbour pairs
        (board.width() - 1) * board.height() + (board.height() - 1) * board.width(),
    );

    for (location, cell) in board.cells() {
        graph.add_node(location);

        for direction in Direction::FORWARD_VARIANTS {
            let Some(neighbor_location) = direction.step_within(location, board.dims()) else {
                continue;
            };
            let Some(neighbor) = board.cell(neighbor_location) else {
                continue;
            };

            // an edge needs to be open on both sides, a half-open pair carries nothing
            if cell.is_open(*direction) && neighbor.is_open(direction.invert()) {
                graph.add_edge(location, neighbor_location, *direction);
            }
        }
    }

    graph
}

/// Compute which cells are powered by searching breadth first from all sources at once.
///
/// This is a pure function of the kinds and rotations on `board` and runs in time linear in its cell count.
pub fn evaluate(board: &Board) -> Connectivity {
    let graph = link_graph(board);
    let mut powered = HashSet::with_capacity(graph.node_count());

    if let Some((first, rest)) = board.sources().split_first() {
        let mut bfs = Bfs::new(&graph, *first);
        for source in rest {
            if bfs.discovered.visit(*source) {
                bfs.stack.push_back(*source);
            }
        }

        while let Some(location) = bfs.next(&graph) {
            powered.insert(location);
        }
    }

    let connected = graph.nodes()
        .filter(|node| graph.neighbors(*node).next().is_some())
        .collect();

    let targets_powered = board.targets().iter().filter(|target| powered.contains(*target)).count();

    Connectivity {
        powered,
        connected,
        targets_powered,
        targets_total: board.targets().len(),
    }
}
