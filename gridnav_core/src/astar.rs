// Generic A* search over any graph that can answer two questions: does a
// location exist, and which locations are reachable from it.
//
// The open set is a `BinaryHeap` in min-heap order (reversed `Ord`, same
// pattern as an event queue), keyed by `g + h` with insertion order as the
// tie-breaker so equal-priority expansions are reproducible. Search nodes live
// in an arena `Vec` and refer to their predecessor by index; the whole arena
// drops when the search returns. Best-known costs are kept in an `FxHashMap`
// keyed by location.
//
// The step cost between two adjacent locations is the same function as the
// heuristic, so the heuristic must be admissible for that metric (never
// overestimate) for the returned path to be optimal. For the grid,
// `planar_distance` ignores the layer axis and is admissible.
//
// See also: `graph.rs` which implements `SearchGraph` for `AdjacencyGraph`,
// `navigator.rs` which runs the search and post-processes its result.

use crate::types::GridIndex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

/// The capability A* needs from a graph.
pub trait SearchGraph {
    type Location: Copy + Eq + Hash;

    fn has_location(&self, location: &Self::Location) -> bool;

    /// Locations one traversable step away from `location`. Empty if
    /// `location` is absent.
    fn reachable_from(&self, location: &Self::Location) -> SmallVec<[Self::Location; 8]>;
}

/// Admissible grid heuristic: horizontal Euclidean distance in grid units.
pub fn planar_distance(a: &GridIndex, b: &GridIndex) -> f64 {
    a.planar_distance(*b)
}

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult<L> {
    /// Locations from start to goal, inclusive.
    pub locations: Vec<L>,
    /// Sum of step costs along `locations`.
    pub total_cost: f64,
}

/// One arena slot: a location reached with cost `g` via `prev`.
struct SearchNode<L> {
    location: L,
    prev: Option<usize>,
    g: f64,
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    f_score: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score, then earliest insertion.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A* search parameterized by its heuristic (also used as the step cost).
#[derive(Clone, Copy)]
pub struct AStar<H> {
    heuristic: H,
}

impl<H> AStar<H> {
    pub fn new(heuristic: H) -> Self {
        Self { heuristic }
    }

    /// Path from `start` to `goal`, or an empty `Vec` if there is none.
    pub fn navigate<G>(&self, graph: &G, start: G::Location, goal: G::Location) -> Vec<G::Location>
    where
        G: SearchGraph,
        H: Fn(&G::Location, &G::Location) -> f64,
    {
        self.search(graph, start, goal)
            .map(|result| result.locations)
            .unwrap_or_default()
    }

    /// Full search. Returns `None` if either endpoint is missing from the
    /// graph or the open set empties before reaching `goal`.
    pub fn search<G>(
        &self,
        graph: &G,
        start: G::Location,
        goal: G::Location,
    ) -> Option<PathResult<G::Location>>
    where
        G: SearchGraph,
        H: Fn(&G::Location, &G::Location) -> f64,
    {
        if !graph.has_location(&start) || !graph.has_location(&goal) {
            return None;
        }
        let explored = self.explore(graph, start, goal);
        let reached = explored.reached?;
        Some(reconstruct_path(&explored.arena, reached))
    }

    /// Like `search`, but an unreachable or missing `goal` yields the path to
    /// the expanded location the heuristic rates closest to it. Returns
    /// `None` only if `start` is missing.
    pub fn search_closest<G>(
        &self,
        graph: &G,
        start: G::Location,
        goal: G::Location,
    ) -> Option<PathResult<G::Location>>
    where
        G: SearchGraph,
        H: Fn(&G::Location, &G::Location) -> f64,
    {
        if !graph.has_location(&start) {
            return None;
        }
        let explored = self.explore(graph, start, goal);
        let last = explored.reached.unwrap_or(explored.closest);
        Some(reconstruct_path(&explored.arena, last))
    }

    fn explore<G>(&self, graph: &G, start: G::Location, goal: G::Location) -> Exploration<G::Location>
    where
        G: SearchGraph,
        H: Fn(&G::Location, &G::Location) -> f64,
    {
        let mut arena: Vec<SearchNode<G::Location>> = vec![SearchNode {
            location: start,
            prev: None,
            g: 0.0,
        }];
        let mut best: FxHashMap<G::Location, f64> = FxHashMap::default();
        best.insert(start, 0.0);

        let mut closest = 0;
        let mut closest_h = (self.heuristic)(&start, &goal);

        let mut seq = 0u64;
        let mut open = BinaryHeap::new();
        open.push(OpenEntry {
            f_score: closest_h,
            seq,
            node: 0,
        });

        while let Some(entry) = open.pop() {
            let current = entry.node;
            let location = arena[current].location;
            let g = arena[current].g;

            if location == goal {
                return Exploration {
                    arena,
                    reached: Some(current),
                    closest: current,
                };
            }

            // A cheaper route to this location was queued after this one.
            if best.get(&location).is_some_and(|&known| g > known) {
                continue;
            }

            let h = (self.heuristic)(&location, &goal);
            if h < closest_h {
                closest = current;
                closest_h = h;
            }

            for neighbor in graph.reachable_from(&location) {
                let tentative_g = g + (self.heuristic)(&location, &neighbor);
                if best.get(&neighbor).is_some_and(|&known| tentative_g >= known) {
                    continue;
                }
                best.insert(neighbor, tentative_g);
                arena.push(SearchNode {
                    location: neighbor,
                    prev: Some(current),
                    g: tentative_g,
                });
                seq += 1;
                open.push(OpenEntry {
                    f_score: tentative_g + (self.heuristic)(&neighbor, &goal),
                    seq,
                    node: arena.len() - 1,
                });
            }
        }

        Exploration {
            arena,
            reached: None,
            closest,
        }
    }
}

/// Arena and outcome of one search.
struct Exploration<L> {
    arena: Vec<SearchNode<L>>,
    reached: Option<usize>,
    /// Expanded node with the smallest heuristic distance to the goal.
    closest: usize,
}

/// Walk predecessor links back from `last` and reverse.
fn reconstruct_path<L: Copy>(arena: &[SearchNode<L>], last: usize) -> PathResult<L> {
    let total_cost = arena[last].g;
    let mut locations = Vec::new();
    let mut cursor = Some(last);
    while let Some(i) = cursor {
        locations.push(arena[i].location);
        cursor = arena[i].prev;
    }
    locations.reverse();
    PathResult {
        locations,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    /// An 8-connected `size x size` grid with some cells blocked.
    struct TestGrid {
        size: i32,
        blocked: Vec<(i32, i32)>,
    }

    impl TestGrid {
        fn open(size: i32) -> Self {
            Self {
                size,
                blocked: Vec::new(),
            }
        }

        fn cells(&self) -> Vec<GridIndex> {
            let mut cells = Vec::new();
            for x in 0..self.size {
                for y in 0..self.size {
                    let cell = GridIndex::new(x, y, 0);
                    if self.has_location(&cell) {
                        cells.push(cell);
                    }
                }
            }
            cells
        }
    }

    impl SearchGraph for TestGrid {
        type Location = GridIndex;

        fn has_location(&self, l: &GridIndex) -> bool {
            l.x >= 0
                && l.y >= 0
                && l.x < self.size
                && l.y < self.size
                && !self.blocked.contains(&(l.x, l.y))
        }

        fn reachable_from(&self, l: &GridIndex) -> SmallVec<[GridIndex; 8]> {
            if !self.has_location(l) {
                return smallvec![];
            }
            crate::types::NEIGHBOR_OFFSETS
                .iter()
                .map(|&(dx, dy)| GridIndex::new(l.x + dx, l.y + dy, 0))
                .filter(|n| self.has_location(n))
                .collect()
        }
    }

    /// All-pairs shortest distances by exhaustive relaxation (Floyd-Warshall).
    fn brute_force_cost(grid: &TestGrid, from: GridIndex, to: GridIndex) -> Option<f64> {
        let cells = grid.cells();
        let n = cells.len();
        let pos = |c: GridIndex| cells.iter().position(|&x| x == c);
        let mut dist = vec![vec![f64::INFINITY; n]; n];
        for (i, cell) in cells.iter().enumerate() {
            dist[i][i] = 0.0;
            for neighbor in grid.reachable_from(cell) {
                let j = pos(neighbor)?;
                dist[i][j] = planar_distance(cell, &neighbor);
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    let through = dist[i][k] + dist[k][j];
                    if through < dist[i][j] {
                        dist[i][j] = through;
                    }
                }
            }
        }
        let d = dist[pos(from)?][pos(to)?];
        d.is_finite().then_some(d)
    }

    fn astar() -> AStar<fn(&GridIndex, &GridIndex) -> f64> {
        AStar::new(planar_distance)
    }

    #[test]
    fn trivial_path_is_single_location() {
        let grid = TestGrid::open(3);
        let a = GridIndex::new(1, 1, 0);
        let result = astar().search(&grid, a, a).unwrap();
        assert_eq!(result.locations, vec![a]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn missing_endpoints_return_empty() {
        let grid = TestGrid::open(3);
        let inside = GridIndex::new(0, 0, 0);
        let outside = GridIndex::new(7, 7, 0);
        assert!(astar().navigate(&grid, inside, outside).is_empty());
        assert!(astar().navigate(&grid, outside, inside).is_empty());
    }

    #[test]
    fn corner_to_corner_is_all_diagonal() {
        for size in 2..=8 {
            let grid = TestGrid::open(size);
            let start = GridIndex::new(0, 0, 0);
            let goal = GridIndex::new(size - 1, size - 1, 0);
            let result = astar().search(&grid, start, goal).unwrap();
            assert_eq!(result.locations.len(), size as usize);
            let expected = f64::from(size - 1) * std::f64::consts::SQRT_2;
            assert!((result.total_cost - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn mixed_moves_match_analytic_optimum() {
        // 5 across, 2 up: 2 diagonals + 3 straights.
        let grid = TestGrid::open(6);
        let result = astar()
            .search(&grid, GridIndex::new(0, 0, 0), GridIndex::new(5, 2, 0))
            .unwrap();
        let expected = 2.0 * std::f64::consts::SQRT_2 + 3.0;
        assert!((result.total_cost - expected).abs() < 1e-9);
        assert_eq!(result.locations.len(), 6);
    }

    #[test]
    fn cost_never_exceeds_brute_force_on_small_grids() {
        let grids = [
            TestGrid::open(4),
            TestGrid {
                size: 5,
                blocked: vec![(1, 0), (1, 1), (1, 2), (1, 3), (3, 4), (3, 3), (3, 2), (3, 1)],
            },
            TestGrid {
                size: 6,
                blocked: vec![(2, 2), (2, 3), (3, 2), (3, 3), (0, 4), (1, 4)],
            },
        ];
        for grid in &grids {
            let cells = grid.cells();
            for &from in &cells {
                for &to in &cells {
                    let expected = brute_force_cost(grid, from, to);
                    let found = astar().search(grid, from, to).map(|r| r.total_cost);
                    match (found, expected) {
                        (Some(f), Some(e)) => assert!(f <= e + 1e-9, "{from} -> {to}: {f} > {e}"),
                        (None, None) => {}
                        other => panic!("{from} -> {to}: mismatch {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let grid = TestGrid {
            size: 4,
            blocked: vec![(2, 0), (2, 1), (2, 2), (2, 3)],
        };
        let path = astar().navigate(&grid, GridIndex::new(0, 0, 0), GridIndex::new(3, 3, 0));
        assert!(path.is_empty());
    }

    #[test]
    fn path_steps_are_adjacent() {
        let grid = TestGrid {
            size: 6,
            blocked: vec![(2, 1), (2, 2), (2, 3), (2, 4)],
        };
        let path = astar().navigate(&grid, GridIndex::new(0, 3, 0), GridIndex::new(5, 3, 0));
        assert_eq!(path.first(), Some(&GridIndex::new(0, 3, 0)));
        assert_eq!(path.last(), Some(&GridIndex::new(5, 3, 0)));
        for pair in path.windows(2) {
            let d = pair[0].delta_to(pair[1]);
            assert!(d[0].abs() <= 1 && d[1].abs() <= 1 && (d[0], d[1]) != (0, 0));
        }
    }

    #[test]
    fn search_is_deterministic() {
        let grid = TestGrid::open(6);
        let a = GridIndex::new(0, 2, 0);
        let b = GridIndex::new(5, 2, 0);
        let r1 = astar().navigate(&grid, a, b);
        let r2 = astar().navigate(&grid, a, b);
        assert_eq!(r1, r2);
    }

    #[test]
    fn search_closest_stops_next_to_the_wall() {
        let grid = TestGrid {
            size: 4,
            blocked: vec![(2, 0), (2, 1), (2, 2), (2, 3)],
        };
        let start = GridIndex::new(0, 0, 0);
        let goal = GridIndex::new(3, 1, 0);
        assert!(astar().search(&grid, start, goal).is_none());
        let partial = astar().search_closest(&grid, start, goal).unwrap();
        assert_eq!(partial.locations.first(), Some(&start));
        assert_eq!(partial.locations.last(), Some(&GridIndex::new(1, 1, 0)));
    }

    #[test]
    fn search_closest_reaches_reachable_goal() {
        let grid = TestGrid::open(4);
        let start = GridIndex::new(0, 0, 0);
        let goal = GridIndex::new(3, 3, 0);
        let full = astar().search(&grid, start, goal).unwrap();
        assert_eq!(astar().search_closest(&grid, start, goal), Some(full));
        assert!(astar().search_closest(&grid, GridIndex::new(9, 9, 0), goal).is_none());
    }

    #[test]
    fn closure_heuristics_are_accepted() {
        let grid = TestGrid::open(3);
        let zero = AStar::new(|_: &GridIndex, _: &GridIndex| 0.0);
        let path = zero.navigate(&grid, GridIndex::new(0, 0, 0), GridIndex::new(2, 0, 0));
        // Zero step cost: any path is optimal, but it must still connect.
        assert_eq!(path.first(), Some(&GridIndex::new(0, 0, 0)));
        assert_eq!(path.last(), Some(&GridIndex::new(2, 0, 0)));
    }
}
