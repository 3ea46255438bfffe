// World-space path queries over one published adjacency graph.
//
// `Navigator` is the query surface: it snaps world positions to grid cells,
// runs A* with the planar heuristic, refines the raw cell path (see
// `postprocess.rs`), and returns world points. It holds an `Arc` of an
// immutable graph, so any number of navigators can query the same published
// graph from different threads while a builder prepares the next one.
//
// Query points resolve to the cell at their rounded column and layer. If the
// column has nodes but none at that layer, the node with the nearest layer
// wins as long as it is within `resolve_layer_tolerance` layers, so a query
// made at a slightly wrong height still finds the floor but a query on
// another storey does not.
//
// Nothing here fails loudly: missing cells and unreachable goals produce
// empty results, logged at debug level.
//
// See also: `astar.rs`, `postprocess.rs`, `level.rs` which dispatches
// queries across blocks, `builder.rs` which publishes graphs.

use crate::astar::{AStar, planar_distance};
use crate::config::PathConfig;
use crate::graph::AdjacencyGraph;
use crate::postprocess::{cell_position, refine_path};
use crate::types::{GridIndex, world_to_grid};
use glam::DVec3;
use std::sync::Arc;
use tracing::debug;

type Heuristic = fn(&GridIndex, &GridIndex) -> f64;

/// A path split at the point where a travel budget runs out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BudgetSplit {
    /// The start, every vertex within budget, and (if the budget ends inside
    /// a segment) the interpolated crossover point.
    pub reachable: Vec<DVec3>,
    /// Every vertex beyond the budget.
    pub remainder: Vec<DVec3>,
}

/// Result of a query that may accept a path ending short of the goal.
#[derive(Clone, Debug, PartialEq)]
pub enum PathOutcome {
    /// The path ends at the goal cell.
    Complete(Vec<DVec3>),
    /// The goal is unreachable; the path ends at the reachable cell closest
    /// to it.
    Partial(Vec<DVec3>),
    /// The start cell does not exist.
    NotFound,
}

impl PathOutcome {
    /// Points of the path; empty for `NotFound`.
    pub fn points(&self) -> &[DVec3] {
        match self {
            PathOutcome::Complete(points) | PathOutcome::Partial(points) => points,
            PathOutcome::NotFound => &[],
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PathOutcome::Complete(_))
    }
}

/// Path queries against one adjacency graph.
#[derive(Clone)]
pub struct Navigator {
    graph: Arc<AdjacencyGraph>,
    config: PathConfig,
    search: AStar<Heuristic>,
}

impl Navigator {
    pub fn new(graph: Arc<AdjacencyGraph>, config: PathConfig) -> Self {
        Self {
            graph,
            config,
            search: AStar::new(planar_distance),
        }
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// The node a world position refers to: its own cell, or the nearest
    /// node in its column within `resolve_layer_tolerance` layers.
    pub fn resolve(&self, world: DVec3) -> Option<GridIndex> {
        let index = world_to_grid(world);
        if self.graph.has_node(index) {
            return Some(index);
        }
        self.graph
            .column_nodes(index.x, index.y)
            .map(|node| node.index)
            .min_by_key(|candidate| (candidate.z - index.z).abs())
            .filter(|candidate| (candidate.z - index.z).abs() <= self.config.resolve_layer_tolerance)
    }

    /// Raw A* path between two cells. Empty if either is missing or the
    /// goal is unreachable.
    pub fn find_cell_path(&self, start: GridIndex, goal: GridIndex) -> Vec<GridIndex> {
        self.search.navigate(self.graph.as_ref(), start, goal)
    }

    /// Refined world-space path from `from` to `to`. Start and end closer
    /// than `same_point_tolerance` give just `[to]`. Empty if either end has
    /// no node or the goal is unreachable.
    pub fn find_path(&self, from: DVec3, to: DVec3) -> Vec<DVec3> {
        if from.distance(to) < self.config.same_point_tolerance {
            return vec![to];
        }
        let (Some(start), Some(goal)) = (self.resolve(from), self.resolve(to)) else {
            debug!(?from, ?to, "path query endpoint has no node");
            return Vec::new();
        };
        let cells = self.find_cell_path(start, goal);
        if cells.is_empty() {
            debug!(%start, %goal, "goal unreachable");
            return Vec::new();
        }
        refine_path(&self.graph, &cells, &self.config)
    }

    /// `find_path`, split where the cumulative length first exceeds `budget`.
    pub fn find_path_within(&self, from: DVec3, to: DVec3, budget: f64) -> BudgetSplit {
        split_by_distance(&self.find_path(from, to), budget)
    }

    /// Like `find_path`, but an unreachable goal yields a `Partial` path to
    /// the reachable cell closest to it instead of nothing.
    pub fn find_path_to(&self, from: DVec3, to: DVec3) -> PathOutcome {
        if from.distance(to) < self.config.same_point_tolerance {
            return PathOutcome::Complete(vec![to]);
        }
        let Some(start) = self.resolve(from) else {
            debug!(?from, "path query start has no node");
            return PathOutcome::NotFound;
        };
        let goal = self.resolve(to).unwrap_or_else(|| world_to_grid(to));
        let Some(result) = self.search.search_closest(self.graph.as_ref(), start, goal) else {
            return PathOutcome::NotFound;
        };

        let points = refine_path(&self.graph, &result.locations, &self.config);
        let target = cell_position(&self.graph, goal);
        match points.last() {
            Some(last) if last.distance(target) <= self.config.partial_path_tolerance => {
                PathOutcome::Complete(points)
            }
            Some(_) => {
                debug!(%start, %goal, "returning partial path");
                PathOutcome::Partial(points)
            }
            None => PathOutcome::NotFound,
        }
    }
}

/// Split `path` where its cumulative length first exceeds `budget`.
///
/// The start is always reachable. A segment that straddles the budget
/// contributes an interpolated point at exactly `budget` to `reachable` and
/// its far end to `remainder`. Dropping that one interpolated point and
/// concatenating the two halves gives back `path`.
pub fn split_by_distance(path: &[DVec3], budget: f64) -> BudgetSplit {
    let mut split = BudgetSplit::default();
    let Some(&first) = path.first() else {
        return split;
    };
    let budget = budget.max(0.0);
    split.reachable.push(first);

    let mut travelled = 0.0;
    for pair in path.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let length = p0.distance(p1);
        if travelled + length <= budget {
            split.reachable.push(p1);
        } else if budget <= travelled {
            split.remainder.push(p1);
        } else {
            let t = (budget - travelled) / length;
            split.reachable.push(p0.lerp(p1, t));
            split.remainder.push(p1);
        }
        travelled += length;
    }
    split
}
