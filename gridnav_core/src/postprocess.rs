// Path post-processing: raw A* cells to a world-space polyline.
//
// Two passes run over the raw path:
//
// - Slope ends. A step along a `SlopeBottom` or `SlopeTop` edge gets an extra
//   point at the horizontal midpoint of the step, at the lower (bottom) or
//   upper (top) endpoint height. The straight segment between the two cells
//   would otherwise cut through the lip of the incline.
// - Collinear filtering. A sliding reference line runs from the last kept
//   point to the point after the candidate; the candidate is kept only if its
//   squared distance to that line reaches `collinear_epsilon`. The first and
//   last points always survive.
//
// Cell positions use the node's sampled height, so the polyline follows the
// real floor rather than layer boundaries.

use crate::config::PathConfig;
use crate::graph::AdjacencyGraph;
use crate::types::{EdgeType, GridIndex, column_to_world, grid_to_world};
use glam::DVec3;

/// World position of a cell: its column center at the sampled floor height,
/// or at the layer floor if the node is absent.
pub fn cell_position(graph: &AdjacencyGraph, index: GridIndex) -> DVec3 {
    match graph.node(index) {
        Some(node) => {
            column_to_world(f64::from(index.x), f64::from(index.y)).extend(node.height)
        }
        None => grid_to_world(index),
    }
}

/// Convert a raw path to world points, adding a midpoint on every step that
/// crosses the end of a slope.
pub fn insert_slope_points(graph: &AdjacencyGraph, path: &[GridIndex]) -> Vec<DVec3> {
    let mut points = Vec::with_capacity(path.len() * 2);
    let Some(&first) = path.first() else {
        return points;
    };
    points.push(cell_position(graph, first));

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let pa = cell_position(graph, a);
        let pb = cell_position(graph, b);
        let edge_type = graph.edge_between(a, b).map(|e| e.edge_type);
        let lip_height = match edge_type {
            Some(EdgeType::SlopeBottom) => Some(pa.z.min(pb.z)),
            Some(EdgeType::SlopeTop) => Some(pa.z.max(pb.z)),
            _ => None,
        };
        if let Some(z) = lip_height {
            points.push(((pa + pb) * 0.5).truncate().extend(z));
        }
        points.push(pb);
    }
    points
}

/// Drop interior points that lie on the line between their kept
/// predecessor and their successor.
pub fn remove_collinear(points: &[DVec3], epsilon: f64) -> Vec<DVec3> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept = Vec::with_capacity(points.len());
    let mut line_start = points[0];
    kept.push(line_start);
    for window in points.windows(2).skip(1) {
        let (candidate, line_end) = (window[0], window[1]);
        if distance_squared_to_line(candidate, line_start, line_end) >= epsilon {
            kept.push(candidate);
            line_start = candidate;
        }
    }
    kept.push(points[points.len() - 1]);
    kept
}

/// Both passes.
pub fn refine_path(graph: &AdjacencyGraph, path: &[GridIndex], config: &PathConfig) -> Vec<DVec3> {
    remove_collinear(&insert_slope_points(graph, path), config.collinear_epsilon)
}

/// Squared distance from `point` to the infinite line through `a` and `b`.
/// Degenerates to the squared distance to `a` when `a == b`.
fn distance_squared_to_line(point: DVec3, a: DVec3, b: DVec3) -> f64 {
    let direction = b - a;
    let length_squared = direction.length_squared();
    if length_squared == 0.0 {
        return point.distance_squared(a);
    }
    let t = (point - a).dot(direction) / length_squared;
    point.distance_squared(a + direction * t)
}
