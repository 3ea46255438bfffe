// Terrain sampler: turns geometry probes into an adjacency graph.
//
// For every grid column inside a region the sampler casts a floor probe from
// the region's top to its bottom. A hit becomes a node at the hit's layer if
// the column also has `min_clearance_height` of headroom; an overhead hit only
// counts as a ceiling if its normal is far enough from horizontal, so walls
// grazed by the upward probe are ignored. Each node then probes its 8
// neighbor columns and classifies one directed edge per neighbor, from the
// node's own side:
//
//   1. Obstruction: a foot-level trace between the two floor points, both
//      lifted to the higher of the two plus `obstruction_lift`, and a second
//      trace `head_height_lift` above that. Either hit means no edge.
//   2. Height delta: `Direct` when level, a tentative `Slope` when climbable
//      and axis-aligned, otherwise `Cliff`.
//   3. Step check: a tentative slope whose near and far sub-grid probes both
//      sit flush with their own endpoints is a flat-to-flat step, so `Cliff`.
//   4. Slope ends: if the midpoint height is not the mean of the endpoints
//      the edge joins a plateau to an incline. The plateau side (within
//      tolerance of the midpoint) and the lower side select `SlopeBottom` or
//      `SlopeTop`.
//
// Neighbor floor probes skip the clearance check, so a node can point at a
// column that never became a node. Those edges dangle and are filtered at
// query time.
//
// Columns are independent, so they are sampled in parallel with rayon and
// merged in column order; the result does not depend on thread scheduling.
//
// **Critical constraint**: a confirmed slope whose midpoint floor probe
// misses means the geometry between two connected cells has a gap. The build
// fails with `BuildError::MidpointGap` instead of guessing an edge type.
//
// See also: `oracle.rs` for the probe contract, `graph.rs` for the output,
// `builder.rs` which runs sampling on a background thread.

use crate::config::SamplerConfig;
use crate::error::BuildError;
use crate::graph::AdjacencyGraph;
use crate::oracle::GeometryOracle;
use crate::types::{
    EdgeType, GridBounds, GridIndex, NEIGHBOR_OFFSETS, WorldBox, column_to_world,
    layer_for_height, sub_grid_to_world,
};
use glam::{DVec2, DVec3};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, trace};

/// A floor hit at one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorSample {
    pub index: GridIndex,
    /// World-space hit point; `location.z` is the continuous height.
    pub location: DVec3,
}

impl FloorSample {
    pub fn height(&self) -> f64 {
        self.location.z
    }
}

/// Everything one column contributes to the graph.
struct ColumnSample {
    node: FloorSample,
    edges: Vec<(FloorSample, EdgeType)>,
}

/// Samples regions of an oracle's geometry into adjacency graphs.
#[derive(Clone, Debug, Default)]
pub struct TerrainSampler {
    config: SamplerConfig,
}

impl TerrainSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Build a fresh graph for every column whose sample point lies inside
    /// `region`.
    pub fn sample_region<O>(&self, oracle: &O, region: &WorldBox) -> Result<AdjacencyGraph, BuildError>
    where
        O: GeometryOracle + ?Sized,
    {
        let started = Instant::now();
        let columns = GridBounds::inside(region).columns();
        info!(%region, columns = columns.len(), "sampling region");

        let samples = columns
            .par_iter()
            .map(|&(x, y)| self.sample_column(oracle, region, x, y))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut graph = AdjacencyGraph::new();
        for sample in samples.into_iter().flatten() {
            let node = sample.node;
            if !graph.has_node(node.index) {
                graph.add_node(node.index, node.height());
                trace!(index = %node.index, height = node.height(), "node added");
            }
            for (neighbor, edge_type) in sample.edges {
                graph.create_edge(
                    node.index,
                    node.height(),
                    neighbor.index,
                    neighbor.height(),
                    edge_type,
                );
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "region sampled"
        );
        Ok(graph)
    }

    /// The standable floor at column `(x, y)`: the topmost surface in the
    /// region's height range with enough headroom above it.
    pub fn standable_floor<O>(&self, oracle: &O, region: &WorldBox, x: i32, y: i32) -> Option<FloorSample>
    where
        O: GeometryOracle + ?Sized,
    {
        let floor = self.floor_at(oracle, region, x, y)?;
        let cfg = &self.config;
        let ceiling = oracle.vertical_probe(
            floor.location.x,
            floor.location.y,
            floor.location.z + cfg.clearance_probe_offset,
            floor.location.z + cfg.min_clearance_height,
        );
        match ceiling {
            Some(hit) if hit.normal.z.abs() > cfg.ceiling_normal_min_z => None,
            _ => Some(floor),
        }
    }

    /// Classify the directed edge `node -> neighbor`. `None` means the way is
    /// obstructed and no edge should exist.
    pub fn classify_edge<O>(
        &self,
        oracle: &O,
        region: &WorldBox,
        node: &FloorSample,
        neighbor: &FloorSample,
    ) -> Result<Option<EdgeType>, BuildError>
    where
        O: GeometryOracle + ?Sized,
    {
        if self.is_obstructed(oracle, node, neighbor) {
            return Ok(None);
        }

        let cfg = &self.config;
        let [dx, dy, _] = node.index.delta_to(neighbor.index);
        let diagonal = dx != 0 && dy != 0;
        let delta = (node.height() - neighbor.height()).abs();

        let edge_type = if delta <= cfg.direct_max_delta {
            EdgeType::Direct
        } else if delta <= cfg.slope_max_delta && !diagonal {
            EdgeType::Slope
        } else if node.height() != neighbor.height() {
            EdgeType::Cliff
        } else {
            EdgeType::None
        };

        if edge_type != EdgeType::Slope {
            return Ok(Some(edge_type));
        }
        if self.is_flat_step(oracle, region, node, neighbor, (dx, dy)) {
            return Ok(Some(EdgeType::Cliff));
        }
        self.classify_slope_end(oracle, region, node, neighbor).map(Some)
    }

    // -----------------------------------------------------------------------
    // Per-column work
    // -----------------------------------------------------------------------

    fn sample_column<O>(
        &self,
        oracle: &O,
        region: &WorldBox,
        x: i32,
        y: i32,
    ) -> Result<Option<ColumnSample>, BuildError>
    where
        O: GeometryOracle + ?Sized,
    {
        let Some(node) = self.standable_floor(oracle, region, x, y) else {
            return Ok(None);
        };

        let mut edges = Vec::with_capacity(NEIGHBOR_OFFSETS.len());
        for (ox, oy) in NEIGHBOR_OFFSETS {
            let Some(neighbor) = self.floor_at(oracle, region, x + ox, y + oy) else {
                continue;
            };
            if !region.contains(neighbor.location) {
                continue;
            }
            if let Some(edge_type) = self.classify_edge(oracle, region, &node, &neighbor)? {
                edges.push((neighbor, edge_type));
            }
        }
        Ok(Some(ColumnSample { node, edges }))
    }

    /// Topmost floor hit at column `(x, y)`, without the clearance check.
    fn floor_at<O>(&self, oracle: &O, region: &WorldBox, x: i32, y: i32) -> Option<FloorSample>
    where
        O: GeometryOracle + ?Sized,
    {
        let location = floor_probe(oracle, region, column_to_world(f64::from(x), f64::from(y)))?;
        Some(FloorSample {
            index: GridIndex::new(x, y, layer_for_height(location.z)),
            location,
        })
    }

    fn is_obstructed<O>(&self, oracle: &O, node: &FloorSample, neighbor: &FloorSample) -> bool
    where
        O: GeometryOracle + ?Sized,
    {
        let cfg = &self.config;
        let z = node.height().max(neighbor.height()) + cfg.obstruction_lift;
        let mut start = node.location;
        let mut end = neighbor.location;
        start.z = z;
        end.z = z;
        if oracle.segment_probe(start, end).is_some() {
            return true;
        }
        start.z += cfg.head_height_lift;
        end.z += cfg.head_height_lift;
        oracle.segment_probe(start, end).is_some()
    }

    /// True when the near and far sub-grid floors deviate equally and only
    /// slightly from their own endpoints: two flat surfaces joined by a step.
    /// Missing sub-grid floors leave the slope as it is.
    fn is_flat_step<O>(
        &self,
        oracle: &O,
        region: &WorldBox,
        node: &FloorSample,
        neighbor: &FloorSample,
        direction: (i32, i32),
    ) -> bool
    where
        O: GeometryOracle + ?Sized,
    {
        let cfg = &self.config;
        let (x, y) = (node.index.x, node.index.y);
        let near = floor_probe(
            oracle,
            region,
            sub_grid_to_world(x, y, direction, cfg.sub_grid_near_alpha),
        );
        let far = floor_probe(
            oracle,
            region,
            sub_grid_to_world(x, y, direction, cfg.sub_grid_far_alpha),
        );
        let (Some(near), Some(far)) = (near, far) else {
            return false;
        };

        let near_deviation = (near.z - node.height()).abs();
        let far_deviation = (far.z - neighbor.height()).abs();
        (near_deviation - far_deviation).abs() < cfg.step_equal_tolerance
            && near_deviation + far_deviation < cfg.step_flat_tolerance
    }

    /// Refine a confirmed slope into `SlopeBottom` / `SlopeTop` when one
    /// endpoint is on a plateau.
    fn classify_slope_end<O>(
        &self,
        oracle: &O,
        region: &WorldBox,
        node: &FloorSample,
        neighbor: &FloorSample,
    ) -> Result<EdgeType, BuildError>
    where
        O: GeometryOracle + ?Sized,
    {
        let cfg = &self.config;
        let midpoint = (node.location.truncate() + neighbor.location.truncate()) / 2.0;
        let Some(mid) = floor_probe(oracle, region, midpoint) else {
            return Err(BuildError::MidpointGap {
                from: node.index,
                to: neighbor.index,
            });
        };

        let average = (node.height() + neighbor.height()) / 2.0;
        if (mid.z - average).abs() < cfg.midpoint_tolerance {
            return Ok(EdgeType::Slope);
        }

        let node_is_flat = (node.height() - mid.z).abs() < cfg.midpoint_tolerance;
        let node_is_lower = node.height() < neighbor.height();
        Ok(if node_is_flat == node_is_lower {
            EdgeType::SlopeBottom
        } else {
            EdgeType::SlopeTop
        })
    }
}

/// Downward probe through the region's full height at a horizontal position.
fn floor_probe<O>(oracle: &O, region: &WorldBox, at: DVec2) -> Option<DVec3>
where
    O: GeometryOracle + ?Sized,
{
    oracle
        .vertical_probe(at.x, at.y, region.max.z, region.min.z)
        .map(|hit| hit.location)
}
