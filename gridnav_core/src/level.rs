// A level: several independently built navigation blocks.
//
// Each `NavBlock` pairs a world-space bounding box with the graph sampled
// inside it. Blocks are keyed by a `u32` id chosen by the host and kept in a
// `BTreeMap`, so iteration, `Display`, and the encoding are in id order.
// Queries dispatch to the block containing the start point; paths never
// cross from one block's graph into another's.
//
// Level encoding (bincode 1): a u64 block count, then per block its id
// (u32), its bounds (6 x f64), and the block's graph in the graph codec's
// layout.

use crate::config::PathConfig;
use crate::error::{BuildError, CodecError};
use crate::graph::AdjacencyGraph;
use crate::navigator::Navigator;
use crate::oracle::GeometryOracle;
use crate::sampler::TerrainSampler;
use crate::types::WorldBox;
use glam::DVec3;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::debug;

/// One bounded region and its graph.
#[derive(Clone, Debug, PartialEq)]
pub struct NavBlock {
    pub bounds: WorldBox,
    pub graph: Arc<AdjacencyGraph>,
}

impl NavBlock {
    /// A block with an empty graph, waiting to be sampled.
    pub fn new(bounds: WorldBox) -> Self {
        Self::with_graph(bounds, AdjacencyGraph::new())
    }

    pub fn with_graph(bounds: WorldBox, graph: AdjacencyGraph) -> Self {
        Self {
            bounds,
            graph: Arc::new(graph),
        }
    }
}

/// All navigation blocks of a level.
#[derive(Clone, Debug, Default)]
pub struct NavLevel {
    blocks: BTreeMap<u32, NavBlock>,
    config: PathConfig,
}

impl NavLevel {
    pub fn new(config: PathConfig) -> Self {
        Self {
            blocks: BTreeMap::new(),
            config,
        }
    }

    pub fn has_block(&self, id: u32) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn block(&self, id: u32) -> Option<&NavBlock> {
        self.blocks.get(&id)
    }

    /// Insert or replace a block, returning the one it replaced.
    pub fn add_block(&mut self, id: u32, block: NavBlock) -> Option<NavBlock> {
        self.blocks.insert(id, block)
    }

    /// Replace the graph of an existing block. Returns `false` if there is
    /// no block `id`.
    pub fn update_block(&mut self, id: u32, graph: AdjacencyGraph) -> bool {
        match self.blocks.get_mut(&id) {
            Some(block) => {
                block.graph = Arc::new(graph);
                true
            }
            None => false,
        }
    }

    pub fn remove_block(&mut self, id: u32) -> Option<NavBlock> {
        self.blocks.remove(&id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks in ascending id order.
    pub fn blocks(&self) -> impl Iterator<Item = (u32, &NavBlock)> {
        self.blocks.iter().map(|(&id, block)| (id, block))
    }

    /// Union of every block's bounds; `None` for an empty level.
    pub fn bounds(&self) -> Option<WorldBox> {
        self.blocks
            .values()
            .map(|block| block.bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    /// The lowest-id block whose bounds contain `point`.
    pub fn block_containing(&self, point: DVec3) -> Option<(u32, &NavBlock)> {
        self.blocks().find(|(_, block)| block.bounds.contains(point))
    }

    /// Resample every block against `oracle`. All blocks are sampled before
    /// any is replaced, so a failure leaves the level untouched.
    pub fn rebuild_all<O>(&mut self, sampler: &TerrainSampler, oracle: &O) -> Result<(), BuildError>
    where
        O: GeometryOracle + ?Sized,
    {
        let rebuilt = self
            .blocks
            .iter()
            .map(|(&id, block)| -> Result<_, BuildError> {
                Ok((id, sampler.sample_region(oracle, &block.bounds)?))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        for (id, graph) in rebuilt {
            self.update_block(id, graph);
        }
        Ok(())
    }

    /// Path query in the block containing `from`. Empty if no block
    /// contains it.
    pub fn find_path(&self, from: DVec3, to: DVec3) -> Vec<DVec3> {
        let Some((id, block)) = self.block_containing(from) else {
            debug!(?from, "path query starts outside every block");
            return Vec::new();
        };
        debug!(block = id, ?from, ?to, "dispatching path query");
        Navigator::new(Arc::clone(&block.graph), self.config.clone()).find_path(from, to)
    }

    // -----------------------------------------------------------------------
    // Binary codec
    // -----------------------------------------------------------------------

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        bincode::serialize_into(&mut *writer, &(self.blocks.len() as u64))?;
        for (&id, block) in &self.blocks {
            bincode::serialize_into(&mut *writer, &(id, block.bounds))?;
            block.graph.write_to(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Decode a level written by `write_to`, querying with `config`.
    pub fn read_from<R: Read>(reader: &mut R, config: PathConfig) -> Result<Self, CodecError> {
        let count: u64 = bincode::deserialize_from(&mut *reader)?;
        let mut level = NavLevel::new(config);
        for _ in 0..count {
            let (id, bounds): (u32, WorldBox) = bincode::deserialize_from(&mut *reader)?;
            let graph = AdjacencyGraph::read_from(reader)?;
            match level.blocks.entry(id) {
                Entry::Occupied(_) => return Err(CodecError::DuplicateBlock(id)),
                Entry::Vacant(slot) => {
                    slot.insert(NavBlock::with_graph(bounds, graph));
                }
            }
        }
        Ok(level)
    }
}

impl fmt::Display for NavLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, block) in self.blocks() {
            writeln!(
                f,
                "block {id}: {} ({} nodes, {} edges)",
                block.bounds,
                block.graph.node_count(),
                block.graph.edge_count()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneOracle, Solid};

    fn bounds(min_x: f64, max_x: f64) -> WorldBox {
        WorldBox::new(DVec3::new(min_x, -10.0, -50.0), DVec3::new(max_x, 10.0, 200.0))
    }

    /// Two flat floors at different heights, each covering one block.
    fn scene() -> SceneOracle {
        SceneOracle::new()
            .with(Solid::cuboid(
                DVec3::new(-50.0, -50.0, -100.0),
                DVec3::new(250.0, 50.0, 0.0),
            ))
            .with(Solid::cuboid(
                DVec3::new(950.0, -50.0, -100.0),
                DVec3::new(1250.0, 50.0, 50.0),
            ))
    }

    fn built_level() -> NavLevel {
        let mut level = NavLevel::new(PathConfig::default());
        level.add_block(7, NavBlock::new(bounds(-10.0, 210.0)));
        level.add_block(3, NavBlock::new(bounds(990.0, 1210.0)));
        level
            .rebuild_all(&TerrainSampler::default(), &scene())
            .unwrap();
        level
    }

    #[test]
    fn blocks_add_update_remove() {
        let mut level = NavLevel::new(PathConfig::default());
        assert!(level.add_block(1, NavBlock::new(bounds(0.0, 100.0))).is_none());
        assert!(level.has_block(1));
        assert!(level.add_block(1, NavBlock::new(bounds(0.0, 200.0))).is_some());
        assert_eq!(level.block_count(), 1);

        let mut graph = AdjacencyGraph::new();
        graph.add_node(crate::types::GridIndex::new(0, 0, 0), 0.0);
        assert!(level.update_block(1, graph));
        assert_eq!(level.block(1).unwrap().graph.node_count(), 1);
        assert!(!level.update_block(2, AdjacencyGraph::new()));

        assert!(level.remove_block(1).is_some());
        assert!(level.remove_block(1).is_none());
        assert!(level.bounds().is_none());
    }

    #[test]
    fn bounds_are_the_union() {
        let level = built_level();
        let union = level.bounds().unwrap();
        assert_eq!(union.min, DVec3::new(-10.0, -10.0, -50.0));
        assert_eq!(union.max, DVec3::new(1210.0, 10.0, 200.0));
    }

    #[test]
    fn rebuild_all_samples_each_block() {
        let level = built_level();
        assert_eq!(level.block(7).unwrap().graph.node_count(), 3);
        assert_eq!(level.block(3).unwrap().graph.node_count(), 3);
    }

    #[test]
    fn queries_dispatch_by_start_point() {
        let level = built_level();
        assert_eq!(level.block_containing(DVec3::new(1000.0, 0.0, 50.0)).map(|(id, _)| id), Some(3));

        let path = level.find_path(DVec3::ZERO, DVec3::new(200.0, 0.0, 0.0));
        assert_eq!(path, vec![DVec3::ZERO, DVec3::new(200.0, 0.0, 0.0)]);

        let path = level.find_path(DVec3::new(1000.0, 0.0, 50.0), DVec3::new(1200.0, 0.0, 50.0));
        assert_eq!(
            path,
            vec![DVec3::new(1000.0, 0.0, 50.0), DVec3::new(1200.0, 0.0, 50.0)]
        );

        // Goal in the other block: not in the start block's graph.
        assert!(level.find_path(DVec3::ZERO, DVec3::new(1000.0, 0.0, 50.0)).is_empty());
        // Start outside every block.
        assert!(level.find_path(DVec3::new(500.0, 0.0, 0.0), DVec3::ZERO).is_empty());
    }

    #[test]
    fn codec_roundtrip() {
        let level = built_level();
        let mut bytes = Vec::new();
        level.write_to(&mut bytes).unwrap();
        let restored = NavLevel::read_from(&mut bytes.as_slice(), PathConfig::default()).unwrap();
        assert_eq!(restored.block_count(), 2);
        for (id, block) in level.blocks() {
            assert_eq!(restored.block(id), Some(block));
        }
        let mut again = Vec::new();
        restored.write_to(&mut again).unwrap();
        assert_eq!(again, bytes);
    }

    #[test]
    fn display_lists_blocks_in_id_order() {
        let text = built_level().to_string();
        let first = text.find("block 3:").unwrap();
        let second = text.find("block 7:").unwrap();
        assert!(first < second);
        assert!(text.contains("3 nodes"));
    }
}
