// Grid adjacency graph: the navigable cells of one region and the typed,
// directed edges between them.
//
// The graph is the sole owner of its `Node`s, keyed by `GridIndex`. Each node
// owns its outbound `Edge`s; there is no separate edge store. An edge's source
// always exists (`create_edge` creates it on demand) but its target may not:
// sampling can fail asymmetrically at region borders, so every lookup through
// an edge is checked, and `reachable_neighbors` drops dangling edges.
//
// Storage is a `BTreeMap` so iteration, `Display` output, and the binary
// encoding are in ascending index order. Encoding the same graph twice gives
// identical bytes.
//
// Binary layout (bincode 1, little-endian, fixed-width integers): a u64 node
// count, then per node `x, y, z: i32`, `height: f64`, a u64 edge count, and
// per edge the source index (3 x i32), target index (3 x i32), a one-byte
// `EdgeType` tag, and the direction (3 x i32).
//
// See also: `sampler.rs` which populates the graph, `astar.rs` for the
// `SearchGraph` capability implemented here, `postprocess.rs` which reads
// edge types along a found path.

use crate::astar::SearchGraph;
use crate::error::CodecError;
use crate::types::{EdgeType, GridIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, trace};

/// A directed connection from one cell to an adjacent cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: GridIndex,
    pub to: GridIndex,
    pub edge_type: EdgeType,
    /// `to - from`, component-wise.
    pub direction: [i32; 3],
}

/// One navigable cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: GridIndex,
    /// Continuous floor height sampled at this cell, in world units.
    pub height: f64,
    pub out_edges: Vec<Edge>,
}

impl Node {
    pub fn new(index: GridIndex, height: f64) -> Self {
        Self {
            index,
            height,
            out_edges: Vec::new(),
        }
    }
}

/// All nodes of one region, keyed by grid index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdjacencyGraph {
    nodes: BTreeMap<GridIndex, Node>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, index: GridIndex) -> bool {
        self.nodes.contains_key(&index)
    }

    /// Insert a node with no edges.
    ///
    /// Replaces any existing node at `index`, discarding its edges. Callers
    /// that must keep edges check `has_node` first.
    pub fn add_node(&mut self, index: GridIndex, height: f64) {
        self.nodes.insert(index, Node::new(index, height));
    }

    /// Look up a node. `None` is routine: cells outside the sampled region
    /// or without standable ground have no node.
    pub fn node(&self, index: GridIndex) -> Option<&Node> {
        let node = self.nodes.get(&index)?;
        debug_assert_eq!(node.index, index, "node stored under a foreign index");
        Some(node)
    }

    /// Nodes stacked in column `(x, y)`, lowest layer first.
    pub fn column_nodes(&self, x: i32, y: i32) -> impl Iterator<Item = &Node> {
        self.nodes
            .range(GridIndex::new(x, y, i32::MIN)..=GridIndex::new(x, y, i32::MAX))
            .map(|(_, node)| node)
    }

    /// Append a directed edge `from -> to`, creating `from` (at
    /// `from_height`) if it does not exist yet. `to` is never created; a
    /// bidirectional link needs a second call from the other side.
    pub fn create_edge(
        &mut self,
        from: GridIndex,
        from_height: f64,
        to: GridIndex,
        to_height: f64,
        edge_type: EdgeType,
    ) {
        let node = self
            .nodes
            .entry(from)
            .or_insert_with(|| Node::new(from, from_height));
        trace!(%from, %to, from_height, to_height, %edge_type, "edge created");
        node.out_edges.push(Edge {
            from,
            to,
            edge_type,
            direction: from.delta_to(to),
        });
    }

    /// True iff the edge's type is walkable and both endpoints exist.
    pub fn is_edge_traversable(&self, edge: &Edge) -> bool {
        edge.edge_type.is_traversable() && self.has_node(edge.from) && self.has_node(edge.to)
    }

    /// Targets of the traversable out-edges of the node at `index`. Empty if
    /// the node does not exist.
    pub fn reachable_neighbors(&self, index: GridIndex) -> SmallVec<[GridIndex; 8]> {
        let Some(node) = self.node(index) else {
            return SmallVec::new();
        };
        let mut result = SmallVec::new();
        for edge in &node.out_edges {
            if !edge.edge_type.is_traversable() {
                continue;
            }
            if !self.has_node(edge.to) {
                debug!(from = %edge.from, to = %edge.to, "skipping dangling edge");
                continue;
            }
            result.push(edge.to);
        }
        result
    }

    /// The first out-edge of `from` that targets `to`, if any.
    pub fn edge_between(&self, from: GridIndex, to: GridIndex) -> Option<&Edge> {
        self.node(from)?.out_edges.iter().find(|e| e.to == to)
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.out_edges.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in ascending index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Owned copies of every node, in ascending index order.
    pub fn node_list(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    /// Every edge of every node, flattened, in ascending source order.
    pub fn edge_list(&self) -> Vec<Edge> {
        self.nodes
            .values()
            .flat_map(|n| n.out_edges.iter().cloned())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Binary codec
    // -----------------------------------------------------------------------

    /// Encode the full node map to `writer` and flush it.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        let wire: Vec<WireNode> = self.nodes.values().map(WireNode::from).collect();
        bincode::serialize_into(&mut *writer, &wire)?;
        writer.flush()?;
        Ok(())
    }

    /// Decode a graph previously written by `write_to`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let wire: Vec<WireNode> = bincode::deserialize_from(reader)?;
        let mut graph = AdjacencyGraph::new();
        for wire_node in wire {
            let node = Node::try_from(wire_node)?;
            match graph.nodes.entry(node.index) {
                Entry::Occupied(_) => return Err(CodecError::DuplicateNode(node.index)),
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
        }
        Ok(graph)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = bytes;
        Self::read_from(&mut cursor)
    }
}

impl SearchGraph for AdjacencyGraph {
    type Location = GridIndex;

    fn has_location(&self, location: &GridIndex) -> bool {
        self.has_node(*location)
    }

    fn reachable_from(&self, location: &GridIndex) -> SmallVec<[GridIndex; 8]> {
        self.reachable_neighbors(*location)
    }
}

impl fmt::Display for AdjacencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph with {} nodes and {} edges:",
            self.node_count(),
            self.edge_count()
        )?;
        for node in self.nodes.values() {
            writeln!(f, "  {} H{:.2}", node.index, node.height)?;
            for edge in &node.out_edges {
                let target = match self.node(edge.to) {
                    Some(to) => format!("H{:.2}", to.height),
                    None => "missing".to_string(),
                };
                writeln!(
                    f,
                    "    -> {} {} | {} | dir ({}, {}, {})",
                    edge.to,
                    target,
                    edge.edge_type,
                    edge.direction[0],
                    edge.direction[1],
                    edge.direction[2]
                )?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct WireEdge {
    from: GridIndex,
    to: GridIndex,
    edge_type: u8,
    direction: [i32; 3],
}

#[derive(Serialize, Deserialize)]
struct WireNode {
    x: i32,
    y: i32,
    z: i32,
    height: f64,
    edges: Vec<WireEdge>,
}

impl From<&Node> for WireNode {
    fn from(node: &Node) -> Self {
        Self {
            x: node.index.x,
            y: node.index.y,
            z: node.index.z,
            height: node.height,
            edges: node
                .out_edges
                .iter()
                .map(|e| WireEdge {
                    from: e.from,
                    to: e.to,
                    edge_type: e.edge_type.tag(),
                    direction: e.direction,
                })
                .collect(),
        }
    }
}

impl TryFrom<WireNode> for Node {
    type Error = CodecError;

    fn try_from(wire: WireNode) -> Result<Self, CodecError> {
        let out_edges = wire
            .edges
            .into_iter()
            .map(|e| {
                let edge_type =
                    EdgeType::from_tag(e.edge_type).ok_or(CodecError::UnknownEdgeType(e.edge_type))?;
                Ok(Edge {
                    from: e.from,
                    to: e.to,
                    edge_type,
                    direction: e.direction,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;
        Ok(Node {
            index: GridIndex::new(wire.x, wire.y, wire.z),
            height: wire.height,
            out_edges,
        })
    }
}
