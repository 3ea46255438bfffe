// gridnav_core: layered grid navigation over static 3D terrain.
//
// Samples world geometry on a regular grid (100 units between columns, 25
// units per height layer), classifies the connection between every pair of
// adjacent cells as level ground, slope, slope end, or cliff, and answers
// shortest-path queries over the resulting graph with A* plus geometric
// refinement. Several floors can stack in one column; a cell is identified
// by column, row, and layer.
//
// Module overview:
// - `types.rs`:       GridIndex, EdgeType, WorldBox, GridBounds, world/grid conversion.
// - `config.rs`:      Grid constants, SamplerConfig / PathConfig / NavConfig (JSON).
// - `error.rs`:       CodecError, BuildError, ConfigError.
// - `graph.rs`:       AdjacencyGraph (nodes own their out-edges) + binary codec.
// - `oracle.rs`:      GeometryOracle, the probe capability the sampler consumes.
// - `scene.rs`:       SceneOracle, an in-memory oracle of boxes and ramps.
// - `sampler.rs`:     TerrainSampler, geometry probes to typed edges.
// - `astar.rs`:       Generic A* over any `SearchGraph`.
// - `postprocess.rs`: Slope lip insertion and collinear filtering.
// - `navigator.rs`:   World-space path queries and distance-budget splits.
// - `builder.rs`:     Background rebuilds with atomic publication.
// - `level.rs`:       Multiple bounded blocks, query dispatch, level codec.
//
// The crate has no global state. Hosts own their graphs, builders, and
// levels and pass them by reference. Logging goes through `tracing`; the
// crate installs no subscriber.
//
// **Critical constraint: determinism.** Building the same region of the same
// geometry gives the same graph and the same encoded bytes, regardless of
// how rayon schedules the column work. Graph storage is `BTreeMap`-ordered
// and A* breaks ties by insertion order.

pub mod astar;
pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod level;
pub mod navigator;
pub mod oracle;
pub mod postprocess;
pub mod sampler;
pub mod scene;
pub mod types;
