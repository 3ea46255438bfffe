// Test-only scenes for end-to-end navigation tests.
//
// Each `Scenario` pairs a `SceneOracle` built from boxes and ramps with the
// region to sample, sized so the expected graph is small enough to reason
// about by hand. Everything downstream of the scene (sampling, building,
// encoding, path queries) runs through the same `gridnav_core` code a host
// would use.
//
// See also: `tests/full_pipeline.rs` for the scenarios in use.

use glam::{DVec2, DVec3};
use gridnav_core::scene::{RampAxis, SceneOracle, Solid};
use gridnav_core::types::WorldBox;
use tracing_subscriber::EnvFilter;

/// Height of the region above the ground plane. Covers every solid the
/// scenarios place.
const REGION_TOP: f64 = 200.0;

/// A scene and the region of it to sample.
pub struct Scenario {
    pub scene: SceneOracle,
    pub region: WorldBox,
}

impl Scenario {
    /// Flat ground under `cols x rows` columns starting at column `(0, 0)`.
    pub fn flat_field(cols: i32, rows: i32) -> Self {
        Self {
            scene: SceneOracle::new().with(ground(cols, rows)),
            region: columns_region(cols, rows),
        }
    }

    /// One row of three columns: a plateau at 0, a ramp cell, and a plateau
    /// at 50.
    pub fn ramp_row() -> Self {
        let scene = SceneOracle::new()
            .with(Solid::cuboid(
                DVec3::new(-50.0, -50.0, -100.0),
                DVec3::new(50.0, 50.0, 0.0),
            ))
            .with(Solid::ramp(
                DVec2::new(50.0, -50.0),
                DVec2::new(150.0, 50.0),
                -100.0,
                RampAxis::X,
                0.0,
                50.0,
            ))
            .with(Solid::cuboid(
                DVec3::new(150.0, -50.0, -100.0),
                DVec3::new(250.0, 50.0, 50.0),
            ));
        Self {
            scene,
            region: columns_region(3, 1),
        }
    }

    /// A `side x side` field with a wall between columns 1 and 2 that
    /// leaves the last row open.
    pub fn wall_with_gap(side: i32) -> Self {
        let gap_row = f64::from(side - 1) * 100.0;
        Self {
            scene: SceneOracle::new()
                .with(ground(side, side))
                .with(wall_between_columns(1, -100.0, gap_row - 70.0)),
            region: columns_region(side, side),
        }
    }

    /// A `side x side` field cut in two by a wall between columns 1 and 2.
    pub fn walled_halves(side: i32) -> Self {
        let far = f64::from(side) * 100.0 + 100.0;
        Self {
            scene: SceneOracle::new()
                .with(ground(side, side))
                .with(wall_between_columns(1, -100.0, far)),
            region: columns_region(side, side),
        }
    }
}

/// Region containing the sample points of columns `0..cols` by `0..rows`.
pub fn columns_region(cols: i32, rows: i32) -> WorldBox {
    WorldBox::new(
        DVec3::new(-10.0, -10.0, -50.0),
        DVec3::new(
            f64::from(cols - 1) * 100.0 + 10.0,
            f64::from(rows - 1) * 100.0 + 10.0,
            REGION_TOP,
        ),
    )
}

/// Ground slab with its top at z = 0 under `cols x rows` columns.
fn ground(cols: i32, rows: i32) -> Solid {
    Solid::cuboid(
        DVec3::new(-50.0, -50.0, -100.0),
        DVec3::new(f64::from(cols) * 100.0 - 50.0, f64::from(rows) * 100.0 - 50.0, 0.0),
    )
}

/// A 20-unit-thick, 300-unit-tall wall halfway between column `x` and
/// `x + 1`, spanning `y_from..y_to`.
fn wall_between_columns(x: i32, y_from: f64, y_to: f64) -> Solid {
    let mid = f64::from(x) * 100.0 + 50.0;
    Solid::cuboid(
        DVec3::new(mid - 10.0, y_from, 0.0),
        DVec3::new(mid + 10.0, y_to, 300.0),
    )
}

/// Install a test-writer subscriber filtered by `RUST_LOG`. Safe to call
/// from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Component-wise comparison with a small absolute tolerance.
pub fn approx_eq(a: DVec3, b: DVec3) -> bool {
    a.abs_diff_eq(b, 1e-6)
}

/// `approx_eq` over two whole paths.
pub fn paths_approx_eq(a: &[DVec3], b: &[DVec3]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&p, &q)| approx_eq(p, q))
}
