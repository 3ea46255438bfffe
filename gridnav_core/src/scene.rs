// In-memory geometry oracle built from convex solids.
//
// A `SceneOracle` is a list of `Solid`s, each the intersection of half-spaces
// `normal . p <= offset`. Cuboids model floors, walls, ceilings and steps;
// ramps are cuboids whose top face is tilted along one horizontal axis.
// `segment_probe` clips the segment against every solid (Cyrus-Beck) and
// reports the nearest entry point with the normal of the face it entered
// through. A segment that starts inside a solid hits at its start, with the
// normal facing back along the segment.
//
// Hosts without their own collision world can sample against a scene
// directly; the crate's tests and benchmarks describe all terrain this way.
//
// See also: `oracle.rs` for the trait, `sampler.rs` for the probes it receives.

use crate::oracle::{GeometryOracle, ProbeHit};
use glam::{DVec2, DVec3};

/// Parallel-to-face tolerance for the clipping test.
const PARALLEL_EPSILON: f64 = 1.0e-12;

/// Horizontal axis along which a ramp rises or falls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampAxis {
    X,
    Y,
}

/// The closed half-space `normal . p <= offset`, with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
struct HalfSpace {
    normal: DVec3,
    offset: f64,
}

impl HalfSpace {
    fn new(normal: DVec3, offset: f64) -> Self {
        let length = normal.length();
        Self {
            normal: normal / length,
            offset: offset / length,
        }
    }
}

/// A convex solid.
#[derive(Clone, Debug, PartialEq)]
pub struct Solid {
    faces: Vec<HalfSpace>,
}

impl Solid {
    /// Axis-aligned box between two corners.
    pub fn cuboid(a: DVec3, b: DVec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            faces: vec![
                HalfSpace::new(DVec3::NEG_X, -min.x),
                HalfSpace::new(DVec3::X, max.x),
                HalfSpace::new(DVec3::NEG_Y, -min.y),
                HalfSpace::new(DVec3::Y, max.y),
                HalfSpace::new(DVec3::NEG_Z, -min.z),
                HalfSpace::new(DVec3::Z, max.z),
            ],
        }
    }

    /// Solid wedge over the footprint `[min, max]` from `base_z` up to a top
    /// face that runs linearly from `height_at_min` at `min` along `axis` to
    /// `height_at_max` at `max`. A footprint with no run along `axis` has
    /// no slope and becomes a cuboid topped at the higher of the two heights.
    pub fn ramp(
        min: DVec2,
        max: DVec2,
        base_z: f64,
        axis: RampAxis,
        height_at_min: f64,
        height_at_max: f64,
    ) -> Self {
        let (lo, hi) = (min.min(max), min.max(max));
        let run = match axis {
            RampAxis::X => hi.x - lo.x,
            RampAxis::Y => hi.y - lo.y,
        };
        if run <= 0.0 {
            return Solid::cuboid(
                lo.extend(base_z),
                hi.extend(height_at_min.max(height_at_max)),
            );
        }
        let slope = (height_at_max - height_at_min) / run;
        // z <= h0 + slope * (a - a0)  <=>  z - slope * a <= h0 - slope * a0
        let top = match axis {
            RampAxis::X => HalfSpace::new(
                DVec3::new(-slope, 0.0, 1.0),
                height_at_min - slope * lo.x,
            ),
            RampAxis::Y => HalfSpace::new(
                DVec3::new(0.0, -slope, 1.0),
                height_at_min - slope * lo.y,
            ),
        };
        Self {
            faces: vec![
                HalfSpace::new(DVec3::NEG_X, -lo.x),
                HalfSpace::new(DVec3::X, hi.x),
                HalfSpace::new(DVec3::NEG_Y, -lo.y),
                HalfSpace::new(DVec3::Y, hi.y),
                HalfSpace::new(DVec3::NEG_Z, -base_z),
                top,
            ],
        }
    }

    /// Parametric entry `t` in `[0, 1]` and entry normal of the segment
    /// `start -> end`, or `None` if the segment misses.
    fn clip(&self, start: DVec3, end: DVec3) -> Option<(f64, DVec3)> {
        let dir = end - start;
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        let mut enter_normal = DVec3::ZERO;

        for face in &self.faces {
            let denom = face.normal.dot(dir);
            let inside_by = face.offset - face.normal.dot(start);
            if denom.abs() < PARALLEL_EPSILON {
                if inside_by < 0.0 {
                    return None;
                }
                continue;
            }
            let t = inside_by / denom;
            if denom < 0.0 {
                if t > t_enter {
                    t_enter = t;
                    enter_normal = face.normal;
                }
            } else if t < t_exit {
                t_exit = t;
            }
            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter > 1.0 || t_exit < 0.0 {
            return None;
        }
        if t_enter >= 0.0 {
            Some((t_enter, enter_normal))
        } else {
            Some((0.0, -dir.normalize_or_zero()))
        }
    }
}

/// A static scene of convex solids.
#[derive(Clone, Debug, Default)]
pub struct SceneOracle {
    solids: Vec<Solid>,
}

impl SceneOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, solid: Solid) {
        self.solids.push(solid);
    }

    /// Builder-style `add`.
    pub fn with(mut self, solid: Solid) -> Self {
        self.add(solid);
        self
    }
}

impl GeometryOracle for SceneOracle {
    fn segment_probe(&self, start: DVec3, end: DVec3) -> Option<ProbeHit> {
        self.solids
            .iter()
            .filter_map(|solid| solid.clip(start, end))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal)| ProbeHit {
                location: start + (end - start) * t,
                normal,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Solid {
        Solid::cuboid(DVec3::new(-500.0, -500.0, -100.0), DVec3::new(500.0, 500.0, 0.0))
    }

    #[test]
    fn downward_probe_hits_top_face() {
        let scene = SceneOracle::new().with(ground());
        let hit = scene.vertical_probe(10.0, 20.0, 1000.0, -50.0).unwrap();
        assert!((hit.location - DVec3::new(10.0, 20.0, 0.0)).length() < 1e-9);
        assert_eq!(hit.normal, DVec3::Z);
    }

    #[test]
    fn probe_outside_footprint_misses() {
        let scene = SceneOracle::new().with(ground());
        assert!(scene.vertical_probe(600.0, 0.0, 1000.0, -50.0).is_none());
    }

    #[test]
    fn probe_that_stops_short_misses() {
        let scene = SceneOracle::new().with(ground());
        assert!(scene.vertical_probe(0.0, 0.0, 1000.0, 10.0).is_none());
    }

    #[test]
    fn upward_probe_hits_ceiling_underside() {
        let scene = SceneOracle::new().with(ground()).with(Solid::cuboid(
            DVec3::new(-500.0, -500.0, 80.0),
            DVec3::new(500.0, 500.0, 100.0),
        ));
        let hit = scene.vertical_probe(0.0, 0.0, 1.0, 126.0).unwrap();
        assert!((hit.location.z - 80.0).abs() < 1e-9);
        assert_eq!(hit.normal, DVec3::NEG_Z);
    }

    #[test]
    fn nearest_solid_wins() {
        let scene = SceneOracle::new()
            .with(ground())
            .with(Solid::cuboid(DVec3::new(-10.0, -10.0, 0.0), DVec3::new(10.0, 10.0, 40.0)));
        let hit = scene.vertical_probe(0.0, 0.0, 1000.0, -50.0).unwrap();
        assert!((hit.location.z - 40.0).abs() < 1e-9);
    }

    #[test]
    fn ramp_top_is_linear() {
        let ramp = Solid::ramp(
            DVec2::new(50.0, -50.0),
            DVec2::new(150.0, 50.0),
            -100.0,
            RampAxis::X,
            0.0,
            50.0,
        );
        let scene = SceneOracle::new().with(ramp);
        let hit = scene.vertical_probe(100.0, 0.0, 1000.0, -50.0).unwrap();
        assert!((hit.location.z - 25.0).abs() < 1e-9);
        let expected_normal = DVec3::new(-0.5, 0.0, 1.0).normalize();
        assert!((hit.normal - expected_normal).length() < 1e-9);

        let hit = scene.vertical_probe(80.0, 0.0, 1000.0, -50.0).unwrap();
        assert!((hit.location.z - 15.0).abs() < 1e-9);
    }

    #[test]
    fn ramp_along_y_descending() {
        let ramp = Solid::ramp(
            DVec2::new(-50.0, 0.0),
            DVec2::new(50.0, 200.0),
            -100.0,
            RampAxis::Y,
            40.0,
            0.0,
        );
        let scene = SceneOracle::new().with(ramp);
        let hit = scene.vertical_probe(0.0, 50.0, 1000.0, -50.0).unwrap();
        assert!((hit.location.z - 30.0).abs() < 1e-9);
    }

    #[test]
    fn ramp_without_run_is_a_box() {
        let ramp = Solid::ramp(
            DVec2::new(100.0, -50.0),
            DVec2::new(100.0, 50.0),
            -100.0,
            RampAxis::X,
            0.0,
            50.0,
        );
        assert!(ramp.faces.iter().all(|face| face.normal.is_finite()));
        let ramp = Solid::ramp(
            DVec2::new(-50.0, 20.0),
            DVec2::new(50.0, 20.0),
            -100.0,
            RampAxis::Y,
            10.0,
            30.0,
        );
        let scene = SceneOracle::new().with(ramp);
        assert!(scene.vertical_probe(0.0, 0.0, 1000.0, -50.0).is_none());
        let hit = scene
            .segment_probe(DVec3::new(0.0, 0.0, 10.0), DVec3::new(0.0, 40.0, 10.0))
            .unwrap();
        assert!((hit.location.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn horizontal_segment_hits_wall_face() {
        let scene = SceneOracle::new()
            .with(ground())
            .with(Solid::cuboid(DVec3::new(40.0, -500.0, 0.0), DVec3::new(60.0, 500.0, 300.0)));
        let hit = scene
            .segment_probe(DVec3::new(0.0, 0.0, 5.0), DVec3::new(100.0, 0.0, 5.0))
            .unwrap();
        assert!((hit.location.x - 40.0).abs() < 1e-9);
        assert_eq!(hit.normal, DVec3::NEG_X);
        // Passing over the wall is clear.
        assert!(scene
            .segment_probe(DVec3::new(0.0, 0.0, 305.0), DVec3::new(100.0, 0.0, 305.0))
            .is_none());
    }

    #[test]
    fn segment_starting_inside_hits_at_start() {
        let scene = SceneOracle::new().with(ground());
        let start = DVec3::new(0.0, 0.0, -10.0);
        let hit = scene.segment_probe(start, DVec3::new(0.0, 0.0, 50.0)).unwrap();
        assert_eq!(hit.location, start);
        assert_eq!(hit.normal, DVec3::NEG_Z);
    }
}
