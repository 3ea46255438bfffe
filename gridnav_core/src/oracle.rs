// The geometry oracle: the one external capability the sampler consumes.
//
// Hosts implement `GeometryOracle` over their static collision world. Both
// probes must return the nearest solid hit along the segment, be
// deterministic for an unchanged scene, and have no side effects. The trait
// is `Sync` because a build samples columns in parallel.
//
// See also: `scene.rs` for an in-memory implementation, `sampler.rs` for the
// only consumer.

use glam::DVec3;

/// The nearest solid surface hit along a probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub location: DVec3,
    /// Unit surface normal at `location`.
    pub normal: DVec3,
}

/// Ray/segment queries against static world geometry.
pub trait GeometryOracle: Sync {
    /// First solid hit on the segment from `start` to `end`, if any.
    fn segment_probe(&self, start: DVec3, end: DVec3) -> Option<ProbeHit>;

    /// First solid hit on the vertical segment at `(x, y)` from `z_from` to
    /// `z_to`. Floor probes cast downward (`z_from > z_to`); the clearance
    /// probe casts upward.
    fn vertical_probe(&self, x: f64, y: f64, z_from: f64, z_to: f64) -> Option<ProbeHit> {
        self.segment_probe(DVec3::new(x, y, z_from), DVec3::new(x, y, z_to))
    }
}

impl<T: GeometryOracle + ?Sized> GeometryOracle for &T {
    fn segment_probe(&self, start: DVec3, end: DVec3) -> Option<ProbeHit> {
        (**self).segment_probe(start, end)
    }

    fn vertical_probe(&self, x: f64, y: f64, z_from: f64, z_to: f64) -> Option<ProbeHit> {
        (**self).vertical_probe(x, y, z_from, z_to)
    }
}
