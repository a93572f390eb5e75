use glam::Vec3;

/// A fault trace vertex in geographic coordinates. Depth is downward-positive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, depth: f64) -> Self {
        Self { lat, lon, depth }
    }

    /// Planar scene position: `x = lon`, `y = lat`, `z = -depth`. A component
    /// with no finite `f32` value lands on 0.
    pub fn to_scene(self) -> Vec3 {
        let f = |v: f64| narrow(v).unwrap_or(0.0);
        Vec3::new(f(self.lon), f(self.lat), -f(self.depth))
    }
}

/// Upper (shallow) and lower (deep) outlines of a rupture plane.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaultTrace {
    pub upper_edge: Vec<GeoPoint>,
    pub lower_edge: Vec<GeoPoint>,
}

impl FaultTrace {
    pub fn new(upper_edge: Vec<GeoPoint>, lower_edge: Vec<GeoPoint>) -> Self {
        Self {
            upper_edge,
            lower_edge,
        }
    }
}

/// `v` as a finite `f32`, if it has one.
pub fn narrow(v: f64) -> Option<f32> {
    let n = v as f32;
    n.is_finite().then_some(n)
}

pub fn project(points: &[GeoPoint]) -> Vec<Vec3> {
    points.iter().map(|p| p.to_scene()).collect()
}
