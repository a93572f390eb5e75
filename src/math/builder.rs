use std::fmt;

use glam::{Mat4, Vec2};

use crate::error::GeometryError;
use crate::geo::{FaultTrace, narrow, project};
use crate::math::extrude::{DEFAULT_EXTRUSION_DEPTH, extrude_footprint};
use crate::math::mesh::{ExtrudedSolid, LineLoop, Primitive};

const MIN_SOLID_POINTS: usize = 3;
const MIN_LOOP_POINTS: usize = 2;

/// Which construction a fault trace goes through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mechanism {
    /// Upper and lower edges drawn as independent line loops.
    #[default]
    Default,
    /// Upper edge extruded into an oriented solid.
    Subduction,
}

impl Mechanism {
    pub const SUBDUCTION_LABEL: &'static str = "subduction";

    /// Maps an externally managed mechanism label. Only the exact label
    /// `"subduction"` selects the extrusion path.
    pub fn from_label(label: &str) -> Self {
        if label == Self::SUBDUCTION_LABEL {
            Mechanism::Subduction
        } else {
            Mechanism::Default
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mechanism::Default => "default",
            Mechanism::Subduction => Self::SUBDUCTION_LABEL,
        }
    }
}

impl From<&str> for Mechanism {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationParams {
    pub dip_angle_deg: f64,
    pub strike_angle_deg: f64,
    pub mechanism: Mechanism,
}

impl OrientationParams {
    pub fn new(dip_angle_deg: f64, strike_angle_deg: f64, mechanism: Mechanism) -> Self {
        Self {
            dip_angle_deg,
            strike_angle_deg,
            mechanism,
        }
    }
}

/// Intrinsic X→Y→Z rotation: `Rx(-90°) · Ry(dip) · Rz(strike)`.
///
/// The X tilt lays the map-plane footprint into the scene's vertical
/// convention. The factors must stay in this order.
pub fn orientation_matrix(dip_angle_deg: f64, strike_angle_deg: f64) -> Mat4 {
    Mat4::from_rotation_x((-90.0_f32).to_radians())
        * Mat4::from_rotation_y((dip_angle_deg as f32).to_radians())
        * Mat4::from_rotation_z((strike_angle_deg as f32).to_radians())
}

/// Everything one trace renders as. `primary` indexes the primitive the
/// camera is framed on.
#[derive(Clone, Debug, PartialEq)]
pub struct FaultGeometry {
    pub primitives: Vec<Primitive>,
    primary: usize,
}

impl FaultGeometry {
    pub fn primary(&self) -> &Primitive {
        &self.primitives[self.primary]
    }

    pub fn primary_index(&self) -> usize {
        self.primary
    }

    pub fn solid(&self) -> Option<&ExtrudedSolid> {
        self.primitives.iter().find_map(|p| match p {
            Primitive::Solid(solid) => Some(solid),
            Primitive::LineLoop(_) => None,
        })
    }

    pub fn line_loops(&self) -> impl Iterator<Item = &LineLoop> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::LineLoop(line) => Some(line),
            Primitive::Solid(_) => None,
        })
    }
}

pub fn build_fault_geometry(
    trace: &FaultTrace,
    params: &OrientationParams,
) -> Result<FaultGeometry, GeometryError> {
    match params.mechanism {
        Mechanism::Subduction => build_subduction(trace, params),
        Mechanism::Default => build_outline(trace),
    }
}

fn build_subduction(
    trace: &FaultTrace,
    params: &OrientationParams,
) -> Result<FaultGeometry, GeometryError> {
    let found = trace.upper_edge.len();
    if found < MIN_SOLID_POINTS {
        return Err(GeometryError::NotEnoughPoints {
            mechanism: Mechanism::Subduction,
            required: MIN_SOLID_POINTS,
            found,
        });
    }

    let footprint: Vec<Vec2> = project(&trace.upper_edge)
        .into_iter()
        .map(|p| p.truncate())
        .collect();

    let depth = trace
        .lower_edge
        .iter()
        .filter_map(|p| narrow(p.depth))
        .reduce(f32::max)
        .unwrap_or(DEFAULT_EXTRUSION_DEPTH);

    let mesh = extrude_footprint(&footprint, depth);
    let transform = orientation_matrix(params.dip_angle_deg, params.strike_angle_deg);

    tracing::debug!(
        points = footprint.len(),
        depth,
        dip = params.dip_angle_deg,
        strike = params.strike_angle_deg,
        triangles = mesh.triangle_count(),
        "extruded subduction footprint"
    );

    Ok(FaultGeometry {
        primitives: vec![Primitive::Solid(ExtrudedSolid {
            footprint,
            depth,
            mesh,
            transform,
        })],
        primary: 0,
    })
}

fn build_outline(trace: &FaultTrace) -> Result<FaultGeometry, GeometryError> {
    let found = trace.upper_edge.len();
    if found < MIN_LOOP_POINTS {
        return Err(GeometryError::NotEnoughPoints {
            mechanism: Mechanism::Default,
            required: MIN_LOOP_POINTS,
            found,
        });
    }

    let mut primitives = vec![Primitive::LineLoop(LineLoop::from_points(&project(
        &trace.upper_edge,
    )))];
    if !trace.lower_edge.is_empty() {
        primitives.push(Primitive::LineLoop(LineLoop::from_points(&project(
            &trace.lower_edge,
        ))));
    }

    tracing::debug!(loops = primitives.len(), "built fault outline");

    Ok(FaultGeometry {
        primitives,
        primary: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use glam::Vec3;
    use proptest::prelude::*;

    fn sample_upper() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-6.9, 107.6, 0.0),
            GeoPoint::new(-6.85, 107.65, 0.0),
            GeoPoint::new(-6.95, 107.7, 0.0),
        ]
    }

    fn sample_lower(depth: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-6.9, 107.6, depth),
            GeoPoint::new(-6.85, 107.65, depth),
            GeoPoint::new(-6.95, 107.7, depth),
        ]
    }

    #[test]
    fn unrepresentable_lower_depth_uses_default() {
        let trace = FaultTrace::new(sample_upper(), sample_lower(1e40));
        let params = OrientationParams::new(30.0, 45.0, Mechanism::Subduction);
        let geometry = build_fault_geometry(&trace, &params).unwrap();
        let solid = geometry.solid().unwrap();
        assert_eq!(solid.depth, DEFAULT_EXTRUSION_DEPTH);

        let framing = crate::math::fit_camera(Some(geometry.primary())).unwrap();
        assert!(framing.target.is_finite());
        assert!(framing.position.is_finite());
    }

    #[test]
    fn mechanism_labels_map_at_the_boundary() {
        assert_eq!(Mechanism::from_label("subduction"), Mechanism::Subduction);
        assert_eq!(Mechanism::from_label("Subduction"), Mechanism::Default);
        assert_eq!(Mechanism::from_label("Subduction Interface"), Mechanism::Default);
        assert_eq!(Mechanism::from_label(""), Mechanism::Default);
        assert_eq!(Mechanism::from("Active Shallow Crust"), Mechanism::Default);
    }

    #[test]
    fn subduction_example() {
        let trace = FaultTrace::new(sample_upper(), sample_lower(20.0));
        let params = OrientationParams::new(30.0, 45.0, Mechanism::from_label("subduction"));
        let geometry = build_fault_geometry(&trace, &params).unwrap();

        assert_eq!(geometry.primitives.len(), 1);
        let solid = geometry.solid().unwrap();
        assert_eq!(solid.depth, 20.0);
        assert_eq!(solid.footprint.len(), 3);

        let expected = Mat4::from_rotation_x((-90.0_f32).to_radians())
            * Mat4::from_rotation_y(30.0_f32.to_radians())
            * Mat4::from_rotation_z(45.0_f32.to_radians());
        assert!(solid.transform.abs_diff_eq(expected, 1e-6));

        // a reassociated order gives a different orientation
        let reordered = Mat4::from_rotation_z(45.0_f32.to_radians())
            * Mat4::from_rotation_y(30.0_f32.to_radians())
            * Mat4::from_rotation_x((-90.0_f32).to_radians());
        assert!(!solid.transform.abs_diff_eq(reordered, 1e-3));
    }

    #[test]
    fn x_tilt_maps_extrusion_axis_to_y() {
        let m = orientation_matrix(0.0, 0.0);
        assert!(m.transform_vector3(Vec3::Z).abs_diff_eq(Vec3::Y, 1e-6));
        assert!(m.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn missing_lower_edge_uses_default_depth() {
        let trace = FaultTrace::new(sample_upper(), Vec::new());
        let params = OrientationParams::new(0.0, 0.0, Mechanism::Subduction);
        let solid = build_fault_geometry(&trace, &params).unwrap().solid().cloned().unwrap();
        assert_eq!(solid.depth, DEFAULT_EXTRUSION_DEPTH);
    }

    #[test]
    fn depth_is_deepest_lower_point() {
        let mut lower = sample_lower(5.0);
        lower[1].depth = 35.0;
        let trace = FaultTrace::new(sample_upper(), lower);
        let params = OrientationParams::new(0.0, 0.0, Mechanism::Subduction);
        let geometry = build_fault_geometry(&trace, &params).unwrap();
        assert_eq!(geometry.solid().unwrap().depth, 35.0);
    }

    #[test]
    fn two_point_subduction_is_invalid() {
        let trace = FaultTrace::new(sample_upper()[..2].to_vec(), sample_lower(20.0));
        let params = OrientationParams::new(0.0, 0.0, Mechanism::Subduction);
        assert_eq!(
            build_fault_geometry(&trace, &params),
            Err(GeometryError::NotEnoughPoints {
                mechanism: Mechanism::Subduction,
                required: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn outline_needs_two_upper_points() {
        let trace = FaultTrace::new(sample_upper()[..1].to_vec(), sample_lower(20.0));
        let err = build_fault_geometry(&trace, &OrientationParams::default()).unwrap_err();
        assert!(matches!(err, GeometryError::NotEnoughPoints { required: 2, found: 1, .. }));
    }

    #[test]
    fn outline_draws_one_loop_per_edge() {
        let trace = FaultTrace::new(sample_upper(), sample_lower(20.0));
        let params = OrientationParams::new(30.0, 45.0, Mechanism::Default);
        let geometry = build_fault_geometry(&trace, &params).unwrap();

        assert_eq!(geometry.primitives.len(), 2);
        assert!(geometry.solid().is_none());
        assert_eq!(geometry.primary_index(), 0);
        assert!(geometry.primitives.iter().all(|p| p.transform() == Mat4::IDENTITY));

        let loops: Vec<&LineLoop> = geometry.line_loops().collect();
        assert_eq!(loops[0].point_count(), 3);
        assert_eq!(loops[1].positions().next(), Some(Vec3::new(107.6, -6.9, -20.0)));
    }

    #[test]
    fn outline_without_lower_edge_is_a_single_loop() {
        let trace = FaultTrace::new(sample_upper(), Vec::new());
        let geometry = build_fault_geometry(&trace, &OrientationParams::default()).unwrap();
        assert_eq!(geometry.primitives.len(), 1);
    }

    fn arb_point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..90.0, -180.0f64..180.0, 0.0f64..100.0)
            .prop_map(|(lat, lon, depth)| GeoPoint::new(lat, lon, depth))
    }

    proptest! {
        #[test]
        fn subduction_footprint_matches_upper_edge(
            upper in prop::collection::vec(arb_point(), 3..24),
            lower in prop::collection::vec(arb_point(), 0..8),
            dip in -90.0f64..90.0,
            strike in 0.0f64..360.0,
        ) {
            let trace = FaultTrace::new(upper.clone(), lower);
            let params = OrientationParams::new(dip, strike, Mechanism::Subduction);
            let geometry = build_fault_geometry(&trace, &params).unwrap();
            prop_assert_eq!(geometry.primitives.len(), 1);
            prop_assert_eq!(geometry.solid().unwrap().footprint.len(), upper.len());
        }

        #[test]
        fn outline_never_extrudes(
            upper in prop::collection::vec(arb_point(), 2..24),
            lower in prop::collection::vec(arb_point(), 0..8),
            label in "[a-zA-Z ]{0,24}",
        ) {
            prop_assume!(label != Mechanism::SUBDUCTION_LABEL);
            let expected = 1 + usize::from(!lower.is_empty());
            let trace = FaultTrace::new(upper, lower);
            let params = OrientationParams::new(10.0, 20.0, Mechanism::from_label(&label));
            let geometry = build_fault_geometry(&trace, &params).unwrap();
            prop_assert_eq!(geometry.primitives.len(), expected);
            prop_assert!(geometry.primitives.iter().all(|p| !p.is_solid()));
        }

        #[test]
        fn rebuild_is_idempotent(
            upper in prop::collection::vec(arb_point(), 3..16),
            lower in prop::collection::vec(arb_point(), 0..8),
            dip in -90.0f64..90.0,
            strike in 0.0f64..360.0,
            subduction in any::<bool>(),
        ) {
            let mechanism = if subduction { Mechanism::Subduction } else { Mechanism::Default };
            let trace = FaultTrace::new(upper, lower);
            let params = OrientationParams::new(dip, strike, mechanism);
            let first = build_fault_geometry(&trace, &params).unwrap();
            let second = build_fault_geometry(&trace, &params).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
