pub mod bounds;
pub mod builder;
pub mod extrude;
pub mod mesh;

pub use bounds::{Aabb3, CameraFraming, FIT_OFFSET, fit_camera};
pub use builder::{FaultGeometry, Mechanism, OrientationParams, build_fault_geometry, orientation_matrix};
pub use extrude::{DEFAULT_EXTRUSION_DEPTH, extrude_footprint};
pub use mesh::{ExtrudedSolid, LineLoop, Primitive, TriangleMesh};
