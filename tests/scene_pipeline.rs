//! Parser → builder → scene manager, driven through a recording backend.

use std::cell::RefCell;
use std::rc::Rc;

use crossbeam::channel::unbounded;
use glam::Vec3;

use fault3d::error::{RenderError, SceneError};
use fault3d::geo::{CoordinateParser, FaultTrace, GeoPoint};
use fault3d::math::{
    Aabb3, FIT_OFFSET, Mechanism, OrientationParams, build_fault_geometry, orientation_matrix,
};
use fault3d::renderer::{
    Camera, FrameStatus, RenderLoop, SceneBackend, SceneDescription, SceneManager, Viewport,
};

#[derive(Debug, Default)]
struct Log {
    live: usize,
    max_live: usize,
    uploads: usize,
    releases: usize,
    resizes: Vec<Viewport>,
    drawn: usize,
    scenes: Vec<SceneDescription>,
}

/// Records every backend call into a shared log that outlives the manager.
#[derive(Clone, Default)]
struct RecordingBackend(Rc<RefCell<Log>>);

impl SceneBackend for RecordingBackend {
    type Resources = u64;
    type Frame = ();

    fn upload(&mut self, scene: &SceneDescription) -> u64 {
        let mut log = self.0.borrow_mut();
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        log.uploads += 1;
        log.scenes.push(scene.clone());
        log.uploads as u64
    }

    fn release(&mut self, _: u64) {
        let mut log = self.0.borrow_mut();
        log.live -= 1;
        log.releases += 1;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.0.borrow_mut().resizes.push(viewport);
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn draw_scene(&mut self, _: &mut (), _: &u64, _: &Camera) {
        self.0.borrow_mut().drawn += 1;
    }

    fn present(&mut self, _: ()) {}
}

fn attached() -> (SceneManager<RecordingBackend>, Rc<RefCell<Log>>) {
    let backend = RecordingBackend::default();
    let log = backend.0.clone();
    let mut manager = SceneManager::new();
    manager.attach(backend);
    (manager, log)
}

const UPPER: &str = "-6.90 107.60 0\n-6.95 107.75 0\n-7.05 107.80 0\n";
const LOWER: &str = "-7.00 107.55 20\n-7.10 107.70 25\n";

fn parsed_trace() -> FaultTrace {
    let parser = CoordinateParser::new();
    FaultTrace::new(parser.parse(UPPER), parser.parse(LOWER))
}

#[test]
fn text_to_framed_solid() {
    let (mut manager, log) = attached();
    let params = OrientationParams::new(30.0, 45.0, Mechanism::Subduction);

    let outcome = manager.rebuild(&parsed_trace(), &params).unwrap();
    assert_eq!(outcome.primitives, 1);
    assert!(outcome.geometry_error.is_none());
    assert!(outcome.framed);

    let log = log.borrow();
    let scene = &log.scenes[0];
    assert_eq!(scene.meshes.len(), 1);
    let framing = scene.framing.unwrap();
    assert_ne!(framing.target, Vec3::ZERO);
    assert_eq!(framing.position, framing.target + FIT_OFFSET);
    assert_eq!(manager.camera().unwrap().target, framing.target);

    // local box corners rotated, then re-boxed
    let geometry = build_fault_geometry(&parsed_trace(), &params).unwrap();
    let solid = geometry.solid().unwrap();
    let local = Aabb3::from_points(solid.mesh.positions()).unwrap();
    let expected = local.transformed(orientation_matrix(30.0, 45.0)).center();
    assert!(framing.target.abs_diff_eq(expected, 1e-3));

    // the uploaded mesh is already in world space
    let uploaded = &scene.meshes[0].mesh;
    assert_eq!(uploaded.vertex_count(), solid.mesh.vertex_count());
    assert_ne!(uploaded.vertices, solid.mesh.vertices);
    for (world, local) in uploaded.positions().zip(solid.mesh.positions()) {
        assert!(world.abs_diff_eq(solid.transform.transform_point3(local), 1e-3));
    }
}

#[test]
fn text_to_outlines() {
    let (mut manager, log) = attached();
    let params = OrientationParams::new(30.0, 45.0, Mechanism::from_label("Active Shallow Crust"));

    let outcome = manager.rebuild(&parsed_trace(), &params).unwrap();
    assert_eq!(outcome.primitives, 2);

    let log = log.borrow();
    let scene = &log.scenes[0];
    assert!(scene.meshes.is_empty());
    // closed strips repeat their first point
    assert_eq!(scene.lines[0].vertex_count(), 4);
    assert_eq!(scene.lines[1].vertex_count(), 3);
    // unrotated: the first outline point is the projected first upper point
    assert_eq!(scene.lines[0].positions[0], Vec3::new(107.60, -6.90, 0.0));
}

#[test]
fn rebuilds_never_overlap() {
    let (mut manager, log) = attached();
    let trace = parsed_trace();
    for (i, dip) in [0.0, 15.0, 30.0, 45.0, 60.0].into_iter().enumerate() {
        let mechanism = if i % 2 == 0 {
            Mechanism::Subduction
        } else {
            Mechanism::Default
        };
        manager
            .rebuild(&trace, &OrientationParams::new(dip, 10.0, mechanism))
            .unwrap();
    }

    let log = log.borrow();
    assert_eq!(log.max_live, 1);
    assert_eq!(log.live, 1);
    assert_eq!(log.uploads, 5);
    assert_eq!(log.releases, 4);
}

#[test]
fn identical_rebuilds_describe_identical_scenes() {
    let (mut manager, log) = attached();
    let params = OrientationParams::new(30.0, 45.0, Mechanism::Subduction);
    manager.rebuild(&parsed_trace(), &params).unwrap();
    manager.rebuild(&parsed_trace(), &params).unwrap();

    let log = log.borrow();
    assert_eq!(log.scenes[0], log.scenes[1]);
}

#[test]
fn no_surface_means_no_scene() {
    let mut manager: SceneManager<RecordingBackend> = SceneManager::new();
    let err = manager
        .rebuild(&parsed_trace(), &OrientationParams::default())
        .unwrap_err();
    assert!(matches!(err, SceneError::MissingSurface));
    assert!(manager.camera().is_none());
}

#[test]
fn too_few_points_recovers_with_empty_scene() {
    let (mut manager, log) = attached();
    let trace = FaultTrace::new(
        vec![GeoPoint::new(0.0, 0.0, 0.0), GeoPoint::new(1.0, 1.0, 0.0)],
        Vec::new(),
    );
    let outcome = manager
        .rebuild(&trace, &OrientationParams::new(10.0, 0.0, Mechanism::Subduction))
        .unwrap();
    assert!(outcome.geometry_error.is_some());
    assert_eq!(outcome.primitives, 0);

    let log = log.borrow();
    assert_eq!(log.live, 1);
    assert!(log.scenes[0].meshes.is_empty());
    assert!(log.scenes[0].grid.vertex_count() > 0);
}

#[test]
fn unparsable_text_still_builds() {
    let (tx, rx) = unbounded();
    let parser = CoordinateParser::with_diagnostics(tx);
    let upper = parser.parse("abc def\nfoo bar\n1 2");
    assert_eq!(upper[0], GeoPoint::new(0.0, 0.0, 0.0));
    assert!(rx.try_iter().count() >= 4);

    let (mut manager, _log) = attached();
    let outcome = manager
        .rebuild(
            &FaultTrace::new(upper, Vec::new()),
            &OrientationParams::new(0.0, 0.0, Mechanism::Subduction),
        )
        .unwrap();
    assert_eq!(outcome.primitives, 1);
}

#[test]
fn huge_coordinates_keep_the_camera_finite() {
    let parser = CoordinateParser::new();
    let trace = FaultTrace::new(
        parser.parse("1e39 1e39 0\n0 0 0\n1 1 0"),
        parser.parse("0 0 1e40\n1 1 5"),
    );

    for mechanism in [Mechanism::Subduction, Mechanism::Default] {
        let (mut manager, log) = attached();
        let outcome = manager
            .rebuild(&trace, &OrientationParams::new(30.0, 45.0, mechanism))
            .unwrap();
        assert!(outcome.geometry_error.is_none());
        assert!(outcome.framed);

        let log = log.borrow();
        let framing = log.scenes[0].framing.unwrap();
        assert!(framing.target.is_finite());
        assert!(framing.position.is_finite());
        assert!(manager.camera().unwrap().position.is_finite());
    }
}

#[test]
fn resize_keeps_view_and_geometry() {
    let (mut manager, log) = attached();
    let params = OrientationParams::new(30.0, 45.0, Mechanism::Subduction);
    manager.rebuild(&parsed_trace(), &params).unwrap();
    let before = *manager.camera().unwrap();

    manager.resize(1920, 1080);
    manager.resize(0, 0);
    manager.resize(800, 800);

    let after = *manager.camera().unwrap();
    assert_eq!(after.position, before.position);
    assert_eq!(after.target, before.target);
    assert_eq!(after.aspect, 1.0);

    let log = log.borrow();
    assert_eq!(log.uploads, 1);
    assert_eq!(log.resizes.len(), 3);
    assert!(!log.resizes[1].surface_visible);
}

#[test]
fn loop_draws_until_stopped_then_teardown_releases() {
    let (mut manager, log) = attached();
    manager
        .rebuild(&parsed_trace(), &OrientationParams::default())
        .unwrap();

    let (mut render_loop, stop) = RenderLoop::new();
    for _ in 0..3 {
        assert_eq!(render_loop.frame(&mut manager, |_, _| {}), FrameStatus::Drawn);
    }
    stop.stop();
    assert_eq!(render_loop.frame(&mut manager, |_, _| {}), FrameStatus::Stopped);
    assert_eq!(log.borrow().drawn, 3);

    manager.teardown();
    assert_eq!(log.borrow().live, 0);
    assert!(manager.camera().is_none());
}

#[test]
fn dropping_manager_releases_scene() {
    let (mut manager, log) = attached();
    manager
        .rebuild(&parsed_trace(), &OrientationParams::default())
        .unwrap();
    drop(manager);
    assert_eq!(log.borrow().live, 0);
}
