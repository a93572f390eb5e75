use glam::Vec3;

use crate::error::{GeometryError, RenderError, SceneError};
use crate::geo::FaultTrace;
use crate::math::{
    CameraFraming, FaultGeometry, OrientationParams, Primitive, TriangleMesh, build_fault_geometry,
    fit_camera,
};
use crate::renderer::camera::Camera;
use crate::renderer::controls::OrbitControls;
use crate::renderer::resize::Viewport;

/// Linear RGB.
pub type Rgb = [f32; 3];

pub const GRID_SIZE: f32 = 200.0;
pub const GRID_DIVISIONS: u32 = 20;
pub const SOLID_OPACITY: f32 = 0.7;

/// Decodes a `0xRRGGBB` sRGB colour into linear RGB.
pub fn hex_color(hex: u32) -> Rgb {
    [(hex >> 16) & 0xff, (hex >> 8) & 0xff, hex & 0xff].map(|c| srgb_to_linear(c as f32 / 255.0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Scene colours, pre-converted to linear RGB.
pub mod palette {
    use super::Rgb;

    /// #111827
    pub const BACKGROUND: Rgb = [0.0056, 0.0091, 0.0203];
    /// #3b82f6
    pub const SOLID: Rgb = [0.0437, 0.2232, 0.9216];
    /// #22d3ee
    pub const OUTLINE: Rgb = [0.0160, 0.6514, 0.8550];
    /// #444444
    pub const GRID_CENTER: Rgb = [0.0578, 0.0578, 0.0578];
    /// #888888
    pub const GRID: Rgb = [0.2462, 0.2462, 0.2462];
    pub const WHITE: Rgb = [1.0, 1.0, 1.0];
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Shines from here toward the origin.
    pub position: Vec3,
}

impl DirectionalLight {
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: palette::WHITE,
                intensity: 0.6,
            },
            directional: DirectionalLight {
                color: palette::WHITE,
                intensity: 0.8,
                position: Vec3::new(100.0, 100.0, 200.0),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineTopology {
    Strip,
    List,
}

/// Coloured polyline(s) drawn in one call.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBatch {
    pub topology: LineTopology,
    pub positions: Vec<Vec3>,
    pub colors: Vec<Rgb>,
}

impl LineBatch {
    pub fn strip(positions: Vec<Vec3>, color: Rgb) -> Self {
        let colors = vec![color; positions.len()];
        Self {
            topology: LineTopology::Strip,
            positions,
            colors,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Ground grid in the XZ plane centred on the origin, as a line list.
/// The two lines through the origin get the darker centre colour.
pub fn grid_lines(size: f32, divisions: u32) -> LineBatch {
    let half = size / 2.0;
    let step = size / divisions as f32;
    let center = divisions / 2;

    let mut positions = Vec::with_capacity((divisions as usize + 1) * 4);
    let mut colors = Vec::with_capacity(positions.capacity());
    for i in 0..=divisions {
        let pos = -half + i as f32 * step;
        let color = if i == center {
            palette::GRID_CENTER
        } else {
            palette::GRID
        };
        positions.extend_from_slice(&[
            Vec3::new(-half, 0.0, pos),
            Vec3::new(half, 0.0, pos),
            Vec3::new(pos, 0.0, -half),
            Vec3::new(pos, 0.0, half),
        ]);
        colors.extend_from_slice(&[color; 4]);
    }

    LineBatch {
        topology: LineTopology::List,
        positions,
        colors,
    }
}

/// A world-space triangle mesh with a flat material, drawn from both sides.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshDraw {
    pub mesh: TriangleMesh,
    pub color: Rgb,
    pub opacity: f32,
}

/// Everything a backend needs to upload one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescription {
    pub background: Rgb,
    pub lighting: Lighting,
    pub grid: LineBatch,
    pub meshes: Vec<MeshDraw>,
    pub lines: Vec<LineBatch>,
    pub camera: Camera,
    pub framing: Option<CameraFraming>,
}

impl SceneDescription {
    /// Fresh lights and grid, plus the geometry if there is any. The camera is
    /// framed on the primary primitive or left at its default pose.
    pub fn compose(geometry: Option<&FaultGeometry>, aspect: f32) -> Self {
        let mut meshes = Vec::new();
        let mut lines = Vec::new();

        for primitive in geometry.map(|g| g.primitives.as_slice()).unwrap_or_default() {
            match primitive {
                Primitive::Solid(solid) => meshes.push(MeshDraw {
                    mesh: solid.world_mesh(),
                    color: palette::SOLID,
                    opacity: SOLID_OPACITY,
                }),
                Primitive::LineLoop(line) => {
                    lines.push(LineBatch::strip(line.closed_strip(), palette::OUTLINE))
                }
            }
        }

        let mut camera = Camera::with_aspect(aspect);
        let framing = fit_camera(geometry.map(FaultGeometry::primary));
        if let Some(framing) = framing {
            camera.look_at(framing.position, framing.target);
        }

        Self {
            background: palette::BACKGROUND,
            lighting: Lighting::default(),
            grid: grid_lines(GRID_SIZE, GRID_DIVISIONS),
            meshes,
            lines,
            camera,
            framing,
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.len() + self.lines.len()
    }
}

/// Where scenes get drawn. `Resources` is everything one uploaded scene owns;
/// it is handed back to [`SceneBackend::release`] exactly once.
pub trait SceneBackend {
    type Resources;
    type Frame;

    fn upload(&mut self, scene: &SceneDescription) -> Self::Resources;
    fn release(&mut self, resources: Self::Resources);

    /// Reconfigures the drawing surface for `viewport`.
    fn resize(&mut self, viewport: Viewport);

    /// Acquires the next frame, already cleared to the background colour.
    fn begin_frame(&mut self) -> Result<Self::Frame, RenderError>;
    fn draw_scene(&mut self, frame: &mut Self::Frame, resources: &Self::Resources, camera: &Camera);
    fn present(&mut self, frame: Self::Frame);
}

/// One live visualization: its uploaded resources plus the view onto them.
#[derive(Debug)]
pub struct SceneHandle<R> {
    pub resources: R,
    pub camera: Camera,
    pub controls: OrbitControls,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RebuildOutcome {
    /// Increments on every successful rebuild.
    pub generation: u64,
    pub primitives: usize,
    /// Set when the trace could not be turned into geometry; the scene then
    /// holds only lights and grid.
    pub geometry_error: Option<GeometryError>,
    pub framed: bool,
}

/// Owns the drawing backend and the single current scene handle.
pub struct SceneManager<B: SceneBackend> {
    pub(crate) backend: Option<B>,
    pub(crate) current: Option<SceneHandle<B::Resources>>,
    pub(crate) viewport: Viewport,
    generation: u64,
}

impl<B: SceneBackend> Default for SceneManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SceneBackend> SceneManager<B> {
    pub fn new() -> Self {
        Self {
            backend: None,
            current: None,
            viewport: Viewport::default(),
            generation: 0,
        }
    }

    /// Attaches a drawing surface, tearing down a scene built on a previous one.
    pub fn attach(&mut self, backend: B) {
        self.teardown();
        self.backend = Some(backend);
        tracing::info!("drawing surface attached");
    }

    pub fn detach(&mut self) -> Option<B> {
        self.teardown();
        self.backend.take()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    pub fn has_scene(&self) -> bool {
        self.current.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.current.as_ref().map(|h| &h.camera)
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.current.as_mut().map(|h| &mut h.controls)
    }

    /// Full rebuild: the previous handle is released before anything new is
    /// uploaded, so at most one handle is ever live.
    pub fn rebuild(
        &mut self,
        trace: &FaultTrace,
        params: &OrientationParams,
    ) -> Result<RebuildOutcome, SceneError> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(SceneError::MissingSurface);
        };

        if let Some(previous) = self.current.take() {
            backend.release(previous.resources);
        }

        let (geometry, geometry_error) = match build_fault_geometry(trace, params) {
            Ok(geometry) => (Some(geometry), None),
            Err(e) => {
                tracing::warn!(error = %e, "showing empty scene");
                (None, Some(e))
            }
        };

        let scene = SceneDescription::compose(geometry.as_ref(), self.viewport.aspect());
        let resources = backend.upload(&scene);
        let primitives = scene.primitive_count();

        self.generation += 1;
        self.current = Some(SceneHandle {
            resources,
            camera: scene.camera,
            controls: OrbitControls::default(),
        });

        tracing::debug!(
            generation = self.generation,
            primitives,
            camera_target = ?scene.camera.target,
            "scene rebuilt"
        );

        Ok(RebuildOutcome {
            generation: self.generation,
            primitives,
            geometry_error,
            framed: scene.framing.is_some(),
        })
    }

    /// Releases the current handle, if any. The backend stays attached.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.current.take() {
            if let Some(backend) = self.backend.as_mut() {
                backend.release(handle.resources);
            }
            tracing::debug!(generation = self.generation, "scene torn down");
        }
    }

    /// Steps control damping once. Returns whether the camera moved.
    pub fn advance_controls(&mut self) -> bool {
        match self.current.as_mut() {
            Some(handle) => handle.controls.update(&mut handle.camera),
            None => false,
        }
    }

    /// Draws the current scene (or just the background) and hands the frame to
    /// `overlay` before presenting. `Ok(false)` means nothing was drawn.
    pub fn draw_frame(
        &mut self,
        overlay: impl FnOnce(&mut B, &mut B::Frame),
    ) -> Result<bool, RenderError> {
        if !self.viewport.surface_visible {
            return Ok(false);
        }
        let Some(backend) = self.backend.as_mut() else {
            return Ok(false);
        };

        let mut frame = backend.begin_frame()?;
        if let Some(handle) = &self.current {
            backend.draw_scene(&mut frame, &handle.resources, &handle.camera);
        }
        overlay(backend, &mut frame);
        backend.present(frame);
        Ok(true)
    }
}

impl<B: SceneBackend> Drop for SceneManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
