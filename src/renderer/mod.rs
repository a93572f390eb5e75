pub mod camera;
pub mod controls;
pub mod gpu;
pub mod render_loop;
pub mod resize;
pub mod scene;

pub use camera::Camera;
pub use controls::OrbitControls;
pub use gpu::{GpuFrame, GpuState, SceneResources};
pub use render_loop::{FrameStatus, RenderLoop, StopHandle};
pub use resize::Viewport;
pub use scene::{
    LineBatch, LineTopology, Lighting, MeshDraw, RebuildOutcome, SceneBackend, SceneDescription,
    SceneHandle, SceneManager, grid_lines, hex_color, palette,
};
