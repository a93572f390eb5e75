use std::path::PathBuf;

use thiserror::Error;

use crate::math::Mechanism;

/// Geometry could not be built from the supplied trace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{mechanism} geometry needs at least {required} points, got {found}")]
    NotEnoughPoints {
        mechanism: Mechanism,
        required: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum SceneError {
    /// No drawing surface is attached; nothing was built.
    #[error("no drawing surface attached")]
    MissingSurface,

    #[error("failed to create drawing surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter")]
    NoAdapter,

    #[error("surface reports no supported texture formats")]
    UnsupportedSurface,

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Per-frame surface failures. Handled inside the render loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("surface lost or outdated")]
    SurfaceLost,

    #[error("timed out acquiring the next frame")]
    Timeout,

    #[error("out of GPU memory")]
    OutOfMemory,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
