//! Fault-plane 3D viewer: turns geographic fault-trace coordinates plus
//! orientation angles into an oriented solid or wireframe and keeps a live,
//! auto-framed view of it.

pub mod config;
pub mod error;
pub mod geo;
pub mod math;
pub mod renderer;
pub mod ui;

pub use config::ViewerConfig;
pub use error::{ConfigError, GeometryError, RenderError, SceneError};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = fmt::layer().with_target(true).with_level(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
