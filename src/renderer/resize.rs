use crate::renderer::scene::{SceneBackend, SceneManager};

pub const FALLBACK_WIDTH: u32 = 600;
pub const FALLBACK_HEIGHT: u32 = 400;

/// Drawable size in physical pixels.
///
/// A zero-sized surface (minimized window) keeps the fallback size for aspect
/// purposes but is marked invisible, so nothing is configured or drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub surface_visible: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
            surface_visible: true,
        }
    }
}

impl Viewport {
    pub fn from_surface(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            Self {
                surface_visible: false,
                ..Self::default()
            }
        } else {
            Self {
                width,
                height,
                surface_visible: true,
            }
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl<B: SceneBackend> SceneManager<B> {
    /// Follows a surface resize: viewport and camera aspect only. Geometry,
    /// camera pose and the render loop are left alone.
    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::from_surface(width, height);
        self.viewport = viewport;

        if let Some(handle) = self.current.as_mut() {
            handle
                .camera
                .set_aspect(viewport.width as f32, viewport.height as f32);
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(viewport);
        }
        tracing::debug!(width, height, visible = viewport.surface_visible, "viewport resized");
    }

    /// Pushes the current viewport to the backend again, e.g. after the
    /// surface was lost.
    pub fn reconfigure(&mut self) {
        let viewport = self.viewport;
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_falls_back() {
        for (w, h) in [(0, 0), (0, 300), (800, 0)] {
            let v = Viewport::from_surface(w, h);
            assert_eq!((v.width, v.height), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
            assert!(!v.surface_visible);
            assert_eq!(v.aspect(), 1.5);
        }
    }

    #[test]
    fn regular_size_is_kept() {
        let v = Viewport::from_surface(1280, 720);
        assert_eq!((v.width, v.height), (1280, 720));
        assert!(v.surface_visible);
        assert!((v.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
