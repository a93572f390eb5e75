use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::{RenderError, SceneError};
use crate::renderer::camera::Camera;
use crate::renderer::resize::Viewport;
use crate::renderer::scene::{
    LineBatch, LineTopology, Lighting, MeshDraw, Rgb, SceneBackend, SceneDescription,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// rgb already scaled by intensity
    pub ambient: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
}

impl SceneUniform {
    pub fn new(camera: &Camera, lighting: &Lighting) -> Self {
        let scaled = |c: Rgb, i: f32| [c[0] * i, c[1] * i, c[2] * i, 1.0];
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            ambient: scaled(lighting.ambient.color, lighting.ambient.intensity),
            light_dir: lighting.directional.direction().extend(0.0).to_array(),
            light_color: scaled(lighting.directional.color, lighting.directional.intensity),
        }
    }
}

fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn line_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn mesh_vertices(draw: &MeshDraw) -> Vec<MeshVertex> {
    let [r, g, b] = draw.color;
    draw.mesh
        .positions()
        .zip(draw.mesh.normal_vectors())
        .map(|(p, n)| MeshVertex {
            position: p.to_array(),
            normal: n.to_array(),
            color: [r, g, b, draw.opacity],
        })
        .collect()
}

fn line_vertices(batch: &LineBatch) -> Vec<LineVertex> {
    batch
        .positions
        .iter()
        .zip(&batch.colors)
        .map(|(p, [r, g, b])| LineVertex {
            position: p.to_array(),
            color: [*r, *g, *b, 1.0],
        })
        .collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuLines {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    topology: LineTopology,
}

/// GPU side of one scene handle.
pub struct SceneResources {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    lighting: Lighting,
    grid: Option<GpuLines>,
    lines: Vec<GpuLines>,
    meshes: Vec<GpuMesh>,
}

impl SceneResources {
    fn buffers(&self) -> impl Iterator<Item = &wgpu::Buffer> {
        std::iter::once(&self.uniform_buffer)
            .chain(self.grid.iter().chain(&self.lines).map(|l| &l.vertex_buffer))
            .chain(
                self.meshes
                    .iter()
                    .flat_map(|m| [&m.vertex_buffer, &m.index_buffer]),
            )
    }
}

pub struct GpuFrame {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub viewport: Viewport,

    pipeline_mesh: wgpu::RenderPipeline,
    pipeline_line_strip: wgpu::RenderPipeline,
    pipeline_line_list: wgpu::RenderPipeline,
    scene_bind_group_layout: wgpu::BindGroupLayout,

    background: wgpu::Color,
    depth_texture: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, SceneError> {
        let size = window.inner_size();
        let viewport = Viewport::from_surface(size.width, size.height);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SceneError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU initialised");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.width,
            height: viewport.height,
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline_mesh = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                buffers: &[mesh_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let line_pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_line"),
                    buffers: &[line_vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_line"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let pipeline_line_strip =
            line_pipeline("Line Strip Pipeline", wgpu::PrimitiveTopology::LineStrip);
        let pipeline_line_list =
            line_pipeline("Line List Pipeline", wgpu::PrimitiveTopology::LineList);

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            viewport,
            pipeline_mesh,
            pipeline_line_strip,
            pipeline_line_list,
            scene_bind_group_layout,
            background: wgpu::Color::BLACK,
            depth_texture,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        if self.viewport.surface_visible {
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn upload_lines(&self, label: &str, batch: &LineBatch) -> Option<GpuLines> {
        // a strip needs two points, a list needs a full segment
        if batch.vertex_count() < 2 {
            return None;
        }
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&line_vertices(batch)),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Some(GpuLines {
            vertex_buffer,
            vertex_count: batch.vertex_count() as u32,
            topology: batch.topology,
        })
    }

    fn upload_mesh(&self, draw: &MeshDraw) -> Option<GpuMesh> {
        if draw.mesh.indices.is_empty() {
            return None;
        }
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh_vertices(draw)),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&draw.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: draw.mesh.indices.len() as u32,
        })
    }
}

impl SceneBackend for GpuState {
    type Resources = SceneResources;
    type Frame = GpuFrame;

    fn upload(&mut self, scene: &SceneDescription) -> SceneResources {
        let [r, g, b] = scene.background;
        self.background = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };

        let uniform = SceneUniform::new(&scene.camera, &scene.lighting);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Uniform Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &self.scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        SceneResources {
            uniform_buffer,
            bind_group,
            lighting: scene.lighting,
            grid: self.upload_lines("Grid Vertex Buffer", &scene.grid),
            lines: scene
                .lines
                .iter()
                .filter_map(|l| self.upload_lines("Outline Vertex Buffer", l))
                .collect(),
            meshes: scene.meshes.iter().filter_map(|m| self.upload_mesh(m)).collect(),
        }
    }

    fn release(&mut self, resources: SceneResources) {
        for buffer in resources.buffers() {
            buffer.destroy();
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !viewport.surface_visible {
            return;
        }
        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
    }

    fn begin_frame(&mut self) -> Result<GpuFrame, RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::Timeout),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        Ok(GpuFrame {
            output,
            view,
            encoder,
        })
    }

    fn draw_scene(&mut self, frame: &mut GpuFrame, resources: &SceneResources, camera: &Camera) {
        let uniform = SceneUniform::new(camera, &resources.lighting);
        self.queue
            .write_buffer(&resources.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &resources.bind_group, &[]);

        for lines in resources.grid.iter().chain(&resources.lines) {
            let pipeline = match lines.topology {
                LineTopology::Strip => &self.pipeline_line_strip,
                LineTopology::List => &self.pipeline_line_list,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_vertex_buffer(0, lines.vertex_buffer.slice(..));
            render_pass.draw(0..lines.vertex_count, 0..1);
        }

        // translucent, so after everything opaque
        render_pass.set_pipeline(&self.pipeline_mesh);
        for mesh in &resources.meshes {
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn present(&mut self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }
}

/// First sRGB format, else whatever the surface lists first.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat, SceneError> {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or(formats.first())
        .copied()
        .ok_or(SceneError::UnsupportedSurface)
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TriangleMesh;
    use crate::renderer::scene::palette;
    use glam::Vec3;

    #[test]
    fn vertex_strides_match_layouts() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 40);
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
        assert_eq!(std::mem::size_of::<SceneUniform>(), 128);
    }

    #[test]
    fn surface_format_prefers_srgb() {
        let formats = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(
            pick_surface_format(&formats).unwrap(),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
        assert_eq!(
            pick_surface_format(&formats[..1]).unwrap(),
            wgpu::TextureFormat::Bgra8Unorm
        );
    }

    #[test]
    fn surface_without_formats_is_unsupported() {
        assert!(matches!(
            pick_surface_format(&[]),
            Err(SceneError::UnsupportedSurface)
        ));
    }

    #[test]
    fn mesh_vertices_carry_opacity() {
        let mut mesh = TriangleMesh::default();
        let a = mesh.push_vertex(Vec3::ZERO, Vec3::Z);
        let b = mesh.push_vertex(Vec3::X, Vec3::Z);
        let c = mesh.push_vertex(Vec3::Y, Vec3::Z);
        mesh.push_triangle(a, b, c);
        let draw = MeshDraw {
            mesh,
            color: palette::SOLID,
            opacity: 0.7,
        };
        let vertices = mesh_vertices(&draw);
        assert_eq!(vertices.len(), 3);
        assert!(vertices.iter().all(|v| v.color[3] == 0.7));
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn uniform_scales_light_by_intensity() {
        let uniform = SceneUniform::new(&Camera::default(), &Lighting::default());
        assert!((uniform.ambient[0] - 0.6).abs() < 1e-6);
        assert!((uniform.light_color[1] - 0.8).abs() < 1e-6);
        let dir = glam::Vec3::from_slice(&uniform.light_dir[..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.z < 0.0);
    }
}
