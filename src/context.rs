//! The GPU and window context: surface, device, queue, cameras and pipelines.

use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, Camera, CameraResources, CameraUniform, Projection},
    config::LandscapeConfig,
    data_structures::texture::Texture,
    pipelines::{Layouts, Pipelines},
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    /// The camera mirrored at the water surface, for the reflection pass.
    pub mirror: CameraResources,
    pub projection: Projection,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    /// Cleared behind the sky; only visible where the sky does not cover.
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, landscape: &LandscapeConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter is compatible with the surface")?;
        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("cosmic-landscape-device"),
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // bloom tonemaps into an sRGB surface
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let view = &landscape.camera;
        let camera = Camera::new(view.position, cgmath::Deg(-90.0), cgmath::Deg(0.0));
        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(view.fov_y_deg),
            view.near,
            view.far,
        );

        let camera_layout = camera::camera_bind_group_layout(&device);
        let main = camera_resources(&device, &camera_layout, camera.clone(), "camera");
        let mirror = camera_resources(&device, &camera_layout, camera, "mirror_camera");

        let layouts = Layouts::new(&device, camera_layout);
        let pipelines = Pipelines::new(&device, &layouts);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let [r, g, b] = crate::config::srgb_hex(landscape.fog.color);
        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera: main,
            mirror,
            projection,
            layouts,
            pipelines,
            clear_colour: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Follow a new window size. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    /// Upload the main camera and its mirror image at `water_height`.
    pub fn update_camera(&mut self, water_height: f32, reflection_size: u32) {
        let size = self.size();
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection, size);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );

        self.mirror.camera = self.camera.camera.clone();
        self.mirror.uniform.update_mirrored(
            &self.mirror.camera,
            &self.projection,
            water_height,
            [reflection_size, reflection_size],
        );
        self.queue.write_buffer(
            &self.mirror.buffer,
            0,
            bytemuck::cast_slice(&[self.mirror.uniform]),
        );
    }
}

fn camera_resources(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    camera: Camera,
    label: &str,
) -> CameraResources {
    let uniform = CameraUniform::new();
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Buffer", label)),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group =
        camera::camera_bind_group(device, layout, &buffer, &format!("{}_bind_group", label));
    CameraResources {
        camera,
        uniform,
        buffer,
        bind_group,
    }
}
