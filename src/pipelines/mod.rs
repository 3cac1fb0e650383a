//! Render pipelines of the landscape.
//!
//! - `basic` holds the shared pipeline builder and bind group layout entries
//! - `lit` shades terrain, planet and plants with the directional light and fog
//! - `shadow` renders shadow casters into the light's depth map
//! - `water` is the reflective, normal-mapped water plane
//! - `sky` draws the atmospheric scattering sky behind everything
//! - `stars` draws the point-like star field
//! - `bloom` post-processes the HDR scene onto the surface

pub mod basic;
pub mod bloom;
pub mod lit;
pub mod shadow;
pub mod sky;
pub mod stars;
pub mod water;

use basic::uniform_entry;

/// Every bind group layout the pipelines are built from.
#[derive(Debug)]
pub struct Layouts {
    pub camera: wgpu::BindGroupLayout,
    /// Environment uniform alone, used while the shadow map is the render target.
    pub light: wgpu::BindGroupLayout,
    /// Environment uniform plus the shadow map and its comparison sampler.
    pub environment: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub water: wgpu::BindGroupLayout,
    pub sky: wgpu::BindGroupLayout,
    pub stars: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device, camera: wgpu::BindGroupLayout) -> Self {
        let light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            label: Some("light_bind_group_layout"),
        });
        let environment = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("environment_bind_group_layout"),
        });
        Self {
            camera,
            light,
            environment,
            material: lit::material_layout(device),
            water: water::water_layout(device),
            sky: sky::sky_layout(device),
            stars: stars::stars_layout(device),
        }
    }
}

/// All scene pipelines, created once per context.
#[derive(Debug)]
pub struct Pipelines {
    pub shadow: wgpu::RenderPipeline,
    pub lit: wgpu::RenderPipeline,
    pub water: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    pub sky_reflection: wgpu::RenderPipeline,
    pub stars: wgpu::RenderPipeline,
    pub stars_reflection: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, layouts: &Layouts) -> Self {
        log::debug!("Creating scene pipelines");
        Self {
            shadow: shadow::mk_shadow_pipeline(device, layouts),
            lit: lit::mk_lit_pipeline(device, layouts),
            water: water::mk_water_pipeline(device, layouts),
            sky: sky::mk_sky_pipeline(device, layouts, true),
            sky_reflection: sky::mk_sky_pipeline(device, layouts, false),
            stars: stars::mk_stars_pipeline(device, layouts, false),
            stars_reflection: stars::mk_stars_pipeline(device, layouts, true),
        }
    }
}
