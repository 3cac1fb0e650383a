use crate::{
    data_structures::{model::Vertex, texture::Texture},
    pipelines::{
        Layouts,
        basic::{PipelineDesc, depth_state, mk_render_pipeline, uniform_entry},
    },
};

/// One star position, read once per instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
}

impl Vertex for StarVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

pub fn stars_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
        label: Some("stars_bind_group_layout"),
    })
}

/// Alpha-blended star quads. The reflection variant renders without depth and
/// drops stars below the water.
pub fn mk_stars_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    reflection: bool,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Stars Pipeline Layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.environment, &layouts.stars],
        immediate_size: 0,
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Stars Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("stars.wgsl").into()),
    });

    let (label, entry_point, depth_stencil) = if reflection {
        ("Stars Reflection Pipeline", "fs_reflect", None)
    } else {
        (
            "Stars Pipeline",
            "fs_main",
            Some(depth_state(false, wgpu::CompareFunction::Less)),
        )
    };

    mk_render_pipeline(
        device,
        PipelineDesc {
            label,
            layout: &layout,
            shader: &shader,
            vertex_layouts: &[StarVertex::desc()],
            fragment: Some((entry_point, Texture::HDR_FORMAT)),
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_stencil,
            cull_mode: None,
        },
    )
}
