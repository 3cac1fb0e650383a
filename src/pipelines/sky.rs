use crate::{
    data_structures::texture::Texture,
    pipelines::{
        Layouts,
        basic::{PipelineDesc, depth_state, mk_render_pipeline, uniform_entry},
    },
};

pub fn sky_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        label: Some("sky_bind_group_layout"),
    })
}

/// The sky pipeline. With `depth` it draws behind everything in the scene pass,
/// without it draws into the depth-less reflection target.
pub fn mk_sky_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    depth: bool,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.sky],
        immediate_size: 0,
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sky.wgsl").into()),
    });

    mk_render_pipeline(
        device,
        PipelineDesc {
            label: if depth { "Sky Pipeline" } else { "Sky Reflection Pipeline" },
            layout: &layout,
            shader: &shader,
            vertex_layouts: &[],
            fragment: Some(("fs_main", Texture::HDR_FORMAT)),
            blend: Some(wgpu::BlendState::REPLACE),
            // drawn first, so it neither tests nor writes depth
            depth_stencil: depth.then(|| depth_state(false, wgpu::CompareFunction::Always)),
            cull_mode: None,
        },
    )
}
