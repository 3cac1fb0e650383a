use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{
        Layouts,
        basic::{
            PipelineDesc, depth_state, mk_render_pipeline, sampler_entry, texture_entry,
            uniform_entry,
        },
    },
};

/// Water uniform, normal map and reflection target (group 2 of the water pipeline).
pub fn water_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            texture_entry(1),
            sampler_entry(2),
            texture_entry(3),
            sampler_entry(4),
        ],
        label: Some("water_bind_group_layout"),
    })
}

pub fn mk_water_pipeline(device: &wgpu::Device, layouts: &Layouts) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Water Pipeline Layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.environment, &layouts.water],
        immediate_size: 0,
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Water Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("water.wgsl").into()),
    });

    mk_render_pipeline(
        device,
        PipelineDesc {
            label: "Water Pipeline",
            layout: &layout,
            shader: &shader,
            vertex_layouts: &[ModelVertex::desc()],
            fragment: Some(("fs_main", Texture::HDR_FORMAT)),
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            cull_mode: None,
        },
    )
}
