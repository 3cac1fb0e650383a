//! Lit, fogged geometry that may receive the directional shadow.

use wgpu::util::DeviceExt;

use crate::{
    config::srgb_hex,
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{
        Layouts,
        basic::{PipelineDesc, depth_state, mk_render_pipeline, uniform_entry},
    },
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// roughness, metalness, receives shadow (0 or 1), unused
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn new(color: u32, roughness: f32, metalness: f32) -> Self {
        let [r, g, b] = srgb_hex(color);
        Self {
            color: [r, g, b, 1.0],
            emissive: [0.0; 4],
            params: [roughness, metalness, 0.0, 0.0],
        }
    }

    pub fn with_emissive(mut self, emissive: u32) -> Self {
        let [r, g, b] = srgb_hex(emissive);
        self.emissive = [r, g, b, 1.0];
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.params[2] = 1.0;
        self
    }
}

/// A material uniform with its bind group (group 2 of the lit pipeline).
#[derive(Debug)]
pub struct Material {
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: MaterialUniform,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", label)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} Material Bind Group", label)),
        });
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        label: Some("material_bind_group_layout"),
    })
}

pub fn mk_lit_pipeline(device: &wgpu::Device, layouts: &Layouts) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lit Pipeline Layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.environment, &layouts.material],
        immediate_size: 0,
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Lit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("lit.wgsl").into()),
    });

    mk_render_pipeline(
        device,
        PipelineDesc {
            label: "Lit Pipeline",
            layout: &layout,
            shader: &shader,
            vertex_layouts: &[ModelVertex::desc(), InstanceRaw::desc()],
            fragment: Some(("fs_main", Texture::HDR_FORMAT)),
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            cull_mode: Some(wgpu::Face::Back),
        },
    )
}
