//! Reflective water plane.
//!
//! The water samples two textures: a tiling normal map that scrolls with time, and
//! the reflection target the mirrored sky and stars are rendered into each frame.

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    config::{WaterConfig, srgb_hex},
    data_structures::{
        geometry::MeshData,
        model::Mesh,
        texture::{self, Texture},
    },
};

/// Side length of the neutral normal map used until the real one has loaded.
const NEUTRAL_NORMAL_SIZE: u32 = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub mirror_view_proj: [[f32; 4]; 4],
    pub sun_color: [f32; 4],
    pub water_color: [f32; 4],
    /// time, distortion scale, normal map scale, alpha
    pub params: [f32; 4],
    /// surface height, unused
    pub surface: [f32; 4],
}

impl WaterUniform {
    pub fn new(config: &WaterConfig) -> Self {
        let [sr, sg, sb] = srgb_hex(config.sun_color);
        let [wr, wg, wb] = srgb_hex(config.water_color);
        Self {
            mirror_view_proj: Matrix4::<f32>::identity().into(),
            sun_color: [sr, sg, sb, 1.0],
            water_color: [wr, wg, wb, 1.0],
            params: [0.0, config.distortion_scale, 1.0, 1.0],
            surface: [config.height, 0.0, 0.0, 0.0],
        }
    }

    pub fn time(&self) -> f32 {
        self.params[0]
    }

    pub fn set_time(&mut self, time: f32) {
        self.params[0] = time;
    }
}

#[derive(Debug)]
pub struct Water {
    pub mesh: Mesh,
    pub uniform: WaterUniform,
    pub buffer: wgpu::Buffer,
    pub reflection: Texture,
    normals: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl Water {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        config: &WaterConfig,
    ) -> Self {
        let mesh = MeshData::plane(config.size, config.size, 1, 1).upload(device, "water");
        let uniform = WaterUniform::new(config);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let size = config.texture_size;
        let reflection = Texture::create_render_target(device, [size, size], "water_reflection");
        let normals = Texture::create_default_normal_map(
            NEUTRAL_NORMAL_SIZE,
            NEUTRAL_NORMAL_SIZE,
            device,
            queue,
        );
        let bind_group = water_bind_group(device, layout, &buffer, &normals, &reflection);

        Self {
            mesh,
            uniform,
            buffer,
            reflection,
            normals,
            bind_group,
        }
    }

    /// Replace the neutral normal map with a loaded one.
    pub fn set_normals(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        normals: Texture,
    ) {
        self.normals = normals;
        self.bind_group = water_bind_group(
            device,
            layout,
            &self.buffer,
            &self.normals,
            &self.reflection,
        );
    }

    pub fn write_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

fn water_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    normals: &Texture,
    reflection: &Texture,
) -> wgpu::BindGroup {
    let sampler_of = |t: &Texture| {
        t.sampler
            .clone()
            .unwrap_or_else(|| texture::create_repeat_sampler(device))
    };
    let normal_sampler = sampler_of(normals);
    let reflection_sampler = sampler_of(reflection);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&normals.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&normal_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&reflection.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&reflection_sampler),
            },
        ],
        label: Some("water_bind_group"),
    })
}
