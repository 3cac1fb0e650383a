//! Star field: random points in a cube around the origin drawn as sprites.

use rand::{Rng, distr::Open01};
use wgpu::util::DeviceExt;

use crate::{
    config::{StarConfig, srgb_hex},
    pipelines::stars::StarVertex,
};

/// `count` positions with every coordinate in the open interval
/// `(-extent / 2, extent / 2)`.
pub fn generate_star_positions<R: Rng + ?Sized>(
    count: u32,
    extent: f32,
    rng: &mut R,
) -> Vec<StarVertex> {
    let mut coordinate = || (rng.sample::<f32, _>(Open01) - 0.5) * extent;
    (0..count)
        .map(|_| StarVertex {
            position: [coordinate(), coordinate(), coordinate()],
        })
        .collect()
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarsUniform {
    /// rgb, opacity
    pub color: [f32; 4],
    /// world size, minimum size in pixels, reflection clip height, unused
    pub params: [f32; 4],
}

impl StarsUniform {
    pub fn new(config: &StarConfig, water_height: f32) -> Self {
        let [r, g, b] = srgb_hex(config.color);
        Self {
            color: [r, g, b, config.opacity],
            params: [config.size, config.min_pixels, water_height, 0.0],
        }
    }
}

#[derive(Debug)]
pub struct Stars {
    pub vertex_buffer: wgpu::Buffer,
    pub count: u32,
    pub bind_group: wgpu::BindGroup,
}

impl Stars {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        config: &StarConfig,
        water_height: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = generate_star_positions(config.count, config.extent, rng);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Buffer"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform = StarsUniform::new(config, water_height);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Stars Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("stars_bind_group"),
        });
        Self {
            vertex_buffer,
            count: positions.len() as u32,
            bind_group,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(2, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        // one quad of two triangles per star
        pass.draw(0..6, 0..self.count);
    }
}
