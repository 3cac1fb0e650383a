//! Bloom post-processing.
//!
//! The scene is lit into a full-resolution HDR target. Bloom extracts its bright
//! part, blurs it through a chain of half-resolution mips, adds it back onto the
//! HDR target and finally tonemaps the result onto the surface.

use wgpu::util::DeviceExt;

use crate::{config::BloomConfig, data_structures::texture::Texture};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomParams {
    pub threshold: f32,
    pub soft_knee: f32,
    pub strength: f32,
    pub radius: f32,
}

impl From<&BloomConfig> for BloomParams {
    fn from(config: &BloomConfig) -> Self {
        Self {
            threshold: config.threshold,
            soft_knee: config.soft_knee,
            strength: config.strength,
            radius: config.radius,
        }
    }
}

/// Sizes of the blur mips for a `width` x `height` target: each level halves
/// the previous one, never below one pixel.
pub fn mip_sizes(width: u32, height: u32, iterations: u32) -> Vec<[u32; 2]> {
    let mut w = (width / 2).max(1);
    let mut h = (height / 2).max(1);
    let mut sizes = Vec::with_capacity(iterations as usize);
    for _ in 0..iterations {
        sizes.push([w, h]);
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

struct Target {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

pub struct Bloom {
    iterations: u32,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_bind_group: wgpu::BindGroup,
    extract: wgpu::RenderPipeline,
    downsample: wgpu::RenderPipeline,
    upsample: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    tonemap: wgpu::RenderPipeline,
    hdr: Target,
    mips: Vec<Target>,
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bloom")
            .field("iterations", &self.iterations)
            .field("mips", &self.mips.len())
            .finish()
    }
}

impl Bloom {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        size: [u32; 2],
        config: &BloomConfig,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("bloom.wgsl").into()),
        });

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_params_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(16),
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&params_layout, &texture_layout],
            immediate_size: 0,
        });

        let additive = Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        });
        let pipeline = |entry: &str, format, blend| {
            fullscreen_pipeline(device, &shader, &layout, entry, format, blend)
        };
        let extract = pipeline("fs_extract", Texture::HDR_FORMAT, None);
        let downsample = pipeline("fs_downsample", Texture::HDR_FORMAT, None);
        let upsample = pipeline("fs_upsample", Texture::HDR_FORMAT, additive);
        let composite = pipeline("fs_composite", Texture::HDR_FORMAT, additive);
        let tonemap = pipeline("fs_tonemap", surface_format, None);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom_params"),
            contents: bytemuck::cast_slice(&[BloomParams::from(config)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom_params_bind_group"),
            layout: &params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let hdr = create_target(device, &texture_layout, &sampler, size, "bloom_hdr");
        let mips = create_mips(device, &texture_layout, &sampler, size, config.iterations);

        Self {
            iterations: config.iterations,
            texture_layout,
            sampler,
            params_bind_group,
            extract,
            downsample,
            upsample,
            composite,
            tonemap,
            hdr,
            mips,
        }
    }

    /// The HDR target the scene pass renders into.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr.view
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        self.hdr = create_target(device, &self.texture_layout, &self.sampler, size, "bloom_hdr");
        self.mips = create_mips(device, &self.texture_layout, &self.sampler, size, self.iterations);
    }

    /// Extract, downsample, upsample, composite and tonemap onto `surface_view`.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let clear = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT);
        if let Some(first) = self.mips.first() {
            self.run_pass(
                encoder,
                &self.extract,
                &self.hdr.bind_group,
                &first.view,
                clear,
                "bloom_extract",
            );
            for pair in self.mips.windows(2) {
                self.run_pass(
                    encoder,
                    &self.downsample,
                    &pair[0].bind_group,
                    &pair[1].view,
                    clear,
                    "bloom_downsample",
                );
            }
            for pair in self.mips.windows(2).rev() {
                self.run_pass(
                    encoder,
                    &self.upsample,
                    &pair[1].bind_group,
                    &pair[0].view,
                    wgpu::LoadOp::Load,
                    "bloom_upsample",
                );
            }
            self.run_pass(
                encoder,
                &self.composite,
                &first.bind_group,
                &self.hdr.view,
                wgpu::LoadOp::Load,
                "bloom_composite",
            );
        }
        self.run_pass(
            encoder,
            &self.tonemap,
            &self.hdr.bind_group,
            surface_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            "bloom_tonemap",
        );
    }

    fn run_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        source: &wgpu::BindGroup,
        target: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, source, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn create_target(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: [u32; 2],
    label: &str,
) -> Target {
    let texture = Texture::create_render_target(device, size, label);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    Target {
        view: texture.view,
        bind_group,
    }
}

fn create_mips(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: [u32; 2],
    iterations: u32,
) -> Vec<Target> {
    mip_sizes(size[0], size[1], iterations)
        .into_iter()
        .enumerate()
        .map(|(i, mip)| {
            log::trace!("Bloom mip {}: {}x{}", i, mip[0], mip[1]);
            create_target(device, layout, sampler, mip, "bloom_mip")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_halves_each_level() {
        assert_eq!(
            mip_sizes(1920, 1080, 5),
            vec![[960, 540], [480, 270], [240, 135], [120, 67], [60, 33]]
        );
    }

    #[test]
    fn mip_chain_never_reaches_zero() {
        let sizes = mip_sizes(4, 2, 4);
        assert_eq!(sizes, vec![[2, 1], [1, 1], [1, 1], [1, 1]]);
    }

    #[test]
    fn params_follow_the_config() {
        let params = BloomParams::from(&BloomConfig::default());
        assert_eq!(params.strength, 1.5);
        assert_eq!(params.radius, 0.5);
        assert_eq!(params.threshold, 0.0);
        assert_eq!(std::mem::size_of::<BloomParams>(), 16);
    }
}
