#![cfg(feature = "integration-tests")]

mod common;

use cgmath::Deg;
use cosmic_landscape::{
    camera::{self, Camera, CameraUniform, Projection},
    data_structures::texture::Texture,
    pipelines::{Layouts, Pipelines, bloom::Bloom},
    render::{FrameTargets, encode_frame},
    scene::Scene,
};
use wgpu::util::DeviceExt;

const SIZE: u32 = 64;
const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("smoke-test-device"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .ok()
    })
}

fn camera_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: CameraUniform,
) -> wgpu::BindGroup {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Smoke Camera Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    camera::camera_bind_group(device, layout, &buffer, "smoke_camera")
}

fn read_back(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Vec<u8> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .unwrap();
    rx.recv().unwrap().unwrap();
    slice.get_mapped_range().to_vec()
}

#[test]
fn renders_a_full_frame_offscreen() {
    let Some((device, queue)) = test_device() else {
        eprintln!("no graphics adapter, skipping");
        return;
    };
    let config = common::config();

    let layouts = Layouts::new(&device, camera::camera_bind_group_layout(&device));
    let pipelines = Pipelines::new(&device, &layouts);
    let mut scene = Scene::new(&device, &queue, &layouts, &config, &mut common::rng());
    let bloom = Bloom::new(&device, OUTPUT_FORMAT, [SIZE, SIZE], &config.bloom);

    let view = Camera::new(config.camera.position, Deg(-90.0), Deg(0.0));
    let projection = Projection::new(SIZE, SIZE, Deg(config.camera.fov_y_deg), 0.1, 2000.0);
    let mut main = CameraUniform::new();
    main.update_view_proj(&view, &projection, [SIZE, SIZE]);
    let mut mirror = CameraUniform::new();
    let reflection = scene.reflection_size();
    mirror.update_mirrored(&view, &projection, scene.water_height(), [reflection, reflection]);

    scene.state.update(0.016, 0.016);
    scene.write_buffers(&queue, mirror.view_proj);

    let output = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("smoke_output"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&device, [SIZE, SIZE], "smoke_depth");
    let camera_bg = camera_bind_group(&device, &layouts.camera, main);
    let mirror_bg = camera_bind_group(&device, &layouts.camera, mirror);

    let bytes_per_row = 4 * SIZE;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("smoke_readback"),
        size: (bytes_per_row * SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Smoke Encoder"),
    });
    encode_frame(
        &mut encoder,
        &pipelines,
        &scene,
        &bloom,
        &FrameTargets {
            camera: &camera_bg,
            mirror: &mirror_bg,
            depth: &depth.view,
            output: &output_view,
            clear_colour: wgpu::Color::BLACK,
        },
    );
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &output,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let pixels = read_back(&device, &readback);
    assert_eq!(pixels.len(), (bytes_per_row * SIZE) as usize);
    // tonemapping writes an opaque image
    assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));
}
