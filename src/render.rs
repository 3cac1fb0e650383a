//! Frame composition.
//!
//! A frame is four stages recorded into one encoder:
//!
//! 1. the shadow pass renders the plants into the shadow map from the light
//! 2. the reflection pass renders sky and stars through the mirrored camera
//! 3. the scene pass lights sky, terrain, planet, plants, water and stars into
//!    the HDR target
//! 4. bloom blurs the bright parts back in and tonemaps onto the output

use std::iter;

use crate::{
    context::Context, data_structures::model::DrawMesh, pipelines::Pipelines,
    pipelines::bloom::Bloom, scene::Scene,
};

/// What a frame is recorded with, independent of where the output comes from.
pub struct FrameTargets<'a> {
    pub camera: &'a wgpu::BindGroup,
    pub mirror: &'a wgpu::BindGroup,
    pub depth: &'a wgpu::TextureView,
    pub output: &'a wgpu::TextureView,
    pub clear_colour: wgpu::Color,
}

/// Record every pass of a frame. Works without a surface.
pub fn encode_frame(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &Pipelines,
    scene: &Scene,
    bloom: &Bloom,
    targets: &FrameTargets<'_>,
) {
    shadow_pass(encoder, pipelines, scene);
    reflection_pass(encoder, pipelines, scene, targets);
    scene_pass(encoder, pipelines, scene, bloom.hdr_view(), targets);
    bloom.execute(encoder, targets.output);
}

fn shadow_pass(encoder: &mut wgpu::CommandEncoder, pipelines: &Pipelines, scene: &Scene) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Shadow Pass"),
        color_attachments: &[],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &scene.environment.shadow_map.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });
    // only the plants cast shadows
    pass.set_pipeline(&pipelines.shadow);
    pass.set_bind_group(0, &scene.environment.light_bind_group, &[]);
    scene.plants.draw_geometry(&mut pass);
}

fn reflection_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &Pipelines,
    scene: &Scene,
    targets: &FrameTargets<'_>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Reflection Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &scene.water.reflection.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(targets.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });

    pass.set_pipeline(&pipelines.sky_reflection);
    pass.set_bind_group(0, targets.mirror, &[]);
    pass.set_bind_group(1, &scene.sky.bind_group, &[]);
    pass.draw(0..3, 0..1);

    pass.set_pipeline(&pipelines.stars_reflection);
    pass.set_bind_group(1, &scene.environment.bind_group, &[]);
    scene.stars.draw(&mut pass);
}

fn scene_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &Pipelines,
    scene: &Scene,
    hdr: &wgpu::TextureView,
    targets: &FrameTargets<'_>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: hdr,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(targets.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: targets.depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });

    pass.set_pipeline(&pipelines.sky);
    pass.set_bind_group(0, targets.camera, &[]);
    pass.set_bind_group(1, &scene.sky.bind_group, &[]);
    pass.draw(0..3, 0..1);

    pass.set_pipeline(&pipelines.lit);
    pass.set_bind_group(1, &scene.environment.bind_group, &[]);
    for prop in [&scene.terrain, &scene.planet, &scene.plants] {
        prop.draw(&mut pass);
    }

    pass.set_pipeline(&pipelines.water);
    pass.set_bind_group(2, &scene.water.bind_group, &[]);
    pass.draw_mesh_instanced(&scene.water.mesh, 0..1);

    // blended last so they only show where nothing opaque was drawn
    pass.set_pipeline(&pipelines.stars);
    scene.stars.draw(&mut pass);
}

/// Render one frame onto the window surface.
pub fn render(ctx: &Context, scene: &Scene, bloom: &Bloom) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    let targets = FrameTargets {
        camera: &ctx.camera.bind_group,
        mirror: &ctx.mirror.bind_group,
        depth: &ctx.depth_texture.view,
        output: &view,
        clear_colour: ctx.clear_colour,
    };
    encode_frame(&mut encoder, &ctx.pipelines, scene, bloom, &targets);

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
