//! Ambient and directional light, fog and the shadow map they share.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    config::{FogConfig, LightConfig, srgb_hex},
    data_structures::texture::Texture,
    pipelines::Layouts,
};

/// Constant depth offset subtracted before the shadow comparison.
const SHADOW_BIAS: f32 = 0.0005;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvironmentUniform {
    pub light_view_proj: [[f32; 4]; 4],
    /// Direction towards the light.
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    /// rgb, exponential-squared density
    pub fog: [f32; 4],
    /// texel size, depth bias
    pub shadow: [f32; 4],
}

impl EnvironmentUniform {
    pub fn new(lights: &LightConfig, fog: &FogConfig) -> Self {
        let sun: Vector3<f32> = lights.sun_position.into();
        let direction = sun.normalize();
        let [lr, lg, lb] = srgb_hex(lights.sun_color).map(|c| c * lights.sun_intensity);
        let [ar, ag, ab] = srgb_hex(lights.ambient_color).map(|c| c * lights.ambient_intensity);
        let [fr, fg, fb] = srgb_hex(fog.color);
        Self {
            light_view_proj: light_view_proj(lights).into(),
            light_direction: [direction.x, direction.y, direction.z, 0.0],
            light_color: [lr, lg, lb, 1.0],
            ambient: [ar, ag, ab, 1.0],
            fog: [fr, fg, fb, fog.density],
            shadow: [1.0 / lights.shadow_map_size.max(1) as f32, SHADOW_BIAS, 0.0, 0.0],
        }
    }

    pub fn sun_direction(&self) -> Vector3<f32> {
        Vector3::new(self.light_direction[0], self.light_direction[1], self.light_direction[2])
    }
}

/// Orthographic projection of the directional light looking at the origin.
///
/// The shadow camera sits on the light ray halfway through the depth range, so
/// casters on both sides of the origin fit between the near and far plane.
pub fn light_view_proj(lights: &LightConfig) -> Matrix4<f32> {
    let direction = Vector3::from(lights.sun_position).normalize();
    let eye = Point3::from_vec(direction * (lights.shadow_near + lights.shadow_far) / 2.0);
    let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
    let e = lights.shadow_extent;
    let projection = cgmath::ortho(-e, e, -e, e, lights.shadow_near, lights.shadow_far);
    OPENGL_TO_WGPU_MATRIX * projection * view
}

/// GPU side of the environment.
#[derive(Debug)]
pub struct Environment {
    pub uniform: EnvironmentUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    /// Uniform only, for the shadow pass.
    pub light_bind_group: wgpu::BindGroup,
    /// Uniform, shadow map and comparison sampler, for shading.
    pub bind_group: wgpu::BindGroup,
}

impl Environment {
    pub fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        lights: &LightConfig,
        fog: &FogConfig,
    ) -> Self {
        let uniform = EnvironmentUniform::new(lights, fog);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Environment Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let shadow_map = Texture::create_shadow_map(device, lights.shadow_map_size);
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.light,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });

        let sampler = shadow_map.sampler.clone().unwrap_or_else(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("shadow_sampler"),
                compare: Some(wgpu::CompareFunction::LessEqual),
                ..Default::default()
            })
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.environment,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("environment_bind_group"),
        });

        Self {
            uniform,
            buffer,
            shadow_map,
            light_bind_group,
            bind_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::{Transform, Vector4};

    use super::*;

    #[test]
    fn light_points_from_the_sun_position() {
        let uniform = EnvironmentUniform::new(&LightConfig::default(), &FogConfig::default());
        let direction = uniform.sun_direction();
        assert_relative_eq!(direction.magnitude(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(direction.y / direction.z, 0.5, epsilon = 1e-6);
        assert_eq!(uniform.fog[3], 0.0008);
        assert_relative_eq!(uniform.shadow[0], 1.0 / 2048.0);
    }

    #[test]
    fn origin_lands_inside_the_shadow_frustum() {
        let matrix = light_view_proj(&LightConfig::default());
        let clip = matrix * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn plants_at_the_patch_edge_are_covered() {
        let matrix = light_view_proj(&LightConfig::default());
        for corner in [[-200.0, 0.0, -200.0], [200.0, 0.0, 200.0], [200.0, 2.0, -200.0]] {
            let p = matrix.transform_point(Point3::from(corner));
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "{:?} outside the shadow map", corner);
            assert!(p.z >= 0.0 && p.z <= 1.0);
        }
    }
}
