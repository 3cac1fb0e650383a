//! Preetham daylight sky.
//!
//! The per-pixel scattering runs in `sky.wgsl`. Everything that only depends on
//! the configuration and the sun direction is evaluated once here.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::config::SkyConfig;

/// Rayleigh total scattering coefficients for the primaries (680, 550, 450 nm).
const TOTAL_RAYLEIGH: [f32; 3] = [
    5.804_542_996_261_093e-6,
    1.356_291_141_984_563_5e-5,
    3.026_590_246_882_487_6e-5,
];
/// `pi * ((2 pi / lambda)^(v - 2)) * K` for the same primaries.
const MIE_CONST: [f32; 3] = [
    1.839_991_851_443_397_8e14,
    2.779_802_391_966_052_8e14,
    4.079_047_954_386_109_4e14,
];
/// Angle beyond which the sun stops contributing, slightly past the horizon.
const CUTOFF_ANGLE: f32 = 1.611_073_155_687_073_4;
const STEEPNESS: f32 = 1.5;
const EE: f32 = 1000.0;

/// Solar irradiance for a sun at `cos_zenith` (cosine of its zenith angle).
pub fn sun_intensity(cos_zenith: f32) -> f32 {
    let zenith_angle = cos_zenith.clamp(-1.0, 1.0).acos();
    EE * (1.0 - (-((CUTOFF_ANGLE - zenith_angle) / STEEPNESS)).exp()).max(0.0)
}

/// Mie scattering coefficients for the given turbidity.
pub fn total_mie(turbidity: f32) -> [f32; 3] {
    let c = (0.2 * turbidity) * 10e-18;
    MIE_CONST.map(|k| 0.434 * c * k)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    /// direction towards the sun, sun intensity
    pub sun: [f32; 4],
    /// rayleigh coefficients, sun fade
    pub beta_r: [f32; 4],
    /// mie coefficients, mie directional g
    pub beta_m: [f32; 4],
    pub up: [f32; 4],
}

impl SkyUniform {
    pub fn new(config: &SkyConfig, sun_direction: Vector3<f32>) -> Self {
        let sun = sun_direction.normalize();
        let up = Vector3::unit_y();
        let sun_e = sun_intensity(sun.dot(up));
        let sun_fade = 1.0 - (1.0 - (sun.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh = config.rayleigh - (1.0 - sun_fade);
        let beta_r = TOTAL_RAYLEIGH.map(|k| k * rayleigh);
        let beta_m = total_mie(config.turbidity).map(|k| k * config.mie_coefficient);
        Self {
            sun: [sun.x, sun.y, sun.z, sun_e],
            beta_r: [beta_r[0], beta_r[1], beta_r[2], sun_fade],
            beta_m: [beta_m[0], beta_m[1], beta_m[2], config.mie_directional_g],
            up: [up.x, up.y, up.z, 0.0],
        }
    }
}

#[derive(Debug)]
pub struct Sky {
    pub uniform: SkyUniform,
    pub bind_group: wgpu::BindGroup,
}

impl Sky {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        config: &SkyConfig,
        sun_direction: Vector3<f32>,
    ) -> Self {
        let uniform = SkyUniform::new(config, sun_direction);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("sky_bind_group"),
        });
        Self { uniform, bind_group }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn sun_below_the_cutoff_gives_no_light() {
        assert_eq!(sun_intensity(-1.0), 0.0);
        assert_eq!(sun_intensity(-0.5), 0.0);
    }

    #[test]
    fn overhead_sun_is_brightest() {
        let zenith = sun_intensity(1.0);
        assert!(zenith > 600.0);
        assert!(zenith > sun_intensity(0.5));
        assert!(sun_intensity(0.5) > sun_intensity(0.0));
    }

    #[test]
    fn uniform_carries_the_config() {
        let uniform = SkyUniform::new(&SkyConfig::default(), Vector3::new(0.0, 50.0, 100.0));
        let sun = Vector3::new(uniform.sun[0], uniform.sun[1], uniform.sun[2]);
        assert_relative_eq!(sun.magnitude(), 1.0, epsilon = 1e-6);
        assert_eq!(uniform.beta_m[3], 0.8);
        // a unit sun direction barely fades
        assert_relative_eq!(uniform.beta_r[3], 1.0, epsilon = 1e-5);
        assert_relative_eq!(uniform.beta_r[0], TOTAL_RAYLEIGH[0] * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn turbidity_scales_mie() {
        let low = total_mie(2.0);
        let high = total_mie(10.0);
        assert_relative_eq!(high[1] / low[1], 5.0, epsilon = 1e-4);
    }
}
