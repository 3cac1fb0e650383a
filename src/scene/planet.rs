//! The gas giant hanging over the landscape.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use crate::{
    config::PlanetConfig,
    data_structures::{geometry::MeshData, instance::Instance},
    pipelines::lit::MaterialUniform,
    scene::Prop,
};

/// Planet transform for the current spin angle.
pub fn instance(position: Vector3<f32>, rotation_y: Rad<f32>) -> Instance {
    Instance {
        position,
        rotation: Quaternion::from_angle_y(rotation_y),
        emissive: 0.0,
    }
}

pub fn build(
    device: &wgpu::Device,
    material_layout: &wgpu::BindGroupLayout,
    config: &PlanetConfig,
) -> Prop {
    let mesh =
        MeshData::sphere(config.radius, config.segments, config.segments).upload(device, "planet");
    let material = MaterialUniform::new(config.color, config.roughness, config.metalness);
    Prop::new(
        device,
        material_layout,
        mesh,
        material,
        &[instance(config.position.into(), Rad(0.0)).to_raw()],
        "planet",
    )
}
