//! Procedural terrain: a grid in the XZ plane displaced by a sine/cosine heightmap
//! plus uniform noise.

use rand::Rng;

use crate::{
    config::TerrainConfig,
    data_structures::{geometry::MeshData, instance::Instance},
    pipelines::lit::MaterialUniform,
    scene::Prop,
};

/// Smooth part of the height field at `(x, z)`.
pub fn base_height(config: &TerrainConfig, x: f32, z: f32) -> f32 {
    (x * config.frequency).sin() * (z * config.frequency).cos() * config.amplitude
}

/// Height of the vertex at `(x, z)` given its noise sample.
pub fn height_at(config: &TerrainConfig, x: f32, z: f32, noise: f32) -> f32 {
    base_height(config, x, z) + noise
}

/// Build the displaced grid. Every vertex draws one noise sample in `[0, config.noise)`.
pub fn generate_heightmap<R: Rng + ?Sized>(config: &TerrainConfig, rng: &mut R) -> MeshData {
    let mut mesh = MeshData::plane(config.size, config.size, config.segments, config.segments);
    for vertex in mesh.vertices.iter_mut() {
        let [x, _, z] = vertex.position;
        let noise = rng.random::<f32>() * config.noise;
        vertex.position[1] = height_at(config, x, z, noise);
    }
    mesh.compute_vertex_normals();
    mesh
}

pub fn build(
    device: &wgpu::Device,
    material_layout: &wgpu::BindGroupLayout,
    config: &TerrainConfig,
    rng: &mut impl Rng,
) -> Prop {
    let mesh = generate_heightmap(config, rng);
    log::debug!(
        "Terrain: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );
    let material = MaterialUniform::new(config.color, config.roughness, config.metalness)
        .receiving_shadow();
    Prop::new(
        device,
        material_layout,
        mesh.upload(device, "terrain"),
        material,
        &[Instance::new().to_raw()],
        "terrain",
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn base_height_is_the_sine_product() {
        let config = TerrainConfig::default();
        assert_eq!(base_height(&config, 0.0, 0.0), 0.0);
        let x = std::f32::consts::FRAC_PI_2 / 0.05;
        assert_relative_eq!(base_height(&config, x, 0.0), 5.0, epsilon = 1e-4);
        assert_relative_eq!(height_at(&config, x, 0.0, 1.5), 6.5, epsilon = 1e-4);
    }

    #[test]
    fn noise_stays_within_its_bound() {
        let config = TerrainConfig {
            segments: 32,
            ..Default::default()
        };
        let mesh = generate_heightmap(&config, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(mesh.vertices.len(), 33 * 33);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            let noise = y - base_height(&config, x, z);
            assert!((-1e-4..2.0 + 1e-4).contains(&noise), "noise {} out of range", noise);
        }
    }

    #[test]
    fn same_seed_same_terrain() {
        let config = TerrainConfig {
            segments: 8,
            ..Default::default()
        };
        let a = generate_heightmap(&config, &mut ChaCha8Rng::seed_from_u64(3));
        let b = generate_heightmap(&config, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a.vertices, b.vertices);
    }
}
