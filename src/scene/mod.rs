//! The landscape scene.
//!
//! [`Scene`] owns the GPU side of every visual element. [`SceneState`] holds what
//! changes from frame to frame (water time, planet spin and plant glow) and is plain
//! data, so the per-frame update can be tested without a GPU.

pub mod lights;
pub mod planet;
pub mod plants;
pub mod sky;
pub mod stars;
pub mod terrain;
pub mod water;

use cgmath::{Rad, Vector3};
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::{
    config::LandscapeConfig,
    data_structures::{
        geometry::MeshData,
        instance::InstanceRaw,
        model::{DrawMesh, Mesh},
        texture::Texture,
    },
    pipelines::{
        Layouts,
        lit::{Material, MaterialUniform},
    },
};

use self::{lights::Environment, plants::PlantField, sky::Sky, stars::Stars, water::Water};

/// A lit mesh drawn with its own material and instance buffer.
#[derive(Debug)]
pub struct Prop {
    pub mesh: Mesh,
    pub material: Material,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

impl Prop {
    pub fn new(
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        mesh: Mesh,
        material: MaterialUniform,
        instances: &[InstanceRaw],
        label: &str,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", label)),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            mesh,
            material: Material::new(device, material_layout, material, label),
            instance_buffer,
            instance_count: instances.len() as u32,
        }
    }

    /// Overwrite the instances. The count must not grow past the initial one.
    pub fn write_instances(&self, queue: &wgpu::Queue, instances: &[InstanceRaw]) {
        debug_assert!(instances.len() as u32 <= self.instance_count);
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
    }

    /// Draw with the lit pipeline bound; groups 0 and 1 must already be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(2, &self.material.bind_group, &[]);
        self.draw_geometry(pass);
    }

    /// Draw positions only, for the shadow pass.
    pub fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.draw_mesh_instanced(&self.mesh, 0..self.instance_count);
    }
}

/// What the render loop animates.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub water_time: f32,
    pub planet_rotation: Rad<f32>,
    pub planet_position: Vector3<f32>,
    pub plants: PlantField,
    time_scale: f32,
    spin_speed: f32,
}

impl SceneState {
    pub fn new<R: Rng + ?Sized>(config: &LandscapeConfig, rng: &mut R) -> Self {
        Self {
            water_time: 0.0,
            planet_rotation: Rad(0.0),
            planet_position: config.planet.position.into(),
            plants: PlantField::from_config(&config.plants, rng),
            time_scale: config.water.time_scale,
            spin_speed: config.planet.spin_speed,
        }
    }

    /// Advance the animation by `delta` seconds; `elapsed` is the time since start.
    pub fn update(&mut self, delta: f32, elapsed: f32) {
        self.water_time += delta * self.time_scale;
        self.plants.pulse(elapsed);
        self.planet_rotation += Rad(delta * self.spin_speed);
    }
}

/// Every visual element of the landscape on the GPU.
#[derive(Debug)]
pub struct Scene {
    pub state: SceneState,
    pub environment: Environment,
    pub terrain: Prop,
    pub water: Water,
    pub sky: Sky,
    pub stars: Stars,
    pub planet: Prop,
    pub plants: Prop,
    reflection_size: u32,
}

impl Scene {
    pub fn new<R: Rng>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &Layouts,
        config: &LandscapeConfig,
        rng: &mut R,
    ) -> Self {
        let environment = Environment::new(device, layouts, &config.lights, &config.fog);
        let terrain = terrain::build(device, &layouts.material, &config.terrain, rng);
        let water = Water::new(device, queue, &layouts.water, &config.water);
        let sky = Sky::new(
            device,
            &layouts.sky,
            &config.sky,
            environment.uniform.sun_direction(),
        );
        let stars = Stars::new(device, &layouts.stars, &config.stars, config.water.height, rng);
        let planet = planet::build(device, &layouts.material, &config.planet);

        let state = SceneState::new(config, rng);
        let cone = MeshData::cone(
            config.plants.radius,
            config.plants.height,
            config.plants.radial_segments,
        );
        let plants = Prop::new(
            device,
            &layouts.material,
            cone.upload(device, "plant"),
            MaterialUniform::new(config.plants.color, 1.0, 0.0)
                .with_emissive(config.plants.emissive),
            &state.plants.instances(),
            "plants",
        );

        log::info!(
            "Scene ready: {} stars, {} plants",
            stars.count,
            state.plants.plants.len()
        );

        Self {
            state,
            environment,
            terrain,
            water,
            sky,
            stars,
            planet,
            plants,
            reflection_size: config.water.texture_size,
        }
    }

    pub fn reflection_size(&self) -> u32 {
        self.reflection_size
    }

    pub fn water_height(&self) -> f32 {
        self.water.uniform.surface[0]
    }

    /// Upload the animated state: water time, mirror camera, planet spin and plant glow.
    pub fn write_buffers(&mut self, queue: &wgpu::Queue, mirror_view_proj: [[f32; 4]; 4]) {
        self.water.uniform.set_time(self.state.water_time);
        self.water.uniform.mirror_view_proj = mirror_view_proj;
        self.water.write_buffer(queue);

        let planet = planet::instance(self.state.planet_position, self.state.planet_rotation);
        self.planet.write_instances(queue, &[planet.to_raw()]);
        self.plants.write_instances(queue, &self.state.plants.instances());
    }

    /// Swap the water's neutral normal map for a loaded one.
    pub fn set_water_normals(
        &mut self,
        device: &wgpu::Device,
        layouts: &Layouts,
        normals: Texture,
    ) {
        self.water.set_normals(device, &layouts.water, normals);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn state() -> SceneState {
        SceneState::new(&LandscapeConfig::default(), &mut ChaCha8Rng::seed_from_u64(9))
    }

    #[test]
    fn update_advances_water_and_planet() {
        let mut state = state();
        state.update(0.016, 0.016);
        assert_relative_eq!(state.water_time, 0.008, epsilon = 1e-6);
        assert_relative_eq!(state.planet_rotation.0, 0.0008, epsilon = 1e-6);
        state.update(0.5, 0.516);
        assert_relative_eq!(state.water_time, 0.258, epsilon = 1e-6);
        assert_relative_eq!(state.planet_rotation.0, 0.0258, epsilon = 1e-6);
    }

    #[test]
    fn update_pulses_free_plants() {
        let mut state = state();
        state.plants.select(0);
        state.update(0.1, 1.2);
        let expected = 0.5 + 0.5 * (2.4_f32).sin();
        assert_eq!(state.plants.plants[0].emissive_intensity, 2.0);
        assert_relative_eq!(state.plants.plants[1].emissive_intensity, expected, epsilon = 1e-6);
    }
}
