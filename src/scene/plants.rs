//! Glowing plant props.
//!
//! Plants are cones scattered over a square patch. They all share one mesh and one
//! material; position, tilt and emissive intensity are per instance.

use cgmath::{Matrix4, Quaternion, Rad, Rotation3, Vector3};
use rand::{Rng, distr::Open01};

use crate::{
    config::PlantConfig,
    data_structures::instance::{Instance, InstanceRaw},
};

/// Swing of the emissive pulse around the base intensity.
pub const PULSE_AMPLITUDE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    pub position: Vector3<f32>,
    /// Tilt around the X axis.
    pub rotation_x: Rad<f32>,
    /// Only interactive plants react to controllers.
    pub interactive: bool,
    pub emissive_intensity: f32,
    /// Set while a controller holds the plant; the pulse skips held plants.
    pub held: bool,
}

impl Plant {
    pub fn new(
        position: Vector3<f32>,
        rotation_x: Rad<f32>,
        interactive: bool,
        intensity: f32,
    ) -> Self {
        Self {
            position,
            rotation_x,
            interactive,
            emissive_intensity: intensity,
            held: false,
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_angle_x(self.rotation_x)
    }

    fn instance(&self) -> Instance {
        Instance {
            position: self.position,
            rotation: Quaternion::from_angle_x(self.rotation_x),
            emissive: self.emissive_intensity,
        }
    }
}

/// Random plant placements on the ground: `(x, z)` in the open interval
/// `(-patch / 2, patch / 2)`, `y = 0` and a tilt in `[0, pi)`.
pub fn scatter_plants<R: Rng + ?Sized>(
    count: u32,
    patch: f32,
    rng: &mut R,
) -> Vec<(Vector3<f32>, Rad<f32>)> {
    (0..count)
        .map(|_| {
            let x = (rng.sample::<f32, _>(Open01) - 0.5) * patch;
            let z = (rng.sample::<f32, _>(Open01) - 0.5) * patch;
            let tilt = rng.random::<f32>() * std::f32::consts::PI;
            (Vector3::new(x, 0.0, z), Rad(tilt))
        })
        .collect()
}

/// All plants plus the parameters they share.
#[derive(Debug, Clone)]
pub struct PlantField {
    pub plants: Vec<Plant>,
    pub radius: f32,
    pub height: f32,
    pub base_intensity: f32,
    pub selected_intensity: f32,
    pub pulse_speed: f32,
}

impl PlantField {
    pub fn new(
        plants: Vec<Plant>,
        radius: f32,
        height: f32,
        base_intensity: f32,
        selected_intensity: f32,
        pulse_speed: f32,
    ) -> Self {
        Self {
            plants,
            radius,
            height,
            base_intensity,
            selected_intensity,
            pulse_speed,
        }
    }

    pub fn from_config<R: Rng + ?Sized>(config: &PlantConfig, rng: &mut R) -> Self {
        let plants = scatter_plants(config.count, config.patch, rng)
            .into_iter()
            .map(|(position, tilt)| {
                Plant::new(position, tilt, config.interactive, config.base_intensity)
            })
            .collect();
        Self::new(
            plants,
            config.radius,
            config.height,
            config.base_intensity,
            config.selected_intensity,
            config.pulse_speed,
        )
    }

    pub fn select(&mut self, idx: usize) {
        if let Some(plant) = self.plants.get_mut(idx) {
            plant.held = true;
            plant.emissive_intensity = self.selected_intensity;
        }
    }

    pub fn release(&mut self, idx: usize) {
        if let Some(plant) = self.plants.get_mut(idx) {
            plant.held = false;
            plant.emissive_intensity = self.base_intensity;
        }
    }

    /// Intensity of a free plant `elapsed` seconds after start.
    pub fn pulse_intensity(&self, elapsed: f32) -> f32 {
        self.base_intensity + PULSE_AMPLITUDE * (self.pulse_speed * elapsed).sin()
    }

    /// Apply the shared pulse to every plant that is not held.
    pub fn pulse(&mut self, elapsed: f32) {
        let intensity = self.pulse_intensity(elapsed);
        for plant in self.plants.iter_mut().filter(|p| !p.held) {
            plant.emissive_intensity = intensity;
        }
    }

    pub fn instances(&self) -> Vec<InstanceRaw> {
        self.plants.iter().map(|p| p.instance().to_raw()).collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn field() -> PlantField {
        PlantField::from_config(&PlantConfig::default(), &mut ChaCha8Rng::seed_from_u64(42))
    }

    #[test]
    fn scatter_stays_on_the_patch() {
        let plants = field();
        assert_eq!(plants.plants.len(), 200);
        for plant in &plants.plants {
            assert!(plant.position.x > -200.0 && plant.position.x < 200.0);
            assert!(plant.position.z > -200.0 && plant.position.z < 200.0);
            assert_eq!(plant.position.y, 0.0);
            assert!(plant.rotation_x.0 >= 0.0 && plant.rotation_x.0 < std::f32::consts::PI);
            assert!(plant.interactive);
            assert_eq!(plant.emissive_intensity, 0.5);
        }
    }

    #[test]
    fn pulse_follows_the_sine() {
        let mut plants = field();
        plants.pulse(0.25);
        let expected = 0.5 + 0.5 * (0.5_f32).sin();
        for plant in &plants.plants {
            assert_relative_eq!(plant.emissive_intensity, expected);
        }
    }

    #[test]
    fn pulse_is_bounded() {
        let plants = field();
        for step in 0..1000 {
            let intensity = plants.pulse_intensity(step as f32 * 0.037);
            assert!((0.0..=1.0).contains(&intensity));
        }
    }

    #[test]
    fn held_plant_keeps_its_intensity() {
        let mut plants = field();
        plants.select(3);
        plants.pulse(1.0);
        assert_eq!(plants.plants[3].emissive_intensity, 2.0);
        plants.release(3);
        assert_eq!(plants.plants[3].emissive_intensity, 0.5);
        plants.pulse(1.0);
        assert_relative_eq!(plants.plants[3].emissive_intensity, plants.pulse_intensity(1.0));
    }

    #[test]
    fn selecting_a_missing_plant_is_a_no_op() {
        let mut plants = field();
        plants.select(10_000);
        plants.release(10_000);
        assert!(plants.plants.iter().all(|p| !p.held));
    }
}
