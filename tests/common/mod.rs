#![allow(dead_code)]

use cosmic_landscape::{
    config::LandscapeConfig,
    interaction::Ray,
    scene::plants::{Plant, PlantField},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const SEED: u64 = 0x5eed;

pub fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

pub fn config() -> LandscapeConfig {
    LandscapeConfig {
        seed: Some(SEED),
        ..Default::default()
    }
}

/// Upright interactive plants at the given positions, with the default parameters.
pub fn plants_at(positions: &[[f32; 3]]) -> PlantField {
    let defaults = LandscapeConfig::default().plants;
    let plants = positions
        .iter()
        .map(|&p| Plant::new(p.into(), cgmath::Rad(0.0), true, defaults.base_intensity))
        .collect();
    PlantField::new(
        plants,
        defaults.radius,
        defaults.height,
        defaults.base_intensity,
        defaults.selected_intensity,
        defaults.pulse_speed,
    )
}

/// A controller pose at `origin` pointing at `target`.
pub fn aim(origin: [f32; 3], target: [f32; 3]) -> cgmath::Matrix4<f32> {
    let origin = cgmath::Point3::from(origin);
    let target = cgmath::Point3::from(target);
    Ray::new(origin, target - origin).to_pose()
}
