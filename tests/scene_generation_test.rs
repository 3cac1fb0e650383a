mod common;

use approx::assert_relative_eq;
use cosmic_landscape::{
    config::LandscapeConfig,
    scene::{
        SceneState,
        plants::{PlantField, scatter_plants},
        stars::generate_star_positions,
        terrain::{base_height, generate_heightmap},
    },
};

#[test]
fn heightmap_is_the_sine_field_plus_bounded_noise() {
    let config = LandscapeConfig::default().terrain;
    let mesh = generate_heightmap(&config, &mut common::rng());

    assert_eq!(mesh.vertices.len(), 129 * 129);
    assert_eq!(mesh.indices.len(), 128 * 128 * 6);
    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.position;
        let noise = y - base_height(&config, x, z);
        assert!((-1e-4..2.0 + 1e-4).contains(&noise), "noise {} at ({}, {})", noise, x, z);
    }
}

#[test]
fn heightmap_normals_are_unit_length() {
    let mesh = generate_heightmap(&LandscapeConfig::default().terrain, &mut common::rng());
    for vertex in mesh.vertices.iter().step_by(97) {
        let [x, y, z] = vertex.normal;
        assert_relative_eq!((x * x + y * y + z * z).sqrt(), 1.0, epsilon = 1e-4);
        assert!(y > 0.0);
    }
}

#[test]
fn star_field_fills_the_open_cube() {
    let stars = generate_star_positions(10_000, 2000.0, &mut common::rng());
    assert_eq!(stars.len(), 10_000);
    assert!(
        stars
            .iter()
            .flat_map(|star| star.position)
            .all(|c| c > -1000.0 && c < 1000.0)
    );
}

#[test]
fn plants_cover_the_ground_patch() {
    let placements = scatter_plants(200, 400.0, &mut common::rng());
    assert_eq!(placements.len(), 200);
    for (position, tilt) in placements {
        assert!(position.x > -200.0 && position.x < 200.0);
        assert!(position.z > -200.0 && position.z < 200.0);
        assert_eq!(position.y, 0.0);
        assert!((0.0..std::f32::consts::PI).contains(&tilt.0));
    }
}

#[test]
fn same_seed_builds_the_same_landscape() {
    let config = common::config();
    let a = SceneState::new(&config, &mut common::rng());
    let b = SceneState::new(&config, &mut common::rng());
    assert_eq!(a.plants.plants, b.plants.plants);
}

#[test]
fn pulse_stays_in_the_unit_range() {
    let field = PlantField::from_config(&LandscapeConfig::default().plants, &mut common::rng());
    for step in 0..1000 {
        let intensity = field.pulse_intensity(step as f32 * 0.037);
        assert!((0.0..=1.0).contains(&intensity), "{}", intensity);
    }
}

#[test]
fn a_second_of_frames_advances_water_and_planet() {
    let mut state = SceneState::new(&common::config(), &mut common::rng());
    let delta = 1.0 / 60.0;
    for frame in 1..=60 {
        state.update(delta, frame as f32 * delta);
    }
    assert_relative_eq!(state.water_time, 0.5, epsilon = 1e-4);
    assert_relative_eq!(state.planet_rotation.0, 0.05, epsilon = 1e-5);

    let expected = 0.5 + 0.5 * (2.0_f32).sin();
    for plant in &state.plants.plants {
        assert_relative_eq!(plant.emissive_intensity, expected, epsilon = 1e-4);
    }
}
