mod common;

use cosmic_landscape::{
    config::LandscapeConfig,
    interaction::{ControllerEvent, Controllers},
    scene::SceneState,
};

#[test]
fn mouse_press_and_release_glow_a_plant() {
    let mut plants = common::plants_at(&[[0.0, 0.0, -10.0], [3.0, 0.0, -10.0]]);
    let mut controllers = Controllers::new();
    let pose = common::aim([0.0, 0.0, 0.0], [0.0, 0.0, -10.0]);

    let hit = controllers.handle(ControllerEvent::SelectStart { controller: 0, pose }, &mut plants);
    assert_eq!(hit, Some(0));
    assert_eq!(plants.plants[0].emissive_intensity, 2.0);
    assert_eq!(plants.plants[1].emissive_intensity, 0.5);

    // the pulse leaves the held plant alone
    plants.pulse(0.3);
    assert_eq!(plants.plants[0].emissive_intensity, 2.0);

    let released = controllers.handle(
        ControllerEvent::SelectEnd {
            controller: 0,
            pose,
        },
        &mut plants,
    );
    assert_eq!(released, Some(0));
    assert_eq!(plants.plants[0].emissive_intensity, 0.5);
    assert!(!plants.plants[0].held);
}

#[test]
fn aiming_at_the_sky_selects_nothing() {
    let mut plants = common::plants_at(&[[0.0, 0.0, -10.0]]);
    let mut controllers = Controllers::new();
    let pose = common::aim([0.0, 0.0, 0.0], [0.0, 50.0, -10.0]);

    assert_eq!(controllers.select_start(1, &pose, &mut plants), None);
    assert_eq!(controllers.held(1), None);
    assert_eq!(plants.plants[0].emissive_intensity, 0.5);
}

#[test]
fn both_hands_on_one_plant_last_release_wins() {
    let mut plants = common::plants_at(&[[0.0, 0.0, -10.0]]);
    let mut controllers = Controllers::new();
    let left = common::aim([-2.0, 0.0, 0.0], [0.0, 0.0, -10.0]);
    let right = common::aim([2.0, 0.0, 0.0], [0.0, 0.0, -10.0]);

    controllers.select_start(0, &left, &mut plants);
    controllers.select_start(1, &right, &mut plants);
    controllers.select_end(0, &left, &mut plants);
    // released even though the right hand still holds it
    assert_eq!(plants.plants[0].emissive_intensity, 0.5);
    assert_eq!(controllers.held(1), Some(0));
}

#[test]
fn disabled_interaction_ignores_every_plant() {
    let config = LandscapeConfig {
        plants: cosmic_landscape::config::PlantConfig {
            interactive: false,
            ..Default::default()
        },
        ..common::config()
    };
    let mut state = SceneState::new(&config, &mut common::rng());
    let mut controllers = Controllers::new();
    let target: [f32; 3] = state.plants.plants[0].position.into();
    let pose = common::aim([target[0], 20.0, target[2]], target);

    assert_eq!(controllers.select_start(0, &pose, &mut state.plants), None);
}
