use cosmic_landscape::{
    flow::{COMPAT_SCRIPT, WATER_NORMALS},
    lifecycle::{Lifecycle, Phase, StopSignal},
    loading::LoadProgress,
    resources::AssetError,
};

#[test]
fn stop_from_the_host_ends_the_loop_before_teardown() {
    let host = StopSignal::new();
    let mut lifecycle = Lifecycle::new(host.clone());
    lifecycle.mark_running();
    assert!(lifecycle.should_render());

    std::thread::spawn(move || host.stop())
        .join()
        .unwrap();

    assert!(!lifecycle.should_render());
    assert_eq!(lifecycle.phase(), Phase::Stopping);
    assert!(lifecycle.teardown());
    assert_eq!(lifecycle.phase(), Phase::Disposed);
}

#[test]
fn failed_setup_can_still_be_torn_down_twice() {
    let mut lifecycle = Lifecycle::new(StopSignal::new());
    lifecycle.request_stop();
    assert!(lifecycle.teardown());
    assert!(!lifecycle.teardown());
    assert!(!lifecycle.should_render());
}

#[test]
fn indicator_clears_once_every_asset_resolved() {
    let mut progress = LoadProgress::new();
    progress.register(WATER_NORMALS);
    progress.register(COMPAT_SCRIPT);
    assert_eq!(progress.overlay_text(), "Loading cosmic landscape... 0%");

    let failed: Result<(), AssetError> = Err(AssetError::Script("aframe.min.js".to_string()));
    progress.resolve(COMPAT_SCRIPT, &failed);
    assert!(progress.is_loading());
    assert_eq!(progress.overlay_text(), "Loading cosmic landscape... 50%");

    progress.resolve::<AssetError>(WATER_NORMALS, &Ok(()));
    assert!(!progress.is_loading());
    assert_eq!(progress.percent(), 100.0);
}
