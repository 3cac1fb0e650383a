//! cosmic-landscape
//!
//! A decorative night-time landscape rendered with wgpu, natively and in the
//! browser: a procedural terrain under a physically based sky, a reflective water
//! plane, a star field, a slowly spinning planet and a meadow of glowing plants
//! that light up when a controller (or the mouse) selects them.
//!
//! High-level modules
//! - `config`: the RON configuration and its defaults
//! - `context`: window, surface, device, cameras and pipelines
//! - `scene`: the landscape's elements and their per-frame state
//! - `pipelines`: render pipelines and the bloom post-processing chain
//! - `render`: encodes one frame from the scene
//! - `interaction`: controller rays and plant selection
//! - `flow`: the winit event loop tying it all together
//! - `lifecycle`, `loading`, `clock`: stop signal, asset progress, frame timing
//! - `resources`: async asset loading
//!

pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod interaction;
pub mod lifecycle;
pub mod loading;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use flow::{run, run_with_signal};
pub use lifecycle::StopSignal;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
static ACTIVE: std::sync::Mutex<Option<StopSignal>> = std::sync::Mutex::new(None);

/// WASM entry point: mounts the landscape into the page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let signal = StopSignal::new();
    if let Ok(mut active) = ACTIVE.lock() {
        *active = Some(signal.clone());
    }
    if let Err(e) = run_with_signal(signal) {
        log::error!("{:#}", e);
    }
}

/// Unmount the landscape. The loop stops before its next frame and tears down.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop() {
    if let Some(signal) = ACTIVE.lock().ok().and_then(|mut active| active.take()) {
        signal.stop();
    }
}
