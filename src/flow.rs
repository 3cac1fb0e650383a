//! Application event loop.
//!
//! [`App`] owns everything the landscape needs between frames: the config, the
//! [`Lifecycle`], the frame clock, the asset progress and, once the GPU is up, the
//! [`Stage`]. Async work (GPU setup on the web, asset and script loads) reports
//! back through [`AppEvent`]s on the loop's proxy, so all scene state is only ever
//! touched on the loop thread.
//!
//! Each `RedrawRequested`:
//! 1. checks the stop signal and exits instead of rendering when it is set
//! 2. ticks the clock and advances the [`SceneState`](crate::scene::SceneState)
//! 3. uploads cameras, water, planet and plant instances
//! 4. renders and presents, then requests the next redraw

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    clock::FrameClock,
    config::LandscapeConfig,
    context::Context,
    data_structures::texture::Texture,
    interaction::{ControllerEvent, Controllers},
    lifecycle::{Lifecycle, StopSignal},
    loading::LoadProgress,
    pipelines::bloom::Bloom,
    render,
    resources::{self, AssetError},
    scene::Scene,
};

/// Progress name of the water normal map.
pub const WATER_NORMALS: &str = "water_normals";
/// Progress name of the compatibility script (wasm only).
pub const COMPAT_SCRIPT: &str = "compat_script";

/// GPU context, scene and post-processing, alive between setup and teardown.
#[derive(Debug)]
pub(crate) struct Stage {
    // fields drop in order: scene resources go before the device that made them
    scene: Scene,
    bloom: Bloom,
    ctx: Context,
}

impl Stage {
    async fn new(window: Arc<Window>, config: LandscapeConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &config).await?;

        let seed = config.seed.unwrap_or_else(entropy_seed);
        log::info!("Building the scene with seed {}", seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scene = Scene::new(&ctx.device, &ctx.queue, &ctx.layouts, &config, &mut rng);
        let bloom = Bloom::new(&ctx.device, ctx.config.format, ctx.size(), &config.bloom);

        Ok(Self { scene, bloom, ctx })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.bloom.resize(&self.ctx.device, [width, height]);
        }
    }

    /// Controller pose looking from the camera through the cursor.
    fn cursor_pose(&self, coords: PhysicalPosition<f64>) -> cgmath::Matrix4<f32> {
        let [width, height] = self.ctx.size();
        self.ctx
            .camera
            .camera
            .cast_ray_from_mouse(coords, width as f32, height as f32, &self.ctx.projection)
            .to_pose()
    }
}

fn entropy_seed() -> u64 {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * u64::MAX as f64) as u64 ^ js_sys::Date::now() as u64
    }
}

pub(crate) enum AppEvent {
    #[cfg(target_arch = "wasm32")]
    Initialized(anyhow::Result<Box<Stage>>),
    AssetLoaded {
        name: &'static str,
        result: Result<Texture, AssetError>,
    },
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    ScriptLoaded(Result<(), AssetError>),
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(result) => f
                .debug_tuple("Initialized")
                .field(&result.as_ref().map(|_| "Stage"))
                .finish(),
            Self::AssetLoaded { name, result } => f
                .debug_struct("AssetLoaded")
                .field("name", name)
                .field("ok", &result.is_ok())
                .finish(),
            Self::ScriptLoaded(result) => f.debug_tuple("ScriptLoaded").field(result).finish(),
        }
    }
}

fn send(proxy: &EventLoopProxy<AppEvent>, event: AppEvent) {
    if let Err(e) = proxy.send_event(event) {
        log::warn!("Event loop closed before {:?} arrived", e.0);
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    config: LandscapeConfig,
    lifecycle: Lifecycle,
    clock: FrameClock,
    progress: LoadProgress,
    controllers: Controllers,
    window: Option<Arc<Window>>,
    stage: Option<Stage>,
    mouse: PhysicalPosition<f64>,
    #[cfg(target_arch = "wasm32")]
    mount: Option<crate::web::WebMount>,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        config: LandscapeConfig,
        signal: StopSignal,
    ) -> anyhow::Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = {
            use anyhow::Context as _;
            tokio::runtime::Runtime::new().context("cannot start the async runtime")?
        };
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy: event_loop.create_proxy(),
            config,
            lifecycle: Lifecycle::new(signal),
            clock: FrameClock::new(),
            progress: LoadProgress::new(),
            controllers: Controllers::new(),
            window: None,
            stage: None,
            mouse: PhysicalPosition::new(0.0, 0.0),
            #[cfg(target_arch = "wasm32")]
            mount: None,
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F: Future<Output = ()> + Send + 'static>(&self, task: F) {
        self.async_runtime.spawn(task);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn<F: Future<Output = ()> + 'static>(&self, task: F) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn register_assets(&mut self) {
        self.progress.register(WATER_NORMALS);
        match &self.config.assets.compat_script_url {
            #[cfg(target_arch = "wasm32")]
            Some(_) => self.progress.register(COMPAT_SCRIPT),
            #[cfg(not(target_arch = "wasm32"))]
            Some(url) => log::debug!("Skipping {} outside the browser", url),
            None => {}
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn load_script(&self) {
        if let Some(url) = self.config.assets.compat_script_url.clone() {
            let proxy = self.proxy.clone();
            self.spawn(async move {
                let result = crate::web::inject_script(&url).await;
                send(&proxy, AppEvent::ScriptLoaded(result));
            });
        }
    }

    fn load_water_normals(&self, stage: &Stage) {
        let url = self.config.assets.water_normals_url.clone();
        let device = stage.ctx.device.clone();
        let queue = stage.ctx.queue.clone();
        let proxy = self.proxy.clone();
        self.spawn(async move {
            let result = resources::load_texture(&url, true, &device, &queue).await;
            send(
                &proxy,
                AppEvent::AssetLoaded {
                    name: WATER_NORMALS,
                    result,
                },
            );
        });
    }

    fn on_setup(&mut self, event_loop: &ActiveEventLoop, result: anyhow::Result<Stage>) {
        let mut stage = match result {
            Ok(stage) => stage,
            Err(e) => {
                log::error!("Cannot set up the landscape: {:#}", e);
                self.lifecycle.request_stop();
                event_loop.exit();
                return;
            }
        };

        // the canvas may only have its real size now
        let size = stage.ctx.window().inner_size();
        stage.resize(size.width, size.height);

        self.load_water_normals(&stage);
        self.lifecycle.mark_running();
        self.clock = FrameClock::new();
        stage.ctx.window().request_redraw();
        self.stage = Some(stage);
        self.report_progress();
        log::info!("Cosmic landscape mounted");
    }

    fn on_asset(&mut self, name: &'static str, result: Result<Texture, AssetError>) {
        match result {
            Ok(texture) => {
                if let Some(stage) = &mut self.stage {
                    stage
                        .scene
                        .set_water_normals(&stage.ctx.device, &stage.ctx.layouts, texture);
                }
                self.progress.resolve::<AssetError>(name, &Ok(()));
            }
            Err(e) => {
                log::warn!("{} unavailable, the water keeps flat normals: {}", name, e);
                self.progress.resolve(name, &Err(e));
            }
        }
        self.report_progress();
    }

    fn report_progress(&self) {
        let text = self
            .progress
            .is_loading()
            .then(|| self.progress.overlay_text());
        match &text {
            Some(text) => log::info!("{}", text),
            None => log::info!("All {} assets resolved", self.progress.total()),
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(mount) = &self.mount {
            mount.set_overlay(text.as_deref());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.lifecycle.should_render() {
            // frames requested while the stage is still mounting are skipped
            if self.lifecycle.is_stopping() {
                event_loop.exit();
            }
            return;
        }
        let Some(stage) = self.stage.as_mut() else {
            return;
        };

        let time = self.clock.tick();
        stage.scene.state.update(time.delta, time.elapsed);
        stage
            .ctx
            .update_camera(stage.scene.water_height(), stage.scene.reflection_size());
        stage
            .scene
            .write_buffers(&stage.ctx.queue, stage.ctx.mirror.uniform.view_proj);

        match render::render(&stage.ctx, &stage.scene, &stage.bloom) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = stage.ctx.window().inner_size();
                stage.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
        stage.ctx.window().request_redraw();
    }

    /// Release the scene and its GPU context. Runs once, after the last frame.
    fn teardown(&mut self) {
        if !self.lifecycle.teardown() {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(mut mount) = self.mount.take() {
            mount.detach();
        }
        let mounted = self.stage.take().is_some();
        self.window = None;
        if mounted {
            log::info!("Cosmic landscape disposed");
        } else {
            log::info!("Cosmic landscape stopped before it was mounted");
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title(self.config.window.title.clone());
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the window: {}", e);
                self.lifecycle.request_stop();
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());
        self.register_assets();

        #[cfg(target_arch = "wasm32")]
        {
            match crate::web::WebMount::attach(&window, &self.config.window.mount_id) {
                Ok(mount) => self.mount = Some(mount),
                Err(e) => log::warn!("Cannot mount into the page: {:#}", e),
            }
            self.report_progress();
            self.load_script();
        }

        let setup = Stage::new(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(setup);
            self.on_setup(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            self.spawn(async move {
                let result = setup.await.map(Box::new);
                send(&proxy, AppEvent::Initialized(result));
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            AppEvent::Initialized(result) => {
                self.on_setup(_event_loop, result.map(|stage| *stage))
            }
            AppEvent::AssetLoaded { name, result } => self.on_asset(name, result),
            AppEvent::ScriptLoaded(result) => {
                if let Err(e) = &result {
                    log::warn!("{}", e);
                }
                self.progress.resolve(COMPAT_SCRIPT, &result);
                self.report_progress();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.lifecycle.request_stop();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => self.mouse = position,
            WindowEvent::Resized(size) => {
                if let Some(stage) = &mut self.stage {
                    stage.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(stage) = &mut self.stage else {
                    return;
                };
                // the mouse stands in for controller 0
                let pose = stage.cursor_pose(self.mouse);
                let event = match state {
                    ElementState::Pressed => ControllerEvent::SelectStart { controller: 0, pose },
                    ElementState::Released => ControllerEvent::SelectEnd { controller: 0, pose },
                };
                self.controllers.handle(event, &mut stage.scene.state.plants);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Run the landscape until the window closes.
pub fn run() -> anyhow::Result<()> {
    run_with_signal(StopSignal::new())
}

/// Run the landscape until the window closes or `signal` is stopped.
pub fn run_with_signal(signal: StopSignal) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // a host page that mounts twice already has a logger
        let _ = console_log::init_with_level(log::Level::Info);
    }

    let config = LandscapeConfig::load()?;
    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, signal)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
