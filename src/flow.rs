//! Application event loop.
//!
//! The room is prepared once the window exists and is then redrawn every
//! frame. The lifecycle per frame:
//! 1. replay the scene script, queueing one captured draw state per object
//! 2. capture the lighting uniforms
//! 3. upload both and record the pass
//! 4. present
//!
//! Textures are released when the event loop exits.

use std::sync::Arc;

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::Context,
    data_structures::draw_state::LightingState,
    render::Renderer,
    resources::{
        mesh::{MeshError, ShapeMeshes},
        texture::WgpuTextures,
    },
    scene::RoomScene,
    shader::UniformBlock,
};

#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Everything that exists once the window and GPU are up.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: RoomScene<WgpuTextures>,
    meshes: ShapeMeshes,
    uniforms: UniformBlock,
    renderer: Renderer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let textures = WgpuTextures::new(&ctx.device, &ctx.queue);
        let renderer = Renderer::new(&ctx.device, ctx.config.format, &textures);

        let mut scene = RoomScene::new(textures, config)?;
        let mut meshes = ShapeMeshes::new(&ctx.device);
        let mut uniforms = UniformBlock::new();
        let report = scene.prepare(&mut uniforms, &mut meshes)?;
        if !report.textures_skipped.is_empty() {
            log::warn!(
                "Rendering without {:?}, those objects fall back to white.",
                report.textures_skipped
            );
        }

        Ok(Self {
            ctx,
            scene,
            meshes,
            uniforms,
            renderer,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), FrameError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.scene.render(&mut self.uniforms, &mut self.meshes)?;
        let draws = self.meshes.take_draws();
        let lighting = LightingState::capture(&self.uniforms);
        self.renderer.render(
            &self.ctx,
            &lighting,
            &draws,
            &self.meshes,
            self.scene.textures().backend(),
        )?;
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: SceneConfig,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            config,
            state: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                return self.fail(event_loop, anyhow::anyhow!("could not create the window: {e}"));
            }
        };

        match self
            .async_runtime
            .block_on(AppState::new(window, &self.config))
        {
            Ok(mut state) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("App initialization failed")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match state.render() {
                Ok(()) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(FrameError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                }
                Err(FrameError::Surface(e)) => log::error!("Unable to render {}", e),
                Err(e @ FrameError::Mesh(_)) => self.fail(event_loop, e.into()),
            },
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.scene.release();
            log::info!("Released all textures.");
        }
    }
}

/// Open the window and render the room until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
