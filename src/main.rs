use std::collections::HashSet;
use std::f32::consts::PI;
use std::num::NonZeroU32;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::player::Player;
use crate::renderer::Renderer;
use crate::scaler::ScaleMap;
use crate::scene::{EMPTY, MaterialId, Scene, Sprite};
use crate::textures::{Texture, TextureSet, brick, checker, orb};

mod camera;
mod math;
mod minimap;
mod player;
mod raycast;
mod renderer;
mod scaler;
mod scene;
mod textures;

const PLANE_WIDTH: u32 = 640;
const PLANE_HEIGHT: u32 = 480;
const FOV_DEGREES: f32 = 60.0;
const BLOCK_SIZE: f32 = 64.0;
const EYE_HEIGHT: f32 = 32.0;

const MOVE_SPEED: f32 = 120.0; // world units per second
const TURN_SPEED: f32 = PI * 0.75; // rad/s

const FLOOR_MATERIAL: MaterialId = 8;
const CEILING_MATERIAL: MaterialId = 9;

/// Wall materials that load from disk when the file is present. A file
/// that exists but fails to read or decode aborts startup; an absent file
/// falls back to a generated tile so the demo runs from a bare checkout.
const WALL_TEXTURE_PATHS: &[(MaterialId, &str)] = &[
    (1, "assets/bark.png"),
    (2, "assets/walkstone.png"),
    (3, "assets/walkstone.png"),
    (4, "assets/walkstone.png"),
];

// Material 5 stays unregistered on purpose: it renders through the
// flat-shading fallback.
#[rustfmt::skip]
const LAYOUT: [[MaterialId; 24]; 24] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 2, 2, 2, 2, 2, 0, 0, 0, 0, 3, 0, 3, 0, 3, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 0, 3, 0, 0, 0, 3, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 2, 2, 0, 2, 2, 0, 0, 0, 0, 3, 0, 3, 0, 3, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 4, 4, 4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 0, 4, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 0, 0, 0, 0, 5, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 0, 4, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 0, 4, 4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 4, 4, 4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

fn build_scene() -> Scene {
    let cells = LAYOUT.iter().flatten().copied().collect();
    let sprites = vec![
        Sprite {
            pos: Vec2::new(800.0, 352.0),
            material: 6,
        },
        Sprite {
            pos: Vec2::new(224.0, 800.0),
            material: 7,
        },
        Sprite {
            pos: Vec2::new(736.0, 608.0),
            material: 6,
        },
    ];
    Scene::new(cells, 24, 24, BLOCK_SIZE, sprites)
        .with_surfaces(FLOOR_MATERIAL, CEILING_MATERIAL)
}

fn builtin_wall(material: MaterialId) -> Texture {
    match material {
        1 => brick(BLOCK_SIZE as u32, [150, 96, 56], [70, 45, 28]),
        _ => checker(BLOCK_SIZE as u32, [130, 130, 135], [95, 95, 100]),
    }
}

fn build_textures() -> anyhow::Result<TextureSet> {
    let mut textures = TextureSet::new();
    for &(material, path) in WALL_TEXTURE_PATHS {
        if Path::new(path).exists() {
            textures
                .load_file(material, Path::new(path))
                .with_context(|| format!("loading wall texture for material {material}"))?;
        } else {
            textures.insert(material, builtin_wall(material));
        }
    }
    textures.insert(FLOOR_MATERIAL, checker(32, [88, 80, 68], [64, 58, 50]));
    textures.insert(CEILING_MATERIAL, checker(32, [46, 50, 64], [34, 37, 48]));
    textures.insert(6, orb(48, [250, 225, 80]));
    textures.insert(7, orb(48, [110, 200, 255]));
    Ok(textures)
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,

    scene: Scene,
    textures: TextureSet,
    player: Player,
    renderer: Renderer,
    scale_map: ScaleMap,

    // Status line
    frame_counter: u32,
    last_status: Instant,

    // Input and movement
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
}

impl App {
    fn new() -> anyhow::Result<Self> {
        let camera = Camera::new(PLANE_WIDTH, PLANE_HEIGHT, FOV_DEGREES, EYE_HEIGHT);
        let scene = build_scene();
        let textures = build_textures()?;
        // Start in the middle of the open area, facing east.
        let player = Player::new(
            Vec2::new(23.0 * BLOCK_SIZE * 0.5, 23.0 * BLOCK_SIZE * 0.5),
            0.0,
        );

        Ok(Self {
            window: None,
            surface: None,
            scene,
            textures,
            player,
            renderer: Renderer::new(camera),
            scale_map: ScaleMap::empty(),
            frame_counter: 0,
            last_status: Instant::now(),
            keys_down: HashSet::new(),
            last_tick: Instant::now(),
        })
    }

    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let mut dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        if dt > Duration::from_millis(100) {
            dt = Duration::from_millis(100);
        }
        let dt_s = dt.as_secs_f32();

        let mut forward = 0.0;
        if self.keys_down.contains(&KeyCode::KeyW) {
            forward += 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyS) {
            forward -= 1.0;
        }
        let mut turn = 0.0;
        if self.keys_down.contains(&KeyCode::KeyA) {
            turn -= 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyD) {
            turn += 1.0;
        }

        if turn != 0.0 {
            self.player.turn(turn * TURN_SPEED * dt_s);
        }
        if forward != 0.0 {
            let mut moved = self.player;
            moved.advance(forward * MOVE_SPEED * dt_s);
            // Walls are solid, and so is anything off the grid.
            if matches!(self.scene.cell_at(moved.pos.x, moved.pos.y), Ok(EMPTY)) {
                self.player = moved;
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("gridcaster")
            .with_inner_size(LogicalSize::new(800.0, 600.0));

        let window = Rc::new(event_loop.create_window(attributes).expect("create window"));

        let context = softbuffer::Context::new(window.clone()).expect("softbuffer context");
        let surface =
            softbuffer::Surface::new(&context, window.clone()).expect("softbuffer surface");

        let size = window.inner_size();
        self.scale_map = scaler::build_scale_map(
            size.width as usize,
            size.height as usize,
            PLANE_WIDTH as usize,
            PLANE_HEIGHT as usize,
        );

        self.surface = Some(surface);
        self.window = Some(window);

        self.last_tick = Instant::now();
        self.window.as_ref().unwrap().request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        ..
                    },
                ..
            } => {
                if let PhysicalKey::Code(code) = physical_key {
                    use winit::event::ElementState;
                    match state {
                        ElementState::Pressed => {
                            self.keys_down.insert(code);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&code);
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();

                let (window, surface) = match (&self.window, &mut self.surface) {
                    (Some(w), Some(s)) if w.id() == id => (w, s),
                    _ => return,
                };

                let size = window.inner_size();
                let (dw, dh) = (size.width as usize, size.height as usize);
                if dw == 0 || dh == 0 {
                    return; // Minimized window, skip drawing
                }

                surface
                    .resize(
                        NonZeroU32::new(dw as u32).unwrap(),
                        NonZeroU32::new(dh as u32).unwrap(),
                    )
                    .unwrap();

                self.renderer.render(&self.scene, &self.textures, &self.player);
                let camera = *self.renderer.camera();
                minimap::draw(self.renderer.frame_mut(), &camera, &self.scene, &self.player);

                let mut buf = surface.buffer_mut().expect("buffer_mut");
                scaler::blit_frame(
                    &mut buf,
                    dw,
                    self.renderer.frame(),
                    PLANE_WIDTH as usize,
                    &self.scale_map,
                );
                buf.present().unwrap();

                // Pose and frame rate, once per second
                self.frame_counter += 1;
                let now = Instant::now();
                if now.duration_since(self.last_status).as_secs_f32() >= 1.0 {
                    let fps = self.frame_counter as f32
                        / now.duration_since(self.last_status).as_secs_f32();
                    println!(
                        "pos=({:.1}, {:.1}) angle={:.2} fps={:.1}",
                        self.player.pos.x, self.player.pos.y, self.player.angle, fps
                    );
                    self.frame_counter = 0;
                    self.last_status = now;
                }

                self.window.as_ref().unwrap().request_redraw();
            }

            WindowEvent::Resized(new_size) => {
                let (dw, dh) = (new_size.width as usize, new_size.height as usize);
                if dw > 0 && dh > 0 {
                    self.scale_map = scaler::build_scale_map(
                        dw,
                        dh,
                        PLANE_WIDTH as usize,
                        PLANE_HEIGHT as usize,
                    );
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("creating event loop")?;

    // Render continuously; each redraw schedules the next one.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new().context("initializing gridcaster")?;
    event_loop.run_app(&mut app).context("running event loop")?;
    Ok(())
}
