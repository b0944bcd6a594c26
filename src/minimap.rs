use glam::Vec2;

use crate::camera::Camera;
use crate::player::Player;
use crate::scene::{EMPTY, Scene};

const SCALE: f32 = 0.1;
const MARGIN: f32 = 20.0;
/// Length of the drawn FOV edge rays, in world units before scaling.
const FOV_RAY_LEN: f32 = 300.0;

const WALL: [u8; 4] = [255, 255, 255, 255];
const OPEN: [u8; 4] = [0, 0, 0, 255];
const PLAYER: [u8; 4] = [255, 0, 0, 255];

/// Top-down overview in the bottom-right corner: the grid at one tenth
/// scale, the player position, and the two edges of the view cone. Drawn
/// straight into the frame after the 3D passes.
pub fn draw(frame: &mut [u8], camera: &Camera, scene: &Scene, player: &Player) {
    let plane = Vec2::new(camera.plane_width as f32, camera.plane_height as f32);
    let offset = plane
        - Vec2::new(scene.width(), scene.height()) * SCALE
        - Vec2::new(MARGIN, MARGIN);
    let cell = scene.block_size() * SCALE;

    for row in 0..scene.rows() {
        for col in 0..scene.cols() {
            let color = match scene.cell(col as i32, row as i32) {
                Ok(EMPTY) => OPEN,
                Ok(_) => WALL,
                Err(_) => continue,
            };
            let corner = Vec2::new(col as f32, row as f32) * scene.block_size() * SCALE + offset;
            fill_rect(frame, camera, corner, Vec2::splat(cell), color);
        }
    }

    let from = player.pos * SCALE + offset;
    for edge in [-1.0, 1.0] {
        let dir = Vec2::from_angle(player.angle + edge * camera.fov * 0.5);
        let to = (player.pos + dir * FOV_RAY_LEN) * SCALE + offset;
        draw_line(frame, camera, from, to, PLAYER);
    }
    fill_disc(frame, camera, from, 3.0, PLAYER);
}

fn put(frame: &mut [u8], camera: &Camera, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= camera.plane_width as i32 || y >= camera.plane_height as i32 {
        return;
    }
    let i = (y as usize * camera.plane_width as usize + x as usize) * 4;
    frame[i..i + 4].copy_from_slice(&color);
}

fn fill_rect(frame: &mut [u8], camera: &Camera, corner: Vec2, size: Vec2, color: [u8; 4]) {
    for y in corner.y as i32..(corner.y + size.y) as i32 {
        for x in corner.x as i32..(corner.x + size.x) as i32 {
            put(frame, camera, x, y, color);
        }
    }
}

fn fill_disc(frame: &mut [u8], camera: &Camera, center: Vec2, radius: f32, color: [u8; 4]) {
    let r = radius.ceil() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if ((dx * dx + dy * dy) as f32).sqrt() <= radius {
                put(
                    frame,
                    camera,
                    center.x as i32 + dx,
                    center.y as i32 + dy,
                    color,
                );
            }
        }
    }
}

/// Pixel-stepped segment; short overlay lines don't warrant Bresenham.
fn draw_line(frame: &mut [u8], camera: &Camera, from: Vec2, to: Vec2, color: [u8; 4]) {
    let length = (to - from).length();
    let steps = length.ceil() as i32;
    if steps == 0 {
        put(frame, camera, from.x as i32, from.y as i32, color);
        return;
    }
    let step = (to - from) / steps as f32;
    let mut at = from;
    for _ in 0..=steps {
        put(frame, camera, at.x as i32, at.y as i32, color);
        at += step;
    }
}
