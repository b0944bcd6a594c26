use glam::Vec2;

use crate::camera::Camera;
use crate::math;
use crate::player::Player;
use crate::raycast;
use crate::scene::Scene;
use crate::textures::{COLOR_KEY, TextureSet};

/// Distances are clamped to this floor before any perspective division.
const NEAR: f32 = 0.1;

/// Channel multipliers are `k / distance`: full brightness at `k` world
/// units, darker beyond, clamped brighter up close. Walls, the two
/// horizontal surfaces, and sprites are tuned independently.
const WALL_BRIGHTNESS: f32 = 160.0;
const FLOOR_BRIGHTNESS: f32 = 140.0;
const CEILING_BRIGHTNESS: f32 = 90.0;
const SPRITE_BRIGHTNESS: f32 = 160.0;

/// Slice color for wall materials with no registered texture.
const UNTEXTURED_WALL: [u8; 3] = [200, 200, 200];
/// Flat fills when no floor/ceiling tile is registered.
const BARE_FLOOR: [u8; 3] = [40, 40, 40];
const BARE_CEILING: [u8; 3] = [30, 30, 70];

/// Owns the pixel buffer and the per-column depth array, and runs the three
/// rasterizer passes over them each frame.
pub struct Renderer {
    camera: Camera,
    frame: Vec<u8>,
    depth: Vec<f32>,
    // Per-column relative ray angle and its cosine, fixed per camera.
    rel_angles: Vec<f32>,
    rel_cos: Vec<f32>,
}

/// One frame's inputs and outputs, threaded through the pass functions.
struct RenderPass<'a> {
    scene: &'a Scene,
    textures: &'a TextureSet,
    camera: &'a Camera,
    pos: Vec2,
    angle: f32,
    rel_angles: &'a [f32],
    rel_cos: &'a [f32],
    /// World-space ray direction per column for this frame's facing.
    column_dirs: &'a [Vec2],
    frame: &'a mut [u8],
    depth: &'a mut [f32],
}

impl Renderer {
    pub fn new(camera: Camera) -> Self {
        let columns = camera.plane_width as usize;
        let rel_angles: Vec<f32> = (0..camera.plane_width)
            .map(|x| camera.relative_angle(x))
            .collect();
        let rel_cos = rel_angles.iter().map(|a| a.cos()).collect();
        Self {
            camera,
            frame: vec![0; columns * camera.plane_height as usize * 4],
            depth: vec![f32::INFINITY; columns],
            rel_angles,
            rel_cos,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Composited RGBA frame, row-major.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// For overlays drawn by the shell after the 3D passes.
    pub fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.frame
    }

    /// Corrected wall distance per column from the last frame.
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Renders one frame: floor/ceiling, then walls (filling the depth
    /// array), then sprites (consuming it). Pure in its inputs; both
    /// buffers are fully overwritten.
    pub fn render(&mut self, scene: &Scene, textures: &TextureSet, player: &Player) {
        self.frame.fill(0);
        let column_dirs: Vec<Vec2> = self
            .rel_angles
            .iter()
            .map(|rel| Vec2::from_angle(player.angle + rel))
            .collect();
        let mut pass = RenderPass {
            scene,
            textures,
            camera: &self.camera,
            pos: player.pos,
            angle: player.angle,
            rel_angles: &self.rel_angles,
            rel_cos: &self.rel_cos,
            column_dirs: &column_dirs,
            frame: &mut self.frame,
            depth: &mut self.depth,
        };
        draw_floor_ceiling(&mut pass);
        draw_walls(&mut pass);
        draw_sprites(&mut pass);
    }
}

#[inline]
fn shade(channel: u8, level: f32) -> u8 {
    (channel as f32 * level).clamp(0.0, 255.0) as u8
}

#[inline]
fn put_shaded(frame: &mut [u8], width: u32, x: u32, y: u32, rgb: [u8; 3], level: f32) {
    let i = (y * width + x) as usize * 4;
    frame[i] = shade(rgb[0], level);
    frame[i + 1] = shade(rgb[1], level);
    frame[i + 2] = shade(rgb[2], level);
    frame[i + 3] = 255;
}

/// One ray per column: cast, fisheye-correct, project the slice height,
/// sample the wall tile, record the column depth.
fn draw_walls(p: &mut RenderPass) {
    let scene = p.scene;
    let textures = p.textures;
    let cam = p.camera;
    let width = cam.plane_width;
    let plane_h = cam.plane_height as f32;
    let half_h = plane_h * 0.5;
    let block = scene.block_size();

    for x in 0..width {
        let Some(hit) = raycast::cast(scene, p.pos, p.angle + p.rel_angles[x as usize]) else {
            p.depth[x as usize] = f32::INFINITY;
            continue;
        };
        // Perpendicular distance to the projection plane. Projecting the
        // Euclidean distance would bow straight walls outward.
        let corrected = (hit.distance * p.rel_cos[x as usize]).max(NEAR);
        p.depth[x as usize] = corrected;

        let slice_h = block / corrected * cam.projection_distance;
        let top = half_h - slice_h * 0.5;
        let y0 = top.max(0.0) as u32;
        let y1 = (half_h + slice_h * 0.5).min(plane_h) as u32;
        let level = WALL_BRIGHTNESS / corrected;

        match textures.get(hit.material) {
            Some(tex) => {
                // tex_column counts block pixels; rescale for tiles whose
                // width differs from the block edge.
                let tex_x = hit.tex_column * tex.width() / block as u32;
                let step = tex.height() as f32 / slice_h;
                let mut tex_y = (y0 as f32 - top) * step;
                for y in y0..y1 {
                    let row = (tex_y as u32).min(tex.height() - 1);
                    let texel = tex.texel(tex_x, row);
                    put_shaded(p.frame, width, x, y, [texel[0], texel[1], texel[2]], level);
                    tex_y += step;
                }
            }
            None => {
                for y in y0..y1 {
                    put_shaded(p.frame, width, x, y, UNTEXTURED_WALL, level);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Surface {
    Floor,
    Ceiling,
}

fn draw_floor_ceiling(p: &mut RenderPass) {
    draw_horizontal_surface(p, Surface::Floor);
    draw_horizontal_surface(p, Surface::Ceiling);
}

/// Inverse perspective projection per row: every pixel below (or above)
/// the horizon maps back to a world point whose wrapped offset inside its
/// block picks the texel.
fn draw_horizontal_surface(p: &mut RenderPass, surface: Surface) {
    let scene = p.scene;
    let textures = p.textures;
    let cam = p.camera;
    let width = cam.plane_width;
    let half = cam.plane_height / 2;
    let block = scene.block_size();

    let (material, brightness, bare) = match surface {
        Surface::Floor => (scene.floor_material(), FLOOR_BRIGHTNESS, BARE_FLOOR),
        Surface::Ceiling => (scene.ceiling_material(), CEILING_BRIGHTNESS, BARE_CEILING),
    };
    let tile = textures.get(material);

    // The floor's bottom row is plane_height - 1 (d = half - 1); the
    // mirrored ceiling reaches one row further, up to the top of the frame.
    let max_d = match surface {
        Surface::Floor => half - 1,
        Surface::Ceiling => half,
    };
    for d in 1..=max_d {
        let y = match surface {
            Surface::Floor => half + d,
            Surface::Ceiling => half - d,
        };
        let Some(tex) = tile else {
            for x in 0..width {
                put_shaded(p.frame, width, x, y, bare, 1.0);
            }
            continue;
        };
        let row_dist = cam.projection_distance * cam.eye_height / d as f32;
        for x in 0..width {
            let dist = row_dist / p.rel_cos[x as usize];
            let world = p.pos + p.column_dirs[x as usize] * dist;
            let u = world.x.rem_euclid(block) / block;
            let v = world.y.rem_euclid(block) / block;
            let texel = tex.texel(
                (u * tex.width() as f32) as u32,
                (v * tex.height() as f32) as u32,
            );
            put_shaded(
                p.frame,
                width,
                x,
                y,
                [texel[0], texel[1], texel[2]],
                brightness / dist,
            );
        }
    }
}

/// Billboards, far to near, depth-tested per column against the walls.
/// Sprites never write depth; paint order alone settles sprite-vs-sprite
/// overlap.
fn draw_sprites(p: &mut RenderPass) {
    let scene = p.scene;
    let textures = p.textures;
    let cam = p.camera;
    let width = cam.plane_width;
    let plane_h = cam.plane_height as f32;
    let half_h = plane_h * 0.5;
    let block = scene.block_size();

    let mut order: Vec<usize> = (0..scene.sprites().len()).collect();
    order.sort_by(|&a, &b| {
        let da = (scene.sprites()[a].pos - p.pos).length_squared();
        let db = (scene.sprites()[b].pos - p.pos).length_squared();
        db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
    });

    for i in order {
        let sprite = scene.sprites()[i];
        let Some(tex) = textures.get(sprite.material) else {
            continue;
        };
        let delta = sprite.pos - p.pos;
        let dist = delta.length();
        if dist < NEAR {
            continue;
        }
        let bearing = delta.y.atan2(delta.x);
        let rel = math::angle_diff(bearing, p.angle);
        let screen_x = (rel + cam.fov * 0.5) * width as f32 / cam.fov;
        let size = block * cam.projection_distance / dist;
        let left = screen_x - size * 0.5;
        let top = half_h - size * 0.5;

        let x0 = left.max(0.0) as u32;
        let x1 = (screen_x + size * 0.5).clamp(0.0, width as f32) as u32;
        let y0 = top.max(0.0) as u32;
        let y1 = (half_h + size * 0.5).clamp(0.0, plane_h) as u32;
        let level = SPRITE_BRIGHTNESS / dist;

        for x in x0..x1 {
            if dist >= p.depth[x as usize] {
                continue;
            }
            let tex_x = ((x as f32 - left) / size * tex.width() as f32) as u32;
            for y in y0..y1 {
                let tex_y = ((y as f32 - top) / size * tex.height() as f32) as u32;
                let texel = tex.texel(
                    tex_x.min(tex.width() - 1),
                    tex_y.min(tex.height() - 1),
                );
                let rgb = [texel[0], texel[1], texel[2]];
                if rgb == COLOR_KEY {
                    continue;
                }
                put_shaded(p.frame, width, x, y, rgb, level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EMPTY, Sprite};
    use crate::textures::{Texture, orb};

    const BLOCK: f32 = 64.0;

    fn camera() -> Camera {
        Camera::new(640, 480, 60.0, 32.0)
    }

    fn walled(size: usize, sprites: Vec<Sprite>) -> Scene {
        let mut cells = vec![EMPTY; size * size];
        for i in 0..size {
            cells[i] = 1;
            cells[(size - 1) * size + i] = 1;
            cells[i * size] = 1;
            cells[i * size + size - 1] = 1;
        }
        Scene::new(cells, size, size, BLOCK, sprites)
    }

    fn solid(rgb: [u8; 3]) -> Texture {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Texture::from_raw(2, 2, data)
    }

    #[test]
    fn fisheye_correction_flattens_perpendicular_walls() {
        let scene = walled(6, Vec::new());
        let player = Player::new(Vec2::new(192.0, 192.0), 0.0);
        let mut renderer = Renderer::new(camera());
        renderer.render(&scene, &TextureSet::new(), &player);

        let depth = renderer.depth();
        let center = depth[320];
        // The wall face is the x = 320 grid line, 128 units ahead.
        assert!((center - 128.0).abs() < 0.5, "center depth {center}");
        for k in [40u32, 120, 240] {
            let l = depth[(320 - k) as usize];
            let r = depth[(320 + k) as usize];
            // Symmetric columns agree, and the flat wall has constant
            // corrected depth across the whole span.
            assert!((l - r).abs() < 0.5, "k={k}: {l} vs {r}");
            assert!((l - center).abs() < 0.5, "k={k}: {l} vs center {center}");

            // The Euclidean distance for the same ray is strictly longer;
            // equality would mean the correction was skipped.
            let cam = renderer.camera();
            let rel = cam.relative_angle(320 - k);
            let raw = raycast::cast(&scene, player.pos, player.angle + rel)
                .unwrap()
                .distance;
            assert!(raw - l > 0.1, "k={k}: raw {raw} vs corrected {l}");
        }
    }

    #[test]
    fn sprite_behind_wall_writes_nothing() {
        // Sprite sits inside the far perimeter wall, beyond every column's
        // wall hit.
        let sprite = Sprite {
            pos: Vec2::new(290.0, 96.0),
            material: 6,
        };
        let with = walled(5, vec![sprite]);
        let without = walled(5, Vec::new());
        let mut textures = TextureSet::new();
        textures.insert(6, orb(32, [250, 230, 90]));
        let player = Player::new(Vec2::new(96.0, 96.0), 0.0);

        let mut a = Renderer::new(camera());
        a.render(&with, &textures, &player);
        let mut b = Renderer::new(camera());
        b.render(&without, &textures, &player);
        assert!(a.frame() == b.frame());
    }

    #[test]
    fn nearer_sprite_paints_over_farther() {
        let near = Sprite {
            pos: Vec2::new(200.0, 256.0),
            material: 6,
        };
        let far = Sprite {
            pos: Vec2::new(300.0, 256.0),
            material: 7,
        };
        let mut textures = TextureSet::new();
        textures.insert(6, solid([0, 120, 0]));
        textures.insert(7, solid([0, 0, 120]));
        let player = Player::new(Vec2::new(96.0, 256.0), 0.0);

        let mut a = Renderer::new(camera());
        a.render(&walled(8, vec![far, near]), &textures, &player);
        let mut b = Renderer::new(camera());
        b.render(&walled(8, vec![near, far]), &textures, &player);

        // Input order is irrelevant; distance order decides.
        assert!(a.frame() == b.frame());

        // Both sprites cover the screen center; the nearer (green) one wins.
        let i = (240 * 640 + 320) * 4;
        let pixel = &a.frame()[i..i + 4];
        assert!(pixel[1] > 0, "green channel empty: {pixel:?}");
        assert_eq!(pixel[2], 0, "far sprite visible: {pixel:?}");
    }

    #[test]
    fn render_is_deterministic() {
        let scene = walled(6, Vec::new()).with_surfaces(8, 9);
        let mut textures = TextureSet::new();
        textures.insert(1, crate::textures::brick(64, [150, 60, 40], [90, 90, 90]));
        textures.insert(8, crate::textures::checker(32, [70, 70, 70], [50, 50, 50]));
        textures.insert(9, crate::textures::checker(32, [40, 40, 60], [30, 30, 40]));
        let player = Player::new(Vec2::new(150.0, 200.0), 0.7);

        let mut a = Renderer::new(camera());
        a.render(&scene, &textures, &player);
        let first = a.frame().to_vec();
        a.render(&scene, &textures, &player);
        assert!(a.frame() == first.as_slice());
    }

    #[test]
    fn depth_matches_corrected_cast_distance() {
        let scene = walled(6, Vec::new());
        let player = Player::new(Vec2::new(130.0, 210.0), 2.1);
        let mut renderer = Renderer::new(camera());
        renderer.render(&scene, &TextureSet::new(), &player);

        let cam = *renderer.camera();
        for x in [0u32, 123, 320, 639] {
            let rel = cam.relative_angle(x);
            let hit = raycast::cast(&scene, player.pos, player.angle + rel).unwrap();
            let expected = hit.distance * rel.cos();
            let got = renderer.depth()[x as usize];
            assert!((got - expected).abs() < 1e-3, "column {x}: {got} vs {expected}");
        }
    }
}
