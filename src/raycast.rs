use glam::Vec2;

use crate::math;
use crate::scene::{EMPTY, MaterialId, Scene};

/// Direction components smaller than this are treated as axis-aligned: the
/// sweep that would never cross its family of grid lines is skipped instead
/// of dividing by a vanishing component.
const AXIS_EPS: f32 = 1e-6;

/// Nearest wall crossed by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Euclidean distance from the ray origin to the hit point.
    pub distance: f32,
    /// Pixel offset along the struck edge, `0..block_size`. Picks the
    /// texture column for the wall slice.
    pub tex_column: u32,
    /// Cell code of the struck wall.
    pub material: MaterialId,
}

/// A candidate hit from one sweep family, before the two are compared.
struct Candidate {
    point: Vec2,
    /// World-unit offset along the struck edge, `[0, block_size)`.
    offset: f32,
    material: MaterialId,
}

/// Casts a ray from `origin` at `angle` and returns the nearest wall it
/// crosses, or `None` if the ray leaves the grid first.
///
/// Two independent traversals walk the ray across horizontal and vertical
/// grid lines (a 2D DDA); whichever finds the nearer wall wins. Exactly
/// equal distances resolve to the horizontal candidate, which only matters
/// for rays striking a corner dead on.
pub fn cast(scene: &Scene, origin: Vec2, angle: f32) -> Option<RayHit> {
    let dir = Vec2::from_angle(angle);

    let h = horizontal_sweep(scene, origin, dir);
    let v = vertical_sweep(scene, origin, dir);

    let best = match (h, v) {
        (None, None) => return None,
        (Some(c), None) | (None, Some(c)) => c,
        (Some(h), Some(v)) => {
            // Compare squared lengths; the square root happens once below.
            if (h.point - origin).length_squared() <= (v.point - origin).length_squared() {
                h
            } else {
                v
            }
        }
    };

    let last_column = scene.block_size() as u32 - 1;
    Some(RayHit {
        distance: (best.point - origin).length(),
        tex_column: (best.offset as u32).min(last_column),
        material: best.material,
    })
}

/// Walks the ray across horizontal grid lines (`y = k * block_size`).
///
/// An edge coordinate is ambiguous between the cells above and below it, so
/// the sampled row is shifted toward the travel direction: descending rays
/// sample the row below the line, ascending rays the row above it. The hit
/// point itself stays on the line.
fn horizontal_sweep(scene: &Scene, origin: Vec2, dir: Vec2) -> Option<Candidate> {
    if dir.y.abs() < AXIS_EPS {
        return None;
    }
    let block = scene.block_size();

    let (mut y, step_y, row_shift) = if dir.y > 0.0 {
        ((origin.y / block).floor() * block + block, block, 0)
    } else {
        ((origin.y / block).floor() * block, -block, -1)
    };
    let mut x = origin.x + (y - origin.y) * dir.x / dir.y;
    let step_x = step_y * dir.x / dir.y;

    loop {
        let col = math::cell_index(x, block);
        let row = math::cell_index(y, block) + row_shift;
        match scene.cell(col, row) {
            Err(_) => return None,
            Ok(EMPTY) => {
                x += step_x;
                y += step_y;
            }
            Ok(material) => {
                return Some(Candidate {
                    point: Vec2::new(x, y),
                    offset: x - col as f32 * block,
                    material,
                });
            }
        }
    }
}

/// Mirror of `horizontal_sweep` across vertical grid lines
/// (`x = k * block_size`).
fn vertical_sweep(scene: &Scene, origin: Vec2, dir: Vec2) -> Option<Candidate> {
    if dir.x.abs() < AXIS_EPS {
        return None;
    }
    let block = scene.block_size();

    let (mut x, step_x, col_shift) = if dir.x > 0.0 {
        ((origin.x / block).floor() * block + block, block, 0)
    } else {
        ((origin.x / block).floor() * block, -block, -1)
    };
    let mut y = origin.y + (x - origin.x) * dir.y / dir.x;
    let step_y = step_x * dir.y / dir.x;

    loop {
        let col = math::cell_index(x, block) + col_shift;
        let row = math::cell_index(y, block);
        match scene.cell(col, row) {
            Err(_) => return None,
            Ok(EMPTY) => {
                x += step_x;
                y += step_y;
            }
            Ok(material) => {
                return Some(Candidate {
                    point: Vec2::new(x, y),
                    offset: y - row as f32 * block,
                    material,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    const BLOCK: f32 = 64.0;

    /// `size x size` grid walled along the perimeter, empty inside.
    fn walled(size: usize) -> Scene {
        let mut cells = vec![EMPTY; size * size];
        for i in 0..size {
            cells[i] = 1;
            cells[(size - 1) * size + i] = 1;
            cells[i * size] = 1;
            cells[i * size + size - 1] = 1;
        }
        Scene::new(cells, size, size, BLOCK, Vec::new())
    }

    /// 3x3 grid of walls with only the center cell empty.
    fn closet() -> Scene {
        let mut cells = vec![2; 9];
        cells[4] = EMPTY;
        Scene::new(cells, 3, 3, BLOCK, Vec::new())
    }

    #[test]
    fn interior_rays_always_hit() {
        let scene = walled(8);
        let origins = [
            Vec2::new(100.0, 100.0),
            Vec2::new(256.0, 300.0),
            Vec2::new(410.3, 97.7),
        ];
        let diagonal = scene.diagonal();
        for origin in origins {
            for step in 0..72 {
                let angle = step as f32 * TAU / 72.0 + 0.013;
                let hit = cast(&scene, origin, angle)
                    .unwrap_or_else(|| panic!("ray escaped at angle {angle}"));
                assert!(hit.distance > 0.0);
                assert!(hit.distance <= diagonal);
                assert_eq!(hit.material, 1);
            }
        }
    }

    #[test]
    fn axis_aligned_rays_hit_without_blowup() {
        let scene = closet();
        // Center of the middle cell; the wall face is half a block away in
        // every axis direction.
        let origin = Vec2::new(96.0, 96.0);
        for angle in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2] {
            let hit = cast(&scene, origin, angle).expect("axis ray must hit");
            assert!(
                (hit.distance - BLOCK / 2.0).abs() < 1e-3,
                "angle {angle}: distance {}",
                hit.distance
            );
        }
    }

    #[test]
    fn head_on_cast_reports_wall_face_midpoint() {
        let scene = closet();
        let hit = cast(&scene, Vec2::new(96.0, 96.0), 0.0).unwrap();
        assert!((hit.distance - 32.0).abs() < 1e-4);
        assert_eq!(hit.material, 2);
        // The ray strikes the middle of the wall edge, half a block along it.
        assert_eq!(hit.tex_column, BLOCK as u32 / 2);
    }

    #[test]
    fn nearer_sweep_wins() {
        // Wall one cell to the east, two cells to the south; a ray aimed
        // between them must report the eastern (vertical-edge) hit.
        let cells = vec![
            1, 1, 1, 1, 1, //
            1, 0, 0, 3, 1, //
            1, 0, 0, 3, 1, //
            1, 0, 0, 3, 1, //
            1, 1, 1, 1, 1, //
        ];
        let scene = Scene::new(cells, 5, 5, BLOCK, Vec::new());
        let origin = Vec2::new(96.0, 96.0);
        // Shallow angle toward +x, slightly downward.
        let hit = cast(&scene, origin, 0.2).unwrap();
        assert_eq!(hit.material, 3);
        let expected = (3.0 * BLOCK - origin.x) / 0.2f32.cos();
        assert!((hit.distance - expected).abs() < 1e-2);
    }

    #[test]
    fn descending_rays_sample_the_entered_cell() {
        // Wall only in the top row; a ray going up must hit its underside,
        // not a phantom cell below the edge.
        let cells = vec![
            4, 4, 4, //
            0, 0, 0, //
            0, 0, 0, //
        ];
        let scene = Scene::new(cells, 3, 3, BLOCK, Vec::new());
        let origin = Vec2::new(96.0, 160.0);
        let hit = cast(&scene, origin, -FRAC_PI_2 + 0.05).unwrap();
        assert_eq!(hit.material, 4);
        // Hit point sits on the y = block_size line.
        let along = hit.distance * (-FRAC_PI_2 + 0.05f32).sin();
        assert!((origin.y + along - BLOCK).abs() < 1e-2);
    }

    #[test]
    fn open_grid_reports_no_hit() {
        let scene = Scene::new(vec![EMPTY; 9], 3, 3, BLOCK, Vec::new());
        assert_eq!(cast(&scene, Vec2::new(96.0, 96.0), 0.37), None);
    }

    #[test]
    fn facing_angle_may_exceed_tau() {
        let scene = closet();
        let origin = Vec2::new(96.0, 96.0);
        let a = cast(&scene, origin, 0.4).unwrap();
        let b = cast(&scene, origin, 0.4 + TAU).unwrap();
        assert!((a.distance - b.distance).abs() < 1e-3);
        assert_eq!(a.material, b.material);
    }
}
