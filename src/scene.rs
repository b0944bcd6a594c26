use glam::Vec2;
use thiserror::Error;

/// Cell code in the grid. `EMPTY` means walkable; anything else names a
/// wall material and doubles as the key into the texture registry.
pub type MaterialId = u8;

pub const EMPTY: MaterialId = 0;

/// Coordinate or cell index outside the grid extent. Never fatal: the ray
/// caster reads it as "ray leaves the world".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("coordinate outside the grid")]
pub struct OutOfBounds;

/// A point object in the world, rendered as a camera-facing billboard.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub pos: Vec2,
    pub material: MaterialId,
}

/// Rectangular tile grid plus the sprites living inside it.
///
/// Constructed once per session and read-only afterwards. World coordinates
/// span `[0, width) x [0, height)` where each cell edge is `block_size`
/// world units long.
pub struct Scene {
    cells: Vec<MaterialId>,
    cols: usize,
    rows: usize,
    block_size: f32,
    width: f32,
    height: f32,
    sprites: Vec<Sprite>,
    floor_material: MaterialId,
    ceiling_material: MaterialId,
}

impl Scene {
    /// `cells` is row-major, `cols * rows` entries.
    pub fn new(
        cells: Vec<MaterialId>,
        cols: usize,
        rows: usize,
        block_size: f32,
        sprites: Vec<Sprite>,
    ) -> Self {
        assert_eq!(cells.len(), cols * rows, "grid must be rectangular");
        assert!(block_size > 0.0);
        Self {
            cells,
            cols,
            rows,
            block_size,
            width: cols as f32 * block_size,
            height: rows as f32 * block_size,
            sprites,
            floor_material: EMPTY,
            ceiling_material: EMPTY,
        }
    }

    /// Selects the tiles the floor/ceiling pass samples. Materials left at
    /// `EMPTY` fall back to flat fills.
    pub fn with_surfaces(mut self, floor: MaterialId, ceiling: MaterialId) -> Self {
        self.floor_material = floor;
        self.ceiling_material = ceiling;
        self
    }

    /// Material at a continuous world coordinate.
    pub fn cell_at(&self, x: f32, y: f32) -> Result<MaterialId, OutOfBounds> {
        if x < 0.0 || y < 0.0 || x >= self.width || y >= self.height {
            return Err(OutOfBounds);
        }
        let col = (x / self.block_size) as usize;
        let row = (y / self.block_size) as usize;
        Ok(self.cells[row * self.cols + col])
    }

    /// Material at a cell index. The ray caster resolves edge hits to cell
    /// indices itself (the entered cell depends on travel direction), so it
    /// samples through this rather than `cell_at`.
    pub fn cell(&self, col: i32, row: i32) -> Result<MaterialId, OutOfBounds> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return Err(OutOfBounds);
        }
        Ok(self.cells[row as usize * self.cols + col as usize])
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn diagonal(&self) -> f32 {
        Vec2::new(self.width, self.height).length()
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn floor_material(&self) -> MaterialId {
        self.floor_material
    }

    pub fn ceiling_material(&self) -> MaterialId {
        self.ceiling_material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Scene {
        Scene::new(vec![1, 0, 0, 2], 2, 2, 64.0, Vec::new())
    }

    #[test]
    fn cell_at_maps_coordinates_to_cells() {
        let scene = two_by_two();
        assert_eq!(scene.cell_at(10.0, 10.0), Ok(1));
        assert_eq!(scene.cell_at(70.0, 10.0), Ok(0));
        assert_eq!(scene.cell_at(100.0, 100.0), Ok(2));
    }

    #[test]
    fn cell_at_boundaries() {
        let scene = two_by_two();
        assert_eq!(scene.cell_at(0.0, 0.0), Ok(1));
        assert_eq!(scene.cell_at(scene.width() - 1e-3, 0.0), Ok(0));
        assert_eq!(scene.cell_at(scene.width(), 0.0), Err(OutOfBounds));
        assert_eq!(scene.cell_at(0.0, scene.height()), Err(OutOfBounds));
        assert_eq!(scene.cell_at(-0.1, 0.0), Err(OutOfBounds));
        assert_eq!(scene.cell_at(0.0, -0.1), Err(OutOfBounds));
    }

    #[test]
    fn cell_rejects_indices_outside_grid() {
        let scene = two_by_two();
        assert_eq!(scene.cell(0, 0), Ok(1));
        assert_eq!(scene.cell(1, 1), Ok(2));
        assert_eq!(scene.cell(-1, 0), Err(OutOfBounds));
        assert_eq!(scene.cell(2, 0), Err(OutOfBounds));
        assert_eq!(scene.cell(0, 2), Err(OutOfBounds));
    }

    #[test]
    #[should_panic(expected = "rectangular")]
    fn ragged_grid_is_rejected() {
        let _ = Scene::new(vec![0, 0, 0], 2, 2, 64.0, Vec::new());
    }
}
