use glam::Vec2;

use crate::math;

/// Player pose. Owned and mutated by the shell; the renderer reads it once
/// per frame.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub pos: Vec2,
    /// Facing angle in radians, kept in `[0, TAU)` here. The renderer
    /// tolerates any real value regardless.
    pub angle: f32,
}

impl Player {
    pub fn new(pos: Vec2, angle: f32) -> Self {
        Self {
            pos,
            angle: math::normalize_rad(angle),
        }
    }

    /// Moves along the facing direction; negative distance walks backwards.
    pub fn advance(&mut self, distance: f32) {
        self.pos += Vec2::from_angle(self.angle) * distance;
    }

    pub fn turn(&mut self, delta: f32) {
        self.angle = math::normalize_rad(self.angle + delta);
    }
}
