/// Projection parameters, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Width of the projection plane in pixels; one ray per column.
    pub plane_width: u32,
    /// Height of the projection plane in pixels.
    pub plane_height: u32,
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Eye height above the floor in world units. Only the floor/ceiling
    /// perspective uses it.
    pub eye_height: f32,
    /// Distance from the eye to the projection plane, derived from the FOV
    /// and plane width.
    pub projection_distance: f32,
}

impl Camera {
    pub fn new(plane_width: u32, plane_height: u32, fov_degrees: f32, eye_height: f32) -> Self {
        let fov = fov_degrees.to_radians();
        Self {
            plane_width,
            plane_height,
            fov,
            eye_height,
            projection_distance: plane_width as f32 * 0.5 / (fov * 0.5).tan(),
        }
    }

    /// Ray angle for a pixel column, relative to the facing direction.
    /// Column 0 looks along the left FOV edge.
    #[inline]
    pub fn relative_angle(&self, column: u32) -> f32 {
        -self.fov * 0.5 + column as f32 * self.fov / self.plane_width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_distance_follows_fov() {
        let cam = Camera::new(640, 480, 60.0, 32.0);
        let expected = 320.0 / (30f32.to_radians()).tan();
        assert!((cam.projection_distance - expected).abs() < 1e-3);
    }

    #[test]
    fn relative_angles_span_the_fov() {
        let cam = Camera::new(640, 480, 60.0, 32.0);
        assert!((cam.relative_angle(0) + cam.fov * 0.5).abs() < 1e-6);
        assert!(cam.relative_angle(320).abs() < 1e-6);
        let last = cam.relative_angle(639);
        assert!(last > 0.0 && last < cam.fov * 0.5);
    }
}
