use std::f32::consts::{PI, TAU};

/// Wraps an angle into `[0, TAU)`.
#[inline]
pub fn normalize_rad(angle: f32) -> f32 {
    angle - (angle / TAU).floor() * TAU
}

/// Shortest signed difference `a - b`, wrapped into `(-PI, PI]`.
///
/// Keeps bearings continuous with the view window when the two angles
/// straddle the `0/TAU` seam.
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let diff = normalize_rad(a - b);
    if diff > PI { diff - TAU } else { diff }
}

/// Index of the grid cell containing a continuous coordinate.
///
/// Floor division, so negative coordinates land in negative cells instead
/// of collapsing onto cell zero.
#[inline]
pub fn cell_index(coord: f32, cell_size: f32) -> i32 {
    (coord / cell_size).floor() as i32
}
