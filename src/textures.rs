use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::scene::MaterialId;

/// Texels of exactly this color are transparent in the sprite pass.
pub const COLOR_KEY: [u8; 3] = [255, 0, 255];

/// A texture file could not be loaded. Fatal at startup: rendering cannot
/// proceed with a half-registered material catalog.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
}

/// An RGBA tile sampled by the rasterizers. Wall tiles are `block_size`
/// pixels wide with arbitrary height; sprite and floor tiles are free-form.
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Texture {
    /// Wraps raw row-major RGBA pixels.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
        }
    }

    /// Decodes an encoded image (PNG and friends) into an RGBA tile.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_raw(width, height, rgba.into_raw()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA texel; coordinates wrap, so callers may sample with raw world
    /// offsets and get the tiled repeat for free.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y % self.height) * self.width + x % self.width) as usize * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Material id to texture tile registry. Materials without an entry fall
/// back to flat shading at draw time.
#[derive(Default)]
pub struct TextureSet {
    tiles: HashMap<MaterialId, Texture>,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: MaterialId, texture: Texture) {
        self.tiles.insert(material, texture);
    }

    /// Reads and decodes an image file for `material`.
    pub fn load_file(&mut self, material: MaterialId, path: &Path) -> Result<(), TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let texture = Texture::decode(&bytes).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        self.insert(material, texture);
        Ok(())
    }

    pub fn get(&self, material: MaterialId) -> Option<&Texture> {
        self.tiles.get(&material)
    }
}

/// Checkerboard tile, `size` pixels square.
pub fn checker(size: u32, light: [u8; 3], dark: [u8; 3]) -> Texture {
    let mut data = Vec::with_capacity(size as usize * size as usize * 4);
    let half = size / 2;
    for y in 0..size {
        for x in 0..size {
            let c = if (x < half) == (y < half) { light } else { dark };
            data.extend_from_slice(&[c[0], c[1], c[2], 255]);
        }
    }
    Texture::from_raw(size, size, data)
}

/// Brick-pattern wall tile: offset courses separated by mortar lines.
pub fn brick(size: u32, face: [u8; 3], mortar: [u8; 3]) -> Texture {
    assert!(size >= 4);
    let mut data = Vec::with_capacity(size as usize * size as usize * 4);
    let course_h = size / 4;
    let brick_w = size / 2;
    for y in 0..size {
        let course = y / course_h;
        let shift = if course % 2 == 0 { 0 } else { brick_w / 2 };
        for x in 0..size {
            let in_mortar =
                y % course_h == 0 || (x + shift) % brick_w == 0;
            let c = if in_mortar { mortar } else { face };
            data.extend_from_slice(&[c[0], c[1], c[2], 255]);
        }
    }
    Texture::from_raw(size, size, data)
}

/// Round billboard sprite on a color-keyed background.
pub fn orb(size: u32, body: [u8; 3]) -> Texture {
    let mut data = Vec::with_capacity(size as usize * size as usize * 4);
    let center = (size as f32 - 1.0) * 0.5;
    let radius = size as f32 * 0.4;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if (dx * dx + dy * dy).sqrt() <= radius {
                // Dim toward the rim for a little roundness.
                let t = 1.0 - (dx * dx + dy * dy).sqrt() / radius * 0.5;
                data.extend_from_slice(&[
                    (body[0] as f32 * t) as u8,
                    (body[1] as f32 * t) as u8,
                    (body[2] as f32 * t) as u8,
                    255,
                ]);
            } else {
                data.extend_from_slice(&[COLOR_KEY[0], COLOR_KEY[1], COLOR_KEY[2], 255]);
            }
        }
    }
    Texture::from_raw(size, size, data)
}
