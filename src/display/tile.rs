use rayon::prelude::*;

/// Edge length, in canvas pixels, of the square region each tile covers.
pub const TILE_SIZE: u32 = 32;
/// Integer upscale applied to every tile image.
pub const TILE_SCALE: u32 = 3;
/// Edge length of the image delivered per tile (`TILE_SIZE * TILE_SCALE`).
pub const TILE_IMAGE_SIZE: u32 = TILE_SIZE * TILE_SCALE;

/// One delivered tile: absolute tile coordinates plus an upscaled image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub tile_x: i32,
    pub tile_z: i32,
    pub width: u32,
    pub height: u32,
    /// Row-major packed ARGB, `width * height` long.
    pub pixels: Vec<u32>,
}

/// Placement and size of a display in tile space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TileGrid {
    pub origin_x: i32,
    pub origin_z: i32,
    pub tiles_wide: u32,
    pub tiles_high: u32,
}

impl TileGrid {
    pub fn pixel_width(&self) -> u32 {
        self.tiles_wide * TILE_SIZE
    }

    pub fn pixel_height(&self) -> u32 {
        self.tiles_high * TILE_SIZE
    }

    pub fn total_pixels(&self) -> usize {
        self.pixel_width() as usize * self.pixel_height() as usize
    }

    pub fn tile_count(&self) -> usize {
        self.tiles_wide as usize * self.tiles_high as usize
    }

    /// Cut a full canvas into tiles, row-major (all of row 0 left to right, then row 1, ...).
    ///
    /// Output pixel `(x, y)` of the tile at local grid position `(cx, cz)` samples canvas pixel
    /// `(cx * TILE_SIZE + x / TILE_SCALE, cz * TILE_SIZE + y / TILE_SCALE)`, clamped to the
    /// canvas. The caller guarantees `canvas.len() == self.total_pixels()`.
    pub fn cut(&self, canvas: &[u32]) -> Vec<Tile> {
        debug_assert_eq!(
            canvas.len(),
            self.total_pixels(),
            "canvas length must match the grid"
        );
        let cols = self.tiles_wide as usize;
        (0..self.tile_count())
            .into_par_iter()
            .map(|i| {
                let cx = (i % cols) as u32;
                let cz = (i / cols) as u32;
                self.cut_one(canvas, cx, cz)
            })
            .collect()
    }

    fn cut_one(&self, canvas: &[u32], cx: u32, cz: u32) -> Tile {
        let pw = self.pixel_width();
        let ph = self.pixel_height();
        let start_x = cx * TILE_SIZE;
        let start_z = cz * TILE_SIZE;

        let side = TILE_IMAGE_SIZE as usize;
        let mut pixels = vec![0u32; side * side];
        for z in 0..TILE_IMAGE_SIZE {
            let src_z = (start_z + z / TILE_SCALE).min(ph - 1) as usize;
            let src_row = &canvas[src_z * pw as usize..(src_z + 1) * pw as usize];
            let dst_row = &mut pixels[z as usize * side..(z as usize + 1) * side];
            for (x, dst) in dst_row.iter_mut().enumerate() {
                let src_x = (start_x + x as u32 / TILE_SCALE).min(pw - 1) as usize;
                *dst = src_row[src_x];
            }
        }

        Tile {
            tile_x: self.origin_x + cx as i32,
            tile_z: self.origin_z + cz as i32,
            width: TILE_IMAGE_SIZE,
            height: TILE_IMAGE_SIZE,
            pixels,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/tile.rs"]
mod tests;
