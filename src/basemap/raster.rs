use super::{TileCache, TileCoord};
use crate::braille::BrailleCanvas;
use crate::map::Viewport;
use image::GrayImage;

/// Trace the cached tiles at `level` onto the canvas.
///
/// Each canvas dot samples the tile under it and sets the dot when the
/// greyscale change towards the next dot to the right or below exceeds
/// `threshold`. Flat areas stay empty, so coastlines, roads and borders come
/// out as lines.
pub fn trace_tiles(
    canvas: &mut BrailleCanvas,
    viewport: &Viewport,
    level: u8,
    cache: &TileCache,
    threshold: u8,
) {
    let n = (1u64 << level) as f64;
    let width = viewport.width.min(canvas.width() * 2);
    let height = viewport.height.min(canvas.height() * 4);
    // One dot expressed in world units
    let step = 1.0 / viewport.scale();

    let mut current: Option<(TileCoord, Option<&GrayImage>)> = None;

    for py in 0..height {
        for px in 0..width {
            let (x, y) = viewport.to_world(px as f64 + 0.5, py as f64 + 0.5);
            if !(0.0..1.0).contains(&y) {
                continue;
            }

            let tile_x = (x * n).floor();
            let tile_y = (y * n).floor();
            let coord = TileCoord::new(
                (tile_x as i64).rem_euclid(n as i64) as u32,
                tile_y as u32,
                level,
            );

            let tile = match current {
                Some((c, tile)) if c == coord => tile,
                _ => {
                    let tile = cache.get(&coord);
                    current = Some((coord, tile));
                    tile
                }
            };
            let Some(tile) = tile else {
                continue;
            };

            // Position inside the tile in its own pixels
            let (tw, th) = tile.dimensions();
            let u = (x * n - tile_x) * tw as f64;
            let v = (y * n - tile_y) * th as f64;
            let du = (step * n * tw as f64).max(1.0);
            let dv = (step * n * th as f64).max(1.0);

            let here = sample(tile, u, v);
            let right = sample(tile, u + du, v);
            let below = sample(tile, u, v + dv);
            let strength = here.abs_diff(right) as u16 + here.abs_diff(below) as u16;

            if strength > threshold as u16 {
                canvas.set_pixel(px, py);
            }
        }
    }
}

/// Greyscale value at a tile position, clamped to the tile edge
fn sample(tile: &GrayImage, u: f64, v: f64) -> u8 {
    let (w, h) = tile.dimensions();
    let x = (u.max(0.0) as u32).min(w.saturating_sub(1));
    let y = (v.max(0.0) as u32).min(h.saturating_sub(1));
    tile.get_pixel(x, y).0[0]
}
