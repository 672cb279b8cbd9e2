/// Empty braille pattern, U+2800
const BLANK: u32 = 0x2800;

/// Dot bit for each (x % 2, y % 4) position inside a cell.
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Braille Unicode canvas. Each character cell holds a 2x4 dot grid, so a
/// canvas of `width` x `height` characters has `width*2` x `height*4` dots.
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Dot bits per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Cell index and dot bit for a dot, if it lies on the canvas
    #[inline]
    fn locate(&self, x: usize, y: usize) -> Option<(usize, u8)> {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return None;
        }
        Some((cy * self.width + cx, DOT_BITS[x % 2][y % 4]))
    }

    /// Set a dot; off-canvas dots are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        if let Some((idx, bit)) = self.locate(x, y) {
            self.cells[idx] |= bit;
        }
    }

    /// Set a dot using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.locate(x, y)
            .is_some_and(|(idx, bit)| self.cells[idx] & bit != 0)
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in characters
    pub fn height(&self) -> usize {
        self.height
    }

    /// Each character row as a string of braille patterns
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height).map(|row| {
            row.iter()
                .map(|&bits| char::from_u32(BLANK + bits as u32).unwrap_or(' '))
                .collect()
        })
    }
}
