use crate::braille::BrailleCanvas;

/// Draw a circle outline using the midpoint algorithm
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (dx, dy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx.saturating_add(dx), cy.saturating_add(dy));
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Whether a ring's bounding box touches the canvas at all
pub fn ring_might_be_visible(cx: i32, cy: i32, radius: i32, width: usize, height: usize) -> bool {
    cx.saturating_add(radius) >= 0
        && cx.saturating_sub(radius) < width as i32
        && cy.saturating_add(radius) >= 0
        && cy.saturating_sub(radius) < height as i32
}
