use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (outlines with weight >= 2)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Draw a filled circle (circle markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Clip a segment to the rectangle `[0, w) x [0, h)` (Liang-Barsky).
/// Returns `None` when nothing of it is inside.
pub fn clip_segment(p0: (i32, i32), p1: (i32, i32), w: i32, h: i32) -> Option<((i32, i32), (i32, i32))> {
    let (x0, y0) = (p0.0 as f64, p0.1 as f64);
    let (dx, dy) = (p1.0 as f64 - x0, p1.1 as f64 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, x0),
        (dx, (w - 1) as f64 - x0),
        (-dy, y0),
        (dy, (h - 1) as f64 - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Dot pattern used to shade a polygon interior
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPattern {
    None,
    Sparse,
    Checker,
    Solid,
}

impl FillPattern {
    /// Denser patterns for more opaque fills
    pub fn from_opacity(fill_opacity: f32) -> Self {
        if fill_opacity >= 0.75 {
            FillPattern::Solid
        } else if fill_opacity >= 0.35 {
            FillPattern::Checker
        } else if fill_opacity > 0.0 {
            FillPattern::Sparse
        } else {
            FillPattern::None
        }
    }

    #[inline(always)]
    fn covers(self, x: i32, y: i32) -> bool {
        match self {
            FillPattern::None => false,
            FillPattern::Sparse => x % 2 == 0 && y % 4 == 0,
            FillPattern::Checker => (x + y) % 2 == 0,
            FillPattern::Solid => true,
        }
    }
}

/// Scanline-fill projected rings with the even-odd rule, clipped to the canvas
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>], pattern: FillPattern) {
    if pattern == FillPattern::None {
        return;
    }

    let Some((min_y, max_y)) = rings
        .iter()
        .flatten()
        .fold(None, |acc: Option<(i32, i32)>, &(_, y)| match acc {
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            None => Some((y, y)),
        })
    else {
        return;
    };

    let max_x = canvas.pixel_width() as i32 - 1;
    let min_y = min_y.max(0);
    let max_y = max_y.min(canvas.pixel_height() as i32 - 1);
    let mut crossings: Vec<i32> = Vec::new();

    for y in min_y..=max_y {
        let scan = y as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for (i, &(x0, y0)) in ring.iter().enumerate() {
                let (x1, y1) = ring[(i + 1) % ring.len()];
                let (fy0, fy1) = (y0 as f64, y1 as f64);
                if (fy0 <= scan) != (fy1 <= scan) {
                    let t = (scan - fy0) / (fy1 - fy0);
                    crossings.push((x0 as f64 + t * (x1 - x0) as f64).round() as i32);
                }
            }
        }

        crossings.sort_unstable();
        for pair in crossings.chunks_exact(2) {
            for x in pair[0].max(0)..=pair[1].min(max_x) {
                if pattern.covers(x, y) {
                    canvas.set_pixel(x as usize, y as usize);
                }
            }
        }
    }
}

/// Even-odd point-in-polygon over all rings (exterior and holes)
pub fn point_in_rings(p: DVec2, rings: &[Vec<DVec2>]) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn solid_fill_covers_square() {
        let mut canvas = BrailleCanvas::new(2, 1);
        let square = vec![(0, 0), (4, 0), (4, 4), (0, 4)];
        fill_polygon(&mut canvas, &[square], FillPattern::Solid);
        assert_eq!(canvas.to_string(), "⣿⣿");
    }

    #[test]
    fn hole_is_left_empty() {
        let outer = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0), DVec2::new(0.0, 10.0)];
        let hole = vec![DVec2::new(4.0, 4.0), DVec2::new(6.0, 4.0), DVec2::new(6.0, 6.0), DVec2::new(4.0, 6.0)];
        let rings = vec![outer, hole];
        assert!(point_in_rings(DVec2::new(1.0, 1.0), &rings));
        assert!(!point_in_rings(DVec2::new(5.0, 5.0), &rings));
        assert!(!point_in_rings(DVec2::new(11.0, 5.0), &rings));
    }

    #[test]
    fn clipping_trims_far_endpoints() {
        let clipped = clip_segment((-1_000_000, 2), (1_000_000, 2), 10, 4).unwrap();
        assert_eq!(clipped, ((0, 2), (9, 2)));
        assert_eq!(clip_segment((20, 20), (30, 30), 10, 4), None);
        assert_eq!(clip_segment((1, 1), (3, 2), 10, 4), Some(((1, 1), (3, 2))));
    }

    #[test]
    fn pattern_follows_opacity() {
        assert_eq!(FillPattern::from_opacity(1.0), FillPattern::Solid);
        assert_eq!(FillPattern::from_opacity(0.5), FillPattern::Checker);
        assert_eq!(FillPattern::from_opacity(0.2), FillPattern::Sparse);
        assert_eq!(FillPattern::from_opacity(0.0), FillPattern::None);
    }
}
