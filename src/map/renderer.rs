use crate::braille::BrailleCanvas;
use crate::map::geometry::{clip_segment, draw_circle, draw_line, draw_thick_line, fill_polygon, FillPattern};
use crate::map::projection::Viewport;
use crate::map::surface::{LayerKind, MapSurface, Shape};
use crate::map::LineString;
use glam::DVec2;
use ratatui::style::Color;

/// Basemap line colour
const TILE_COLOR: Color = Color::DarkGray;

/// A text overlay in character cells (icon glyphs and titles)
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub color: Color,
}

/// Rendered output, drawn back to front by the widget
pub struct MapLayers {
    pub basemap: BrailleCanvas,
    pub overlay: BrailleCanvas,
    pub labels: Vec<Label>,
}

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_basemap: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_basemap: true,
            show_labels: true,
        }
    }
}

/// Draws the attached layers of a [`MapSurface`] into braille canvases
#[derive(Default)]
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every attached layer for a canvas of `width` x `height` cells
    pub fn render(&self, surface: &MapSurface, width: usize, height: usize) -> MapLayers {
        let mut viewport = surface.viewport.clone();
        viewport.width = width * 2;
        viewport.height = height * 4;

        let mut basemap = BrailleCanvas::new(width, height);
        let mut overlay = BrailleCanvas::new(width, height);
        let mut labels = Vec::new();
        basemap.set_pen(TILE_COLOR);

        for (_, layer) in surface.attached() {
            match (&layer.kind, &layer.shape) {
                (LayerKind::Tile(_), Shape::Lines(lines)) => {
                    if self.settings.show_basemap {
                        for line in lines {
                            self.draw_linestring(&mut basemap, line, &viewport, false);
                        }
                    }
                }
                (LayerKind::Tile(_), _) => {}
                (LayerKind::Vector { .. }, Shape::Polygons(polygons)) => {
                    for rings in polygons {
                        let projected: Vec<Vec<(i32, i32)>> = rings
                            .iter()
                            .map(|ring| ring.iter().map(|p| viewport.project_point(*p)).collect())
                            .collect();
                        if !ring_might_be_visible(&projected, &viewport) {
                            continue;
                        }

                        overlay.set_pen(layer.style.fill_color.to_color());
                        fill_polygon(
                            &mut overlay,
                            &projected,
                            FillPattern::from_opacity(layer.style.fill_opacity),
                        );

                        if layer.style.opacity > 0.0 {
                            overlay.set_pen(layer.style.color.to_color());
                            for ring in rings {
                                self.draw_ring(&mut overlay, ring, &viewport, layer.style.weight >= 2.0);
                            }
                        }
                    }
                }
                (LayerKind::Vector { .. }, Shape::Lines(lines)) => {
                    overlay.set_pen(layer.style.color.to_color());
                    for line in lines {
                        self.draw_linestring(&mut overlay, line, &viewport, layer.style.weight >= 2.0);
                    }
                }
                (LayerKind::Vector { .. }, Shape::Circle { at, radius }) => {
                    let (px, py) = viewport.project_point(*at);
                    if viewport.is_visible(px, py) {
                        overlay.set_pen(layer.style.fill_color.to_color());
                        draw_circle(&mut overlay, px, py, (*radius as i32 / 4).max(1));
                    }
                }
                (LayerKind::Vector { .. }, Shape::Icon { at, icon, title }) => {
                    let (px, py) = viewport.project_point(*at);
                    if px < 0 || py < 0 {
                        continue;
                    }
                    let (cx, cy) = ((px / 2) as usize, (py / 4) as usize);
                    if cx >= width || cy >= height {
                        continue;
                    }
                    let color = layer.style.fill_color.to_color();
                    labels.push(Label {
                        x: cx as u16,
                        y: cy as u16,
                        text: icon.glyph().to_string(),
                        color,
                    });
                    if let Some(title) = title.as_ref().filter(|_| self.settings.show_labels) {
                        labels.push(Label {
                            x: cx as u16 + 2,
                            y: cy as u16,
                            text: title.clone(),
                            color: Color::White,
                        });
                    }
                }
            }
        }

        MapLayers {
            basemap,
            overlay,
            labels,
        }
    }

    /// Draw a linestring with viewport culling
    fn draw_linestring(&self, canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport, thick: bool) {
        if line.len() < 2 {
            return;
        }

        let mut prev: Option<(DVec2, (i32, i32))> = None;

        for p in line {
            let (px, py) = viewport.project_point(*p);

            if let Some((prev_p, (prev_x, prev_y))) = prev {
                // segments spanning more than half the globe are antimeridian wraps
                let clipped = clip_segment(
                    (prev_x, prev_y),
                    (px, py),
                    viewport.width as i32,
                    viewport.height as i32,
                );
                if let Some(((x0, y0), (x1, y1))) = clipped.filter(|_| (p.x - prev_p.x).abs() < 180.0) {
                    if thick {
                        draw_thick_line(canvas, x0, y0, x1, y1);
                    } else {
                        draw_line(canvas, x0, y0, x1, y1);
                    }
                }
            }

            prev = Some((*p, (px, py)));
        }
    }

    /// Draw a ring, closing it if the data left it open
    fn draw_ring(&self, canvas: &mut BrailleCanvas, ring: &[DVec2], viewport: &Viewport, thick: bool) {
        let mut closed: LineString = ring.to_vec();
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                closed.push(*first);
            }
        }
        self.draw_linestring(canvas, &closed, viewport, thick);
    }

    pub fn toggle_basemap(&mut self) {
        self.settings.show_basemap = !self.settings.show_basemap;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

fn ring_might_be_visible(rings: &[Vec<(i32, i32)>], viewport: &Viewport) -> bool {
    let Some(exterior) = rings.first() else {
        return false;
    };
    let (mut min, mut max) = ((i32::MAX, i32::MAX), (i32::MIN, i32::MIN));
    for &(x, y) in exterior {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    !exterior.is_empty() && viewport.line_might_be_visible(min, max)
}
