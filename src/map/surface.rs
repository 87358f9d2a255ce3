use crate::element::popup::PopupElement;
use crate::error::{MapError, Result};
use crate::map::geometry::point_in_rings;
use crate::map::projection::{Bounds, Viewport};
use crate::map::style::{Icon, PathStyle, Rgba};
use crate::map::LineString;
use geojson::{Geometry, Value};
use glam::DVec2;
use rayon::prelude::*;
use tracing::debug;

/// Handle to a layer owned by a [`MapSurface`]. Slots are reused after
/// `dispose`; the generation keeps stale handles from reaching the new
/// occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId {
    index: u32,
    generation: u32,
}

/// What a layer is, fixed when it is created.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerKind {
    /// Basemap. Never touched by bulk vector operations.
    Tile(TileInfo),
    /// Anything drawn from feature data. Only styleable vectors accept
    /// style changes; icon markers do not.
    Vector { styleable: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileInfo {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

/// Geometry of a layer in lon/lat.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// One entry per polygon, each a list of rings (exterior first)
    Polygons(Vec<Vec<Vec<DVec2>>>),
    Lines(Vec<LineString>),
    Icon {
        at: DVec2,
        icon: Icon,
        title: Option<String>,
    },
    Circle { at: DVec2, radius: u16 },
}

impl Shape {
    /// Convert a GeoJSON geometry. Points become icon markers; geometries
    /// without usable coordinates give `None`.
    pub fn from_geometry(geometry: &Geometry, icon: &Icon, title: Option<&str>) -> Option<Self> {
        match &geometry.value {
            Value::Point(c) => Some(Shape::Icon {
                at: position(c)?,
                icon: icon.clone(),
                title: title.map(str::to_string),
            }),
            Value::MultiPoint(points) => Some(Shape::Icon {
                at: points.iter().find_map(|c| position(c))?,
                icon: icon.clone(),
                title: title.map(str::to_string),
            }),
            Value::LineString(coords) => Some(Shape::Lines(vec![ring(coords)])),
            Value::MultiLineString(lines) => Some(Shape::Lines(lines.iter().map(|l| ring(l)).collect())),
            Value::Polygon(rings) => Some(Shape::Polygons(vec![rings.iter().map(|r| ring(r)).collect()])),
            Value::MultiPolygon(polygons) => Some(Shape::Polygons(
                polygons
                    .iter()
                    .map(|rings| rings.iter().map(|r| ring(r)).collect())
                    .collect(),
            )),
            Value::GeometryCollection(geometries) => geometries
                .iter()
                .find_map(|g| Shape::from_geometry(g, icon, title)),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Shape::Polygons(polygons) => {
                Bounds::from_points(polygons.iter().flatten().flatten())
            }
            Shape::Lines(lines) => Bounds::from_points(lines.iter().flatten()),
            Shape::Icon { at, .. } | Shape::Circle { at, .. } => Some(Bounds::from_point(*at)),
        }
    }

    /// Draw pane: tiles below paths below icon markers
    fn pane(&self) -> u8 {
        match self {
            Shape::Polygons(_) | Shape::Lines(_) | Shape::Circle { .. } => 1,
            Shape::Icon { .. } => 2,
        }
    }
}

fn position(c: &[f64]) -> Option<DVec2> {
    (c.len() >= 2).then(|| DVec2::new(c[0], c[1]))
}

fn ring(coords: &[Vec<f64>]) -> Vec<DVec2> {
    coords.iter().filter_map(|c| position(c)).collect()
}

/// One layer in the arena.
#[derive(Clone, Debug)]
pub struct MapLayer {
    pub kind: LayerKind,
    pub shape: Shape,
    pub style: PathStyle,
    pub interactive: bool,
    attached: bool,
    order: i64,
}

impl MapLayer {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_styleable(&self) -> bool {
        matches!(self.kind, LayerKind::Vector { styleable: true })
    }

    fn pane(&self) -> u8 {
        match self.kind {
            LayerKind::Tile(_) => 0,
            LayerKind::Vector { .. } => self.shape.pane(),
        }
    }

    /// Hit test against a click in braille pixels / lon-lat
    fn hit(&self, viewport: &Viewport, click_px: (i32, i32), click: DVec2) -> bool {
        match &self.shape {
            Shape::Icon { at, .. } => {
                let (px, py) = viewport.project_point(*at);
                // same character row, one cell of slack either side
                (px / 2 - click_px.0 / 2).abs() <= 1 && py / 4 == click_px.1 / 4
            }
            Shape::Circle { at, radius } => {
                let (px, py) = viewport.project_point(*at);
                let r = (*radius as i32 / 4).max(2);
                let (dx, dy) = (px - click_px.0, py - click_px.1);
                dx * dx + dy * dy <= r * r
            }
            Shape::Polygons(polygons) => polygons.iter().any(|rings| {
                rings
                    .first()
                    .and_then(|exterior| Bounds::from_points(exterior))
                    .is_some_and(|b| b.contains(click))
                    && point_in_rings(click, rings)
            }),
            Shape::Lines(_) => false,
        }
    }
}

struct Slot {
    generation: u32,
    layer: Option<MapLayer>,
}

impl Slot {
    fn live(&self, index: usize) -> Option<(LayerId, &MapLayer)> {
        let id = LayerId {
            index: index as u32,
            generation: self.generation,
        };
        self.layer.as_ref().map(|layer| (id, layer))
    }
}

/// Layer arena plus view state: the map engine the components draw on.
///
/// Layers are created detached. Detaching keeps a layer alive so it can be
/// attached again; `dispose` frees it for good.
pub struct MapSurface {
    layers: Vec<Slot>,
    free: Vec<u32>,
    next_order: i64,
    back_order: i64,
    pub viewport: Viewport,
    popup: Option<PopupElement>,
}

impl MapSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            layers: Vec::new(),
            free: Vec::new(),
            next_order: 0,
            back_order: 0,
            viewport,
            popup: None,
        }
    }

    /// Create a detached layer
    pub fn insert(&mut self, kind: LayerKind, shape: Shape, style: PathStyle) -> LayerId {
        let layer = MapLayer {
            kind,
            shape,
            style,
            interactive: true,
            attached: false,
            order: 0,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.layers[index as usize];
                slot.layer = Some(layer);
                LayerId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.layers.len() as u32;
                self.layers.push(Slot {
                    generation: 0,
                    layer: Some(layer),
                });
                LayerId { index, generation: 0 }
            }
        }
    }

    /// Number of slots in the arena, live or free
    pub fn capacity(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> Result<&MapLayer> {
        self.layers
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.layer.as_ref())
            .ok_or(MapError::UnknownLayer(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut MapLayer> {
        self.layers
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.layer.as_mut())
            .ok_or(MapError::UnknownLayer(id))
    }

    /// Add a layer to the map. Attaching an attached layer is a no-op.
    pub fn attach(&mut self, id: LayerId) -> Result<()> {
        let order = self.next_order;
        let layer = self.layer_mut(id)?;
        if !layer.attached {
            layer.attached = true;
            layer.order = order;
            self.next_order += 1;
        }
        Ok(())
    }

    pub fn detach(&mut self, id: LayerId) -> Result<()> {
        self.layer_mut(id)?.attached = false;
        Ok(())
    }

    /// Detach and free a layer. Unknown and stale ids are ignored.
    pub fn dispose(&mut self, id: LayerId) {
        let Some(slot) = self.layers.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation == id.generation && slot.layer.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    pub fn is_attached(&self, id: LayerId) -> bool {
        self.layer(id).is_ok_and(MapLayer::is_attached)
    }

    /// Replace a layer's fill colour. Returns `false` for layers that
    /// cannot be restyled.
    pub fn set_fill_color(&mut self, id: LayerId, color: Rgba) -> Result<bool> {
        let layer = self.layer_mut(id)?;
        if !layer.is_styleable() {
            return Ok(false);
        }
        layer.style.fill_color = color;
        Ok(true)
    }

    pub fn set_interactive(&mut self, id: LayerId, interactive: bool) -> Result<()> {
        self.layer_mut(id)?.interactive = interactive;
        Ok(())
    }

    /// Draw below every other layer in its pane
    pub fn bring_to_back(&mut self, id: LayerId) -> Result<()> {
        self.back_order -= 1;
        let order = self.back_order;
        self.layer_mut(id)?.order = order;
        Ok(())
    }

    /// Attached layers in draw order
    pub fn attached(&self) -> Vec<(LayerId, &MapLayer)> {
        let mut layers: Vec<_> = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.live(i))
            .filter(|(_, l)| l.attached)
            .collect();
        layers.sort_by_key(|(_, l)| (l.pane(), l.order));
        layers
    }

    /// Detach every vector layer, leaving tile layers alone. Returns the
    /// detached ids.
    pub fn detach_vectors(&mut self) -> Vec<LayerId> {
        let mut detached = Vec::new();
        for (i, slot) in self.layers.iter_mut().enumerate() {
            let generation = slot.generation;
            if let Some(layer) = &mut slot.layer {
                if layer.attached && matches!(layer.kind, LayerKind::Vector { .. }) {
                    layer.attached = false;
                    detached.push(LayerId {
                        index: i as u32,
                        generation,
                    });
                }
            }
        }
        debug!(count = detached.len(), "detached vector layers");
        detached
    }

    /// Topmost attached interactive vector layer under a braille pixel
    pub fn hit_test(&self, px: i32, py: i32) -> Option<LayerId> {
        let (lon, lat) = self.viewport.unproject(px, py);
        let click = DVec2::new(lon, lat);
        let viewport = &self.viewport;

        self.layers
            .par_iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let (id, layer) = slot.live(i)?;
                let candidate = layer.attached
                    && layer.interactive
                    && matches!(layer.kind, LayerKind::Vector { .. });
                (candidate && layer.hit(viewport, (px, py), click))
                    .then_some((id, (layer.pane(), layer.order)))
            })
            .max_by_key(|(_, rank)| *rank)
            .map(|(id, _)| id)
    }

    /// Union of the bounds of the given layers
    pub fn bounds_of(&self, ids: impl IntoIterator<Item = LayerId>) -> Option<Bounds> {
        ids.into_iter()
            .filter_map(|id| self.layer(id).ok()?.shape.bounds())
            .reduce(Bounds::union)
    }

    /// Fit the viewport to `bounds`, capped at a zoom level
    pub fn fit_bounds(&mut self, bounds: &Bounds, max_level: u8) {
        self.viewport.fit_bounds(bounds, Viewport::zoom_for_level(max_level));
    }

    pub fn open_popup(&mut self, popup: PopupElement) {
        self.popup = Some(popup);
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn popup(&self) -> Option<&PopupElement> {
        self.popup.as_ref()
    }

    pub fn popup_mut(&mut self) -> Option<&mut PopupElement> {
        self.popup.as_mut()
    }
}
