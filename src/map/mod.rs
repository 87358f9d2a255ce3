mod geometry;
mod projection;
mod renderer;
pub mod style;
mod surface;

use glam::DVec2;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<DVec2>;

pub use geometry::{point_in_rings, FillPattern};
pub use projection::{inverse_mercator, mercator, Bounds, Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{DisplaySettings, Label, MapLayers, MapRenderer};
pub use surface::{LayerId, LayerKind, MapLayer, MapSurface, Shape, TileInfo};
