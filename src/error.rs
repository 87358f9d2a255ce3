use thiserror::Error;

use crate::map::LayerId;

/// Errors raised by the map components and the layer registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("unknown layer group {0:?}")]
    UnknownLayerGroup(String),

    #[error("unknown map layer {0:?}")]
    UnknownLayer(LayerId),

    #[error("no element is defined for tag {0:?}")]
    UnknownElement(String),

    #[error("tag {tag:?} is already defined as {existing}")]
    ElementConflict { tag: String, existing: &'static str },

    #[error("colour palette needs 6 entries, got {len}")]
    PaletteTooShort { len: usize },

    #[error("invalid colour {0:?}")]
    InvalidColor(String),

    #[error("nothing to fit: bounds are empty")]
    EmptyBounds,

    #[error("invalid GeoJSON: {0}")]
    Geojson(String),

    #[error("invalid map settings: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
