//! Layer groups and the selection state of a map element.

mod controller;
mod properties;
mod registry;

pub use controller::{bucket_index, ClickTarget, LayerController, Selection, BUCKET_COUNT};
pub use properties::{Properties, PropertyValue};
pub use registry::{
    DatasetOptions, FeatureHandle, FeatureRef, HandleRef, LayerCollection, LayerGroup, LayerRegistry,
    LayerType, MarkerHandle,
};
