use crate::error::{MapError, Result};
use crate::layers::properties::Properties;
use crate::map::style::{Icon, PathStyle, Rgba, DEFAULT_FILL};
use crate::map::LayerId;
use glam::DVec2;
use std::collections::{BTreeMap, HashMap};

/// How the features of a dataset are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerType {
    /// Icon markers
    Locations,
    /// Filled polygons
    #[default]
    Polygons,
}

/// Options for adding a dataset to the map.
#[derive(Clone, Debug)]
pub struct DatasetOptions {
    pub layer_type: LayerType,
    pub layer_id: String,
    pub fill_color: Option<Rgba>,
    pub color: Option<Rgba>,
    pub icon: Icon,
    /// Render but do not attach
    pub default_hidden: bool,
    /// When false, features only appear while selected
    pub add_to_map: bool,
}

impl DatasetOptions {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_type: LayerType::default(),
            layer_id: layer_id.into(),
            fill_color: None,
            color: None,
            icon: Icon::default(),
            default_hidden: false,
            add_to_map: true,
        }
    }

    pub fn locations(mut self) -> Self {
        self.layer_type = LayerType::Locations;
        self
    }

    pub fn fill_color(mut self, color: Rgba) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = icon;
        self
    }

    pub fn default_hidden(mut self, hidden: bool) -> Self {
        self.default_hidden = hidden;
        self
    }

    pub fn add_to_map(mut self, add: bool) -> Self {
        self.add_to_map = add;
        self
    }

    /// Base style of every feature in the dataset
    pub fn style(&self) -> PathStyle {
        PathStyle {
            fill_color: self.fill_color.unwrap_or(DEFAULT_FILL),
            color: self.color.unwrap_or(DEFAULT_FILL),
            ..PathStyle::default()
        }
    }
}

/// A rendered feature, referenced by id in the map surface.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureHandle {
    pub layer: LayerId,
    pub properties: Properties,
    pub layer_type: LayerType,
    /// Fill from the feature's own `color`; what deselect restores
    pub override_color: Option<Rgba>,
    /// Fill of the dataset style, restored when there is no override
    pub default_fill: Rgba,
}

impl FeatureHandle {
    pub fn restore_color(&self) -> Rgba {
        self.override_color.unwrap_or(self.default_fill)
    }

    /// Icon features are never restyled or detached on deselect
    pub fn is_location(&self) -> bool {
        self.layer_type == LayerType::Locations
            || self.properties.text("layerType") == Some("locations")
    }
}

/// A point marker derived from a feature's `latitude`/`longitude`.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerHandle {
    pub layer: LayerId,
    /// Index of the originating feature in the same group
    pub feature: usize,
    pub properties: Properties,
    /// lon/lat
    pub at: DVec2,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerGroup {
    pub features: Vec<FeatureHandle>,
    pub markers: Vec<MarkerHandle>,
    pub add_to_map: bool,
}

impl LayerGroup {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Surface ids of every feature and marker
    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.features
            .iter()
            .map(|f| f.layer)
            .chain(self.markers.iter().map(|m| m.layer))
    }
}

/// Position of a feature in the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    pub group: String,
    pub index: usize,
}

/// What owns a surface layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleRef {
    Feature(FeatureRef),
    Marker { group: String, index: usize },
}

/// Layers created by one collection, for removing them later.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerCollection {
    pub layers: Vec<LayerId>,
}

/// Layer groups keyed by id, with a reverse index from surface layer ids.
#[derive(Default)]
pub struct LayerRegistry {
    groups: BTreeMap<String, LayerGroup>,
    owners: HashMap<LayerId, HandleRef>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a group, returning the one it replaces
    pub fn insert(&mut self, id: impl Into<String>, group: LayerGroup) -> Option<LayerGroup> {
        let id = id.into();
        let previous = self.remove_entry(&id);

        for (index, feature) in group.features.iter().enumerate() {
            self.owners.insert(
                feature.layer,
                HandleRef::Feature(FeatureRef { group: id.clone(), index }),
            );
        }
        for (index, marker) in group.markers.iter().enumerate() {
            self.owners
                .insert(marker.layer, HandleRef::Marker { group: id.clone(), index });
        }
        self.groups.insert(id, group);
        previous
    }

    pub fn remove(&mut self, id: &str) -> Result<LayerGroup> {
        self.remove_entry(id)
            .ok_or_else(|| MapError::UnknownLayerGroup(id.to_string()))
    }

    fn remove_entry(&mut self, id: &str) -> Option<LayerGroup> {
        let group = self.groups.remove(id)?;
        for layer in group.layer_ids() {
            self.owners.remove(&layer);
        }
        Some(group)
    }

    pub fn group(&self, id: &str) -> Result<&LayerGroup> {
        self.groups
            .get(id)
            .ok_or_else(|| MapError::UnknownLayerGroup(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    pub fn feature(&self, feature: &FeatureRef) -> Option<&FeatureHandle> {
        self.groups.get(&feature.group)?.features.get(feature.index)
    }

    pub fn marker(&self, group: &str, index: usize) -> Option<&MarkerHandle> {
        self.groups.get(group)?.markers.get(index)
    }

    /// Which feature or marker a surface layer belongs to
    pub fn owner(&self, layer: LayerId) -> Option<&HandleRef> {
        self.owners.get(&layer)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &LayerGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every feature of every group
    pub fn features(&self) -> impl Iterator<Item = &FeatureHandle> {
        self.groups.values().flat_map(|g| g.features.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
