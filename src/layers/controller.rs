use crate::error::{MapError, Result};
use crate::events::{EventQueue, MapEvent};
use crate::layers::properties::Properties;
use crate::layers::registry::{
    DatasetOptions, FeatureHandle, FeatureRef, HandleRef, LayerCollection, LayerGroup, LayerRegistry,
    LayerType, MarkerHandle,
};
use crate::map::style::{PathStyle, Rgba, CLICK_POINT_RADIUS, EXPLICIT_OUTLINE, HIGHLIGHT_FILL};
use crate::map::{LayerId, LayerKind, MapSurface, Shape};
use geojson::FeatureCollection;
use glam::DVec2;
use tracing::{debug, info, warn};

/// Number of colour buckets used by attribute colouring
pub const BUCKET_COUNT: usize = 6;

/// Current highlight. Selecting anything first clears whatever was here.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
    #[default]
    Nothing,
    Polygon {
        feature: FeatureRef,
        /// The feature was attached only to be shown as selected
        remove_on_deselect: bool,
    },
    /// Circle marker dropped on a bare coordinate
    Point(LayerId),
}

/// What a click landed on.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickTarget {
    /// A registered feature or derived marker
    Handle(HandleRef),
    /// A coordinate with no feature behind it
    Point { at: DVec2, properties: Properties },
}

enum Next {
    Feature { feature: FeatureRef, remove_on_deselect: bool },
    Point(DVec2),
}

/// Lon/lat of the marker derived from `latitude`/`longitude` properties,
/// if both are present and on the globe
fn marker_position(properties: &Properties) -> Option<DVec2> {
    let lat = properties.number("latitude").filter(|v| (-90.0..=90.0).contains(v))?;
    let lon = properties.number("longitude").filter(|v| (-180.0..=180.0).contains(v))?;
    Some(DVec2::new(lon, lat))
}

/// Bucket for attribute colouring. Later ranges win where they overlap.
pub fn bucket_index(value: Option<f64>) -> usize {
    let Some(v) = value else {
        return 0;
    };
    let mut index = 0;
    if v > 5.0 && v <= 10.0 {
        index = 1;
    }
    if v > 10.0 && v <= 20.0 {
        index = 2;
    }
    if v > 20.0 && v <= 35.0 {
        index = 3;
    }
    if v > 25.0 && v <= 50.0 {
        index = 4;
    }
    if v > 50.0 {
        index = 5;
    }
    index
}

/// Layer groups on a map surface plus the single active selection.
///
/// The controller never owns rendering resources: it keeps [`LayerId`]s into
/// the [`MapSurface`] passed to each call and asks the surface to attach,
/// detach or restyle them.
#[derive(Default)]
pub struct LayerController {
    registry: LayerRegistry,
    selection: Selection,
}

impl LayerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_feature(&self) -> Option<&FeatureHandle> {
        match &self.selection {
            Selection::Polygon { feature, .. } => self.registry.feature(feature),
            _ => None,
        }
    }

    /// Add every feature of `data` as the group `options.layer_id`,
    /// replacing any group already stored under that id.
    pub fn add_dataset(
        &mut self,
        surface: &mut MapSurface,
        data: &FeatureCollection,
        options: &DatasetOptions,
    ) -> Result<LayerCollection> {
        if self.registry.contains(&options.layer_id) {
            self.release_group(surface, &options.layer_id)?;
        }

        let base = options.style();
        let mut group = LayerGroup {
            add_to_map: options.add_to_map,
            ..LayerGroup::default()
        };
        let mut collection = LayerCollection::default();

        for feature in &data.features {
            let properties = feature
                .properties
                .as_ref()
                .map(Properties::from_json)
                .unwrap_or_default();
            let Some(shape) = feature
                .geometry
                .as_ref()
                .and_then(|g| Shape::from_geometry(g, &options.icon, properties.text("title")))
            else {
                debug!(layer_id = %options.layer_id, "skipping feature without usable geometry");
                continue;
            };

            let styleable = !matches!(shape, Shape::Icon { .. });
            let override_color = properties.text("color").and_then(|c| match Rgba::parse(c) {
                Ok(color) => Some(color),
                Err(err) => {
                    warn!(%err, layer_id = %options.layer_id, "ignoring feature colour");
                    None
                }
            });
            let mut style = base;
            if let Some(color) = override_color {
                style.fill_color = color;
                style.color = EXPLICIT_OUTLINE;
            }

            let layer = surface.insert(LayerKind::Vector { styleable }, shape, style);
            if options.add_to_map && !options.default_hidden {
                surface.attach(layer)?;
            }
            if properties.is_truthy("unselectable") {
                surface.set_interactive(layer, false)?;
                surface.bring_to_back(layer)?;
            }
            collection.layers.push(layer);

            // latitude/longitude properties are lat-first, unlike GeoJSON positions
            if options.layer_type != LayerType::Locations {
                if let Some(at) = marker_position(&properties) {
                    let marker = surface.insert(
                        LayerKind::Vector { styleable: false },
                        Shape::Icon {
                            at,
                            icon: options.icon.clone(),
                            title: properties.text("title").map(str::to_string),
                        },
                        style,
                    );
                    if !options.default_hidden {
                        surface.attach(marker)?;
                    }
                    group.markers.push(MarkerHandle {
                        layer: marker,
                        feature: group.features.len(),
                        properties: properties.clone(),
                        at,
                    });
                    collection.layers.push(marker);
                }
            }

            group.features.push(FeatureHandle {
                layer,
                properties,
                layer_type: options.layer_type,
                override_color,
                default_fill: base.fill_color,
            });
        }

        info!(
            layer_id = %options.layer_id,
            features = group.features.len(),
            markers = group.markers.len(),
            "dataset added"
        );
        self.registry.insert(options.layer_id.clone(), group);
        Ok(collection)
    }

    /// Attach every marker of a group, and its features if the group is
    /// shown on the map
    pub fn show_layer_group(&mut self, surface: &mut MapSurface, id: &str) -> Result<()> {
        let group = self.registry.group(id)?;
        for marker in &group.markers {
            surface.attach(marker.layer)?;
        }
        if group.add_to_map {
            for feature in &group.features {
                surface.attach(feature.layer)?;
            }
        }
        debug!(layer_id = id, "layer group shown");
        Ok(())
    }

    /// Detach every feature and marker of a group and drop the selection
    pub fn hide_layer_group(&mut self, surface: &mut MapSurface, id: &str) -> Result<()> {
        self.registry.group(id)?;
        self.deselect(surface)?;
        let group = self.registry.group(id)?;
        for layer in group.layer_ids() {
            surface.detach(layer)?;
        }
        debug!(layer_id = id, "layer group hidden");
        Ok(())
    }

    /// Detach and forget one group
    pub fn remove_layer_group(&mut self, surface: &mut MapSurface, id: &str) -> Result<()> {
        self.registry.group(id)?;
        self.release_group(surface, id)?;
        debug!(layer_id = id, "layer group removed");
        Ok(())
    }

    fn release_group(&mut self, surface: &mut MapSurface, id: &str) -> Result<()> {
        if matches!(&self.selection, Selection::Polygon { feature, .. } if feature.group == id) {
            self.deselect(surface)?;
        }
        let group = self.registry.remove(id)?;
        for layer in group.layer_ids() {
            surface.dispose(layer);
        }
        Ok(())
    }

    /// Detach every vector layer (groups, overlays, click-point). Groups stay
    /// registered and can be shown again.
    pub fn clear_all_rendered_layers(&mut self, surface: &mut MapSurface) -> Result<()> {
        self.deselect(surface)?;
        surface.detach_vectors();
        Ok(())
    }

    /// Handle a click: notify, deselect the previous highlight, highlight
    /// the new target. Clicks on `unselectable` features are ignored.
    pub fn select_feature(
        &mut self,
        surface: &mut MapSurface,
        events: &mut EventQueue,
        target: ClickTarget,
    ) -> Result<()> {
        let (properties, next) = self.resolve(target)?;
        if properties.is_truthy("unselectable") {
            debug!("ignoring click on unselectable feature");
            return Ok(());
        }

        events.push(MapEvent::MarkerClicked { properties });
        self.deselect(surface)?;

        match next {
            Next::Point(at) => {
                let id = surface.insert(
                    LayerKind::Vector { styleable: true },
                    Shape::Circle {
                        at,
                        radius: CLICK_POINT_RADIUS,
                    },
                    PathStyle::click_point(),
                );
                surface.set_interactive(id, false)?;
                surface.attach(id)?;
                self.selection = Selection::Point(id);
                debug!(lon = at.x, lat = at.y, "click-point placed");
            }
            Next::Feature {
                feature,
                remove_on_deselect,
            } => {
                let layer = self
                    .registry
                    .feature(&feature)
                    .map(|f| f.layer)
                    .ok_or_else(|| MapError::UnknownLayerGroup(feature.group.clone()))?;
                surface.attach(layer)?;
                surface.set_fill_color(layer, HIGHLIGHT_FILL)?;
                debug!(layer_id = %feature.group, index = feature.index, "feature selected");
                self.selection = Selection::Polygon {
                    feature,
                    remove_on_deselect,
                };
            }
        }
        Ok(())
    }

    /// Properties to announce and the selection a click leads to
    fn resolve(&self, target: ClickTarget) -> Result<(Properties, Next)> {
        match target {
            ClickTarget::Point { at, properties } => Ok((properties, Next::Point(at))),
            ClickTarget::Handle(HandleRef::Feature(feature)) => {
                let group = self.registry.group(&feature.group)?;
                let handle = group
                    .features
                    .get(feature.index)
                    .ok_or_else(|| MapError::UnknownLayerGroup(feature.group.clone()))?;
                let remove_on_deselect = !group.add_to_map;
                Ok((
                    handle.properties.clone(),
                    Next::Feature {
                        feature,
                        remove_on_deselect,
                    },
                ))
            }
            ClickTarget::Handle(HandleRef::Marker { group: id, index }) => {
                let group = self.registry.group(&id)?;
                let marker = group
                    .markers
                    .get(index)
                    .ok_or_else(|| MapError::UnknownLayerGroup(id.clone()))?;
                let origin = group
                    .features
                    .get(marker.feature)
                    .ok_or_else(|| MapError::UnknownLayerGroup(id.clone()))?;
                Ok((
                    origin.properties.merged(&marker.properties),
                    Next::Feature {
                        feature: FeatureRef {
                            group: id.clone(),
                            index: marker.feature,
                        },
                        remove_on_deselect: !group.add_to_map,
                    },
                ))
            }
        }
    }

    /// Clear the highlight and the click-point. Location features are only
    /// forgotten; other features are detached if they were attached only
    /// for the selection, and get their fill colour back.
    pub fn deselect(&mut self, surface: &mut MapSurface) -> Result<()> {
        match std::mem::take(&mut self.selection) {
            Selection::Nothing => {}
            Selection::Point(id) => surface.dispose(id),
            Selection::Polygon {
                feature,
                remove_on_deselect,
            } => {
                let Some(handle) = self.registry.feature(&feature) else {
                    return Ok(());
                };
                if handle.is_location() {
                    return Ok(());
                }
                if remove_on_deselect {
                    surface.detach(handle.layer)?;
                }
                surface.set_fill_color(handle.layer, handle.restore_color())?;
            }
        }
        Ok(())
    }

    /// Colour every feature by the bucket of its numeric attribute `key`
    pub fn set_layer_colors_by_attribute_bucket(
        &mut self,
        surface: &mut MapSurface,
        key: &str,
        palette: &[Rgba],
    ) -> Result<()> {
        if palette.len() < BUCKET_COUNT {
            return Err(MapError::PaletteTooShort { len: palette.len() });
        }
        for feature in self.registry.features() {
            let index = bucket_index(feature.properties.number(key));
            surface.set_fill_color(feature.layer, palette[index])?;
        }
        debug!(key, "features coloured by bucket");
        Ok(())
    }

    /// Put every feature's own or default fill back
    pub fn reset_all_colors(&mut self, surface: &mut MapSurface) -> Result<()> {
        for feature in self.registry.features() {
            surface.set_fill_color(feature.layer, feature.restore_color())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_feature_collection;
    use crate::map::style::DEFAULT_FILL;
    use crate::map::Viewport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn square(lon: f64, lat: f64) -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[lon, lat], [lon + 0.1, lat], [lon + 0.1, lat + 0.1], [lon, lat + 0.1], [lon, lat]]]
        })
    }

    fn collection(features: Vec<serde_json::Value>) -> FeatureCollection {
        let fc = json!({ "type": "FeatureCollection", "features": features });
        parse_feature_collection(fc.to_string().as_bytes()).unwrap()
    }

    fn polygon(lon: f64, props: serde_json::Value) -> serde_json::Value {
        json!({ "type": "Feature", "geometry": square(lon, 52.0), "properties": props })
    }

    fn setup() -> (MapSurface, EventQueue, LayerController) {
        let mut viewport = Viewport::world(200, 120);
        viewport.set_view([52.0, 5.0], 8);
        (MapSurface::new(viewport), EventQueue::default(), LayerController::new())
    }

    fn feature(group: &str, index: usize) -> ClickTarget {
        ClickTarget::Handle(HandleRef::Feature(FeatureRef {
            group: group.to_string(),
            index,
        }))
    }

    fn fill(surface: &MapSurface, controller: &LayerController, group: &str, index: usize) -> Rgba {
        let layer = controller.registry().group(group).unwrap().features[index].layer;
        surface.layer(layer).unwrap().style.fill_color
    }

    fn highlighted(surface: &MapSurface, controller: &LayerController) -> usize {
        controller
            .registry()
            .features()
            .filter(|f| surface.layer(f.layer).unwrap().style.fill_color == HIGHLIGHT_FILL)
            .filter(|f| surface.is_attached(f.layer))
            .count()
    }

    #[test]
    fn group_holds_one_handle_per_feature() {
        let (mut surface, _, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"wk_code": "A"})),
            polygon(5.2, json!({"wk_code": "B"})),
            polygon(5.4, json!({"wk_code": "C"})),
        ]);
        let added = controller
            .add_dataset(&mut surface, &data, &DatasetOptions::new("top25"))
            .unwrap();

        assert_eq!(controller.registry().group("top25").unwrap().len(), 3);
        assert_eq!(added.layers.len(), 3);
        assert!(added.layers.iter().all(|id| surface.is_attached(*id)));
    }

    #[test]
    fn only_one_highlight_at_a_time() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![polygon(5.0, json!({})), polygon(5.2, json!({}))]);
        controller
            .add_dataset(&mut surface, &data, &DatasetOptions::new("g"))
            .unwrap();

        controller.select_feature(&mut surface, &mut events, feature("g", 0)).unwrap();
        assert_eq!(highlighted(&surface, &controller), 1);
        controller.select_feature(&mut surface, &mut events, feature("g", 1)).unwrap();
        assert_eq!(highlighted(&surface, &controller), 1);
        assert_eq!(fill(&surface, &controller, "g", 1), HIGHLIGHT_FILL);
        assert_eq!(fill(&surface, &controller, "g", 0), DEFAULT_FILL);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn deselect_restores_own_or_default_colour() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"color": "#ff0000"})),
            polygon(5.2, json!({})),
        ]);
        let options = DatasetOptions::new("g").fill_color(Rgba::rgb(1, 2, 3));
        controller.add_dataset(&mut surface, &data, &options).unwrap();

        let own = controller.registry().group("g").unwrap().features[0].layer;
        assert_eq!(surface.layer(own).unwrap().style.color, EXPLICIT_OUTLINE);

        controller.select_feature(&mut surface, &mut events, feature("g", 0)).unwrap();
        controller.select_feature(&mut surface, &mut events, feature("g", 1)).unwrap();
        assert_eq!(fill(&surface, &controller, "g", 0), Rgba::rgb(255, 0, 0));

        controller.deselect(&mut surface).unwrap();
        assert_eq!(fill(&surface, &controller, "g", 1), Rgba::rgb(1, 2, 3));
        assert_eq!(controller.selection(), &Selection::Nothing);
    }

    #[test]
    fn override_colour_survives_highlight() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![polygon(5.0, json!({"color": "#00ff00"}))]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();

        controller.select_feature(&mut surface, &mut events, feature("g", 0)).unwrap();
        controller.select_feature(&mut surface, &mut events, feature("g", 0)).unwrap();
        let handle = &controller.registry().group("g").unwrap().features[0];
        assert_eq!(handle.override_color, Some(Rgba::rgb(0, 255, 0)));

        controller.deselect(&mut surface).unwrap();
        assert_eq!(fill(&surface, &controller, "g", 0), Rgba::rgb(0, 255, 0));
    }

    #[test]
    fn unselectable_clicks_change_nothing() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({})),
            polygon(5.2, json!({"unselectable": true})),
        ]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();
        controller.select_feature(&mut surface, &mut events, feature("g", 0)).unwrap();
        events.drain();
        let before = controller.selection().clone();

        controller.select_feature(&mut surface, &mut events, feature("g", 1)).unwrap();
        assert_eq!(controller.selection(), &before);
        assert!(events.is_empty());
        assert_eq!(fill(&surface, &controller, "g", 0), HIGHLIGHT_FILL);

        let layer = controller.registry().group("g").unwrap().features[1].layer;
        assert!(!surface.layer(layer).unwrap().interactive);
    }

    #[test]
    fn hide_then_show_restores_the_same_layers() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"latitude": "52.05", "longitude": "5.05"})),
            polygon(5.2, json!({})),
        ]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();
        let attached = |s: &MapSurface| -> BTreeSet<LayerId> { s.attached().into_iter().map(|(id, _)| id).collect() };
        let before = attached(&surface);
        assert_eq!(before.len(), 3);

        controller
            .select_feature(
                &mut surface,
                &mut events,
                ClickTarget::Point { at: DVec2::new(6.0, 52.0), properties: Properties::new() },
            )
            .unwrap();
        assert!(matches!(controller.selection(), Selection::Point(_)));

        controller.hide_layer_group(&mut surface, "g").unwrap();
        assert!(attached(&surface).is_empty());
        assert_eq!(controller.selection(), &Selection::Nothing);

        controller.show_layer_group(&mut surface, "g").unwrap();
        assert_eq!(attached(&surface), before);
    }

    #[test]
    fn derived_markers_use_reversed_coordinates() {
        let (mut surface, _, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"latitude": 52.05, "longitude": 5.05, "title": "Wijk"})),
            polygon(5.2, json!({"latitude": "not a number", "longitude": 5.25})),
            polygon(5.4, json!({"latitude": "NaN", "longitude": "inf"})),
            polygon(5.6, json!({"latitude": 91.0, "longitude": 5.65})),
            polygon(5.8, json!({"latitude": 52.05, "longitude": -200.0})),
        ]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();

        let group = controller.registry().group("g").unwrap();
        assert_eq!(group.features.len(), 5);
        assert_eq!(group.markers.len(), 1);
        assert_eq!(group.markers[0].at, DVec2::new(5.05, 52.05));
        assert_eq!(group.markers[0].feature, 0);
    }

    #[test]
    fn marker_click_selects_origin_feature() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![polygon(5.0, json!({"latitude": 52.05, "longitude": 5.05, "wk_code": "A"}))]);
        let options = DatasetOptions::new("g").add_to_map(false);
        controller.add_dataset(&mut surface, &data, &options).unwrap();

        let group = controller.registry().group("g").unwrap();
        let (polygon_layer, marker_layer) = (group.features[0].layer, group.markers[0].layer);
        assert!(!surface.is_attached(polygon_layer));
        assert!(surface.is_attached(marker_layer));

        let target = ClickTarget::Handle(controller.registry().owner(marker_layer).unwrap().clone());
        controller.select_feature(&mut surface, &mut events, target).unwrap();
        assert!(surface.is_attached(polygon_layer));
        assert_eq!(fill(&surface, &controller, "g", 0), HIGHLIGHT_FILL);
        match events.pop() {
            Some(MapEvent::MarkerClicked { properties }) => assert_eq!(properties.text("wk_code"), Some("A")),
            other => panic!("unexpected event {other:?}"),
        }

        controller.deselect(&mut surface).unwrap();
        assert!(!surface.is_attached(polygon_layer));
    }

    #[test]
    fn location_selection_is_only_forgotten() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [5.0, 52.0]},
            "properties": {"wk_code": "A"}
        })]);
        controller
            .add_dataset(&mut surface, &data, &DatasetOptions::new("loc").locations())
            .unwrap();
        controller.select_feature(&mut surface, &mut events, feature("loc", 0)).unwrap();

        let layer = controller.registry().group("loc").unwrap().features[0].layer;
        controller.deselect(&mut surface).unwrap();
        assert!(surface.is_attached(layer));
        assert_eq!(surface.layer(layer).unwrap().style.fill_color, DEFAULT_FILL);
    }

    #[test]
    fn point_click_replaces_previous_point() {
        let (mut surface, mut events, mut controller) = setup();
        let point = |lon| ClickTarget::Point { at: DVec2::new(lon, 52.0), properties: Properties::new() };

        controller.select_feature(&mut surface, &mut events, point(5.0)).unwrap();
        let Selection::Point(first) = controller.selection().clone() else { panic!("no point") };
        controller.select_feature(&mut surface, &mut events, point(5.1)).unwrap();

        assert!(surface.layer(first).is_err());
        assert_eq!(surface.attached().len(), 1);
    }

    #[test]
    fn unknown_groups_are_reported() {
        let (mut surface, _, mut controller) = setup();
        let err = controller.show_layer_group(&mut surface, "nope").unwrap_err();
        assert_eq!(err, MapError::UnknownLayerGroup("nope".to_string()));
        assert!(controller.hide_layer_group(&mut surface, "nope").is_err());
        assert!(controller.remove_layer_group(&mut surface, "nope").is_err());
    }

    #[test]
    fn removing_a_group_disposes_and_forgets_it() {
        let (mut surface, mut events, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"latitude": 52.05, "longitude": 5.05})),
            polygon(5.2, json!({})),
        ]);
        let added = controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();
        let other = collection(vec![polygon(5.4, json!({}))]);
        controller.add_dataset(&mut surface, &other, &DatasetOptions::new("h")).unwrap();

        controller.select_feature(&mut surface, &mut events, feature("g", 1)).unwrap();
        controller.remove_layer_group(&mut surface, "g").unwrap();

        assert!(!controller.registry().contains("g"));
        assert_eq!(added.layers.len(), 3);
        for id in &added.layers {
            assert!(surface.layer(*id).is_err());
            assert!(controller.registry().owner(*id).is_none());
        }
        assert_eq!(controller.selection(), &Selection::Nothing);
        assert_eq!(surface.attached().len(), 1);

        // a click-point is not part of any group and outlives the removal
        controller
            .select_feature(
                &mut surface,
                &mut events,
                ClickTarget::Point { at: DVec2::new(6.0, 52.0), properties: Properties::new() },
            )
            .unwrap();
        let point = controller.selection().clone();
        controller.remove_layer_group(&mut surface, "h").unwrap();
        assert_eq!(controller.selection(), &point);
        let Selection::Point(id) = point else { panic!("no point") };
        assert!(surface.is_attached(id));
    }

    #[test]
    fn re_adding_replaces_the_group() {
        let (mut surface, _, mut controller) = setup();
        let first = collection(vec![polygon(5.0, json!({})), polygon(5.2, json!({}))]);
        let second = collection(vec![polygon(5.4, json!({}))]);
        let old = controller.add_dataset(&mut surface, &first, &DatasetOptions::new("g")).unwrap();
        controller.add_dataset(&mut surface, &second, &DatasetOptions::new("g")).unwrap();

        assert_eq!(controller.registry().group("g").unwrap().len(), 1);
        assert!(old.layers.iter().all(|id| surface.layer(*id).is_err()));
        assert_eq!(surface.attached().len(), 1);
    }

    #[test]
    fn bucket_thresholds() {
        assert_eq!(bucket_index(Some(5.0)), 0);
        assert_eq!(bucket_index(Some(7.0)), 1);
        assert_eq!(bucket_index(Some(10.0)), 1);
        assert_eq!(bucket_index(Some(20.0)), 2);
        assert_eq!(bucket_index(Some(22.0)), 3);
        // 25..35 falls in both ranges; the later one wins
        assert_eq!(bucket_index(Some(30.0)), 4);
        assert_eq!(bucket_index(Some(50.0)), 4);
        assert_eq!(bucket_index(Some(51.0)), 5);
        assert_eq!(bucket_index(Some(-3.0)), 0);
        assert_eq!(bucket_index(None), 0);
    }

    #[test]
    fn bucket_colouring_and_reset() {
        let (mut surface, _, mut controller) = setup();
        let data = collection(vec![
            polygon(5.0, json!({"Percentage": 7})),
            polygon(5.2, json!({"Percentage": "51", "color": "#123456"})),
        ]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();
        let palette: Vec<Rgba> = (0..6).map(|i| Rgba::rgb(i * 10, 0, 0)).collect();

        controller
            .set_layer_colors_by_attribute_bucket(&mut surface, "Percentage", &palette)
            .unwrap();
        assert_eq!(fill(&surface, &controller, "g", 0), palette[1]);
        assert_eq!(fill(&surface, &controller, "g", 1), palette[5]);

        controller.reset_all_colors(&mut surface).unwrap();
        assert_eq!(fill(&surface, &controller, "g", 0), DEFAULT_FILL);
        assert_eq!(fill(&surface, &controller, "g", 1), Rgba::rgb(0x12, 0x34, 0x56));

        let err = controller
            .set_layer_colors_by_attribute_bucket(&mut surface, "Percentage", &palette[..3])
            .unwrap_err();
        assert_eq!(err, MapError::PaletteTooShort { len: 3 });
    }

    #[test]
    fn clear_detaches_but_keeps_groups() {
        let (mut surface, _, mut controller) = setup();
        let data = collection(vec![polygon(5.0, json!({}))]);
        controller.add_dataset(&mut surface, &data, &DatasetOptions::new("g")).unwrap();

        controller.clear_all_rendered_layers(&mut surface).unwrap();
        assert!(surface.attached().is_empty());
        assert!(controller.registry().contains("g"));

        controller.show_layer_group(&mut surface, "g").unwrap();
        assert_eq!(surface.attached().len(), 1);
    }

    #[test]
    fn default_hidden_groups_start_detached() {
        let (mut surface, _, mut controller) = setup();
        let data = collection(vec![polygon(5.0, json!({"latitude": 52.0, "longitude": 5.0}))]);
        let options = DatasetOptions::new("g").default_hidden(true);
        controller.add_dataset(&mut surface, &data, &options).unwrap();
        assert!(surface.attached().is_empty());

        controller.show_layer_group(&mut surface, "g").unwrap();
        assert_eq!(surface.attached().len(), 2);
    }
}
