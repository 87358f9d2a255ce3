use crate::config::{Basemap, MapSettings, MAX_ZOOM_LEVEL};
use crate::element::popup::{PopupContent, PopupElement};
use crate::error::{MapError, Result};
use crate::events::{EventQueue, MapEvent};
use crate::layers::{ClickTarget, DatasetOptions, HandleRef, LayerCollection, LayerController, Properties};
use crate::map::style::{Icon, PathStyle, Rgba};
use crate::map::{LayerId, LayerKind, LineString, MapLayers, MapRenderer, MapSurface, Shape, TileInfo, Viewport};
use geojson::FeatureCollection;
use glam::DVec2;
use tracing::{debug, info};

/// Zoom cap used when fitting the view to a layer group
pub const DEFAULT_FIT_ZOOM: u8 = 14;

/// The map component: engine surface, layer groups, selection and the
/// events raised for the host.
pub struct MapElement {
    settings: MapSettings,
    surface: MapSurface,
    controller: LayerController,
    renderer: MapRenderer,
    events: EventQueue,
    /// Outline drawn by every tile layer
    outlines: Vec<LineString>,
    basemap: Option<(usize, LayerId)>,
    last_click: Option<DVec2>,
    loaded: bool,
}

impl MapElement {
    pub fn new(settings: MapSettings, outlines: Vec<LineString>) -> Self {
        Self {
            settings,
            surface: MapSurface::new(Viewport::world(0, 0)),
            controller: LayerController::new(),
            renderer: MapRenderer::new(),
            events: EventQueue::default(),
            outlines,
            basemap: None,
            last_click: None,
            loaded: false,
        }
    }

    /// Set the initial view, attach the first basemap and announce
    /// `MapLoaded`. Only the first call has any effect.
    pub fn connected(&mut self) {
        if self.loaded {
            return;
        }
        if let Some(first) = self.settings.basemaps.first().cloned() {
            self.install_basemap(0, &first);
        }
        let level = self.zoom_limit(self.settings.zoom);
        self.surface.viewport.set_view(self.settings.center, level);
        self.loaded = true;
        info!(
            lat = self.settings.center[0],
            lon = self.settings.center[1],
            zoom = level,
            "map loaded"
        );
        self.events.push(MapEvent::MapLoaded);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Size the surface to a widget of `width` x `height` cells
    pub fn resize(&mut self, width: u16, height: u16) {
        self.surface.viewport.width = width as usize * 2;
        self.surface.viewport.height = height as usize * 4;
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn controller(&self) -> &LayerController {
        &self.controller
    }

    pub fn viewport(&self) -> &Viewport {
        &self.surface.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.surface.viewport
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut MapRenderer {
        &mut self.renderer
    }

    pub fn render(&self, width: u16, height: u16) -> MapLayers {
        self.renderer
            .render(&self.surface, width as usize, height as usize)
    }

    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.events.drain()
    }

    pub fn add_dataset(&mut self, data: &FeatureCollection, options: &DatasetOptions) -> Result<LayerCollection> {
        self.controller.add_dataset(&mut self.surface, data, options)
    }

    pub fn show_layer_group(&mut self, id: &str) -> Result<()> {
        self.controller.show_layer_group(&mut self.surface, id)
    }

    pub fn hide_layer_group(&mut self, id: &str) -> Result<()> {
        self.controller.hide_layer_group(&mut self.surface, id)
    }

    pub fn remove_layer_group(&mut self, id: &str) -> Result<()> {
        self.controller.remove_layer_group(&mut self.surface, id)
    }

    pub fn clear_all_rendered_layers(&mut self) -> Result<()> {
        self.controller.clear_all_rendered_layers(&mut self.surface)
    }

    pub fn set_layer_colors_by_attribute_bucket(&mut self, key: &str, palette: &[Rgba]) -> Result<()> {
        self.controller
            .set_layer_colors_by_attribute_bucket(&mut self.surface, key, palette)
    }

    pub fn reset_all_colors(&mut self) -> Result<()> {
        self.controller.reset_all_colors(&mut self.surface)
    }

    /// Fit the view to every feature and marker of a group
    pub fn fit_map_bounds_to_layer(&mut self, id: &str, max_zoom: u8) -> Result<()> {
        let group = self.controller.registry().group(id)?;
        let bounds = self
            .surface
            .bounds_of(group.layer_ids())
            .ok_or(MapError::EmptyBounds)?;
        self.surface.fit_bounds(&bounds, self.zoom_limit(max_zoom));
        debug!(layer_id = id, level = self.surface.viewport.level(), "fitted to layer");
        Ok(())
    }

    /// Build a detached collection of the features `filter` accepts, all
    /// drawn with `style`. Overlays never take clicks.
    pub fn geojson_collection(
        &mut self,
        data: &FeatureCollection,
        style: PathStyle,
        filter: impl Fn(&Properties) -> bool,
    ) -> LayerCollection {
        let icon = Icon::default();
        let mut collection = LayerCollection::default();
        for feature in &data.features {
            let properties = feature
                .properties
                .as_ref()
                .map(Properties::from_json)
                .unwrap_or_default();
            if !filter(&properties) {
                continue;
            }
            let Some(shape) = feature
                .geometry
                .as_ref()
                .and_then(|g| Shape::from_geometry(g, &icon, None))
            else {
                continue;
            };
            let styleable = !matches!(shape, Shape::Icon { .. });
            let id = self.surface.insert(LayerKind::Vector { styleable }, shape, style);
            // fresh ids always exist
            let _ = self.surface.set_interactive(id, false);
            collection.layers.push(id);
        }
        collection
    }

    /// Attach an ad-hoc collection, fit the view to it and close any popup
    pub fn add_layer(&mut self, collection: LayerCollection) -> Result<LayerCollection> {
        for id in &collection.layers {
            self.surface.attach(*id)?;
        }
        if let Some(bounds) = self.surface.bounds_of(collection.layers.iter().copied()) {
            self.surface.fit_bounds(&bounds, self.zoom_limit(MAX_ZOOM_LEVEL));
        }
        self.surface.close_popup();
        debug!(layers = collection.layers.len(), "overlay added");
        Ok(collection)
    }

    /// Take an ad-hoc collection off the map for good
    pub fn remove_layer(&mut self, collection: &LayerCollection) {
        for id in &collection.layers {
            self.surface.dispose(*id);
        }
    }

    /// Replace the current tile layer
    pub fn switch_to_basemap(&mut self, basemap: &Basemap) {
        let index = self
            .settings
            .basemaps
            .iter()
            .position(|b| b == basemap)
            .unwrap_or(0);
        self.install_basemap(index, basemap);
    }

    /// Cycle to the next configured basemap
    pub fn next_basemap(&mut self) {
        let count = self.settings.basemaps.len();
        if count == 0 {
            return;
        }
        let next = self.basemap.map_or(0, |(i, _)| (i + 1) % count);
        let basemap = self.settings.basemaps[next].clone();
        self.install_basemap(next, &basemap);
    }

    fn install_basemap(&mut self, index: usize, basemap: &Basemap) {
        if let Some((_, old)) = self.basemap.take() {
            self.surface.dispose(old);
        }
        let tile = TileInfo {
            name: basemap.name.clone(),
            url: basemap.url.clone(),
            attribution: basemap.plain_attribution(),
        };
        let id = self.surface.insert(
            LayerKind::Tile(tile),
            Shape::Lines(self.outlines.clone()),
            PathStyle::default(),
        );
        // fresh ids always exist
        let _ = self.surface.attach(id);
        self.basemap = Some((index, id));
        info!(name = %basemap.name, "basemap switched");
    }

    /// Clamp a zoom level into the range of the active basemap
    fn zoom_limit(&self, level: u8) -> u8 {
        self.basemap
            .and_then(|(index, _)| self.settings.basemaps.get(index))
            .map_or(level.min(MAX_ZOOM_LEVEL), |basemap| basemap.clamp_zoom(level))
    }

    /// Name and attribution of the attached tile layer
    pub fn basemap(&self) -> Option<&TileInfo> {
        let (_, id) = self.basemap?;
        match &self.surface.layer(id).ok()?.kind {
            LayerKind::Tile(info) => Some(info),
            LayerKind::Vector { .. } => None,
        }
    }

    /// Route a click on a map cell to the topmost interactive layer.
    /// Returns whether a feature or marker took the click.
    pub fn handle_click(&mut self, col: u16, row: u16) -> Result<bool> {
        let (px, py) = (col as i32 * 2 + 1, row as i32 * 4 + 2);
        let Some(layer) = self.surface.hit_test(px, py) else {
            return Ok(false);
        };
        let Some(owner) = self.controller.registry().owner(layer).cloned() else {
            return Ok(false);
        };

        let anchor = match &owner {
            HandleRef::Marker { group, index } => self.controller.registry().marker(group, *index).map(|m| m.at),
            HandleRef::Feature(_) => None,
        };
        let (lon, lat) = self.surface.viewport.unproject(px, py);
        self.last_click = Some(anchor.unwrap_or(DVec2::new(lon, lat)));

        self.controller
            .select_feature(&mut self.surface, &mut self.events, ClickTarget::Handle(owner))?;
        Ok(true)
    }

    /// Drop a bare click-point at a coordinate
    pub fn click_point(&mut self, lon: f64, lat: f64) -> Result<()> {
        let at = DVec2::new(lon, lat);
        let properties: Properties = [("latitude", lat), ("longitude", lon)].into_iter().collect();
        self.last_click = Some(at);
        self.controller
            .select_feature(&mut self.surface, &mut self.events, ClickTarget::Point { at, properties })
    }

    /// Coordinate of the last click that reached a layer
    pub fn last_click(&self) -> Option<DVec2> {
        self.last_click
    }

    pub fn open_popup(&mut self, anchor: DVec2, content: PopupContent) {
        self.surface.open_popup(PopupElement::new(anchor, content));
    }

    pub fn close_popup(&mut self) {
        self.surface.close_popup();
    }

    pub fn popup(&self) -> Option<&PopupElement> {
        self.surface.popup()
    }

    pub fn focus_next_button(&mut self) {
        if let Some(popup) = self.surface.popup_mut() {
            popup.focus_next();
        }
    }

    /// Press a popup button, raising `MarkerButtonClick`. Returns `false`
    /// when there is no such button.
    pub fn press_popup_button(&mut self, index: usize) -> bool {
        let Some(button) = self.surface.popup().and_then(|p| p.button(index)).cloned() else {
            return false;
        };
        debug!(label = %button.label, "popup button pressed");
        self.events.push(MapEvent::MarkerButtonClick { button });
        true
    }

    pub fn press_focused_button(&mut self) -> bool {
        match self.surface.popup().map(PopupElement::focus_index) {
            Some(index) => self.press_popup_button(index),
            None => false,
        }
    }
}
