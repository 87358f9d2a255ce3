use tracing::{debug, warn};
use tui_layermap::config::MapSettings;
use tui_layermap::demo::{Demo, DemoKind, PROVINCES};
use tui_layermap::element::{MapElement, DEFAULT_FIT_ZOOM};
use tui_layermap::events::MapEvent;
use tui_layermap::map::LineString;

/// Application state
pub struct App {
    pub map: MapElement,
    pub demo: Box<dyn Demo>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current press has moved; a press without movement is a click
    dragged: bool,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Index into `PROVINCES` of the active filter
    pub province: Option<usize>,
    pub layer_hidden: bool,
    /// Last error or notice for the status bar
    pub status: Option<String>,
}

impl App {
    pub fn new(kind: DemoKind, settings: Option<MapSettings>, outlines: Vec<LineString>, width: u16, height: u16) -> Self {
        let demo = kind.create();
        let settings = settings.unwrap_or_else(|| demo.settings());
        let mut app = Self {
            map: MapElement::new(settings, outlines),
            demo,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            province: None,
            layer_hidden: false,
            status: None,
        };
        app.resize(width, height);
        app.map.connected();
        app.process_events();
        app
    }

    /// Update the map size when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        // 2 for border, 1 for status bar
        self.map.resize(width.saturating_sub(2), height.saturating_sub(3));
    }

    /// Handle everything the map raised since the last call
    pub fn process_events(&mut self) {
        loop {
            let events = self.map.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                debug!(event = event.name(), "handling map event");
                let result = match event {
                    MapEvent::MapLoaded => self.demo.load(&mut self.map),
                    MapEvent::MarkerClicked { properties } => {
                        let content = self.demo.popup_content(&properties);
                        let anchor = self.map.last_click().unwrap_or_else(|| {
                            let v = self.map.viewport();
                            glam::DVec2::new(v.center_lon, v.center_lat)
                        });
                        self.map.open_popup(anchor, content);
                        Ok(())
                    }
                    MapEvent::MarkerButtonClick { button } => self.demo.on_button(&mut self.map, &button),
                };
                self.report(result);
            }
        }
    }

    fn report(&mut self, result: tui_layermap::error::Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "map operation failed");
            self.status = Some(e.to_string());
        }
    }

    /// Convert a terminal position to a map cell, skipping the border
    fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let viewport = self.map.viewport();
        let (cx, cy) = (col.checked_sub(1)?, row.checked_sub(1)?);
        (usize::from(cx) * 2 < viewport.width && usize::from(cy) * 4 < viewport.height).then_some((cx, cy))
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.viewport_mut().pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.viewport_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.viewport_mut().zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let px = (col.saturating_sub(1) as i32) * 2;
        let py = (row.saturating_sub(1) as i32) * 4;
        self.map.viewport_mut().zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let px = (col.saturating_sub(1) as i32) * 2;
        let py = (row.saturating_sub(1) as i32) * 4;
        self.map.viewport_mut().zoom_out_at(px, py);
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((x, y));
    }

    /// End a press; one that never moved selects what is under it
    pub fn release(&mut self, col: u16, row: u16) {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_click {
            self.click(col, row);
        }
    }

    pub fn click(&mut self, col: u16, row: u16) {
        let Some((cx, cy)) = self.map_cell(col, row) else {
            return;
        };
        let result = self.map.handle_click(cx, cy).map(|_| ());
        self.report(result);
        self.process_events();
    }

    /// Drop a click-point at a screen position
    pub fn drop_point(&mut self, col: u16, row: u16) {
        let Some((cx, cy)) = self.map_cell(col, row) else {
            return;
        };
        let (lon, lat) = self.map.viewport().unproject(cx as i32 * 2 + 1, cy as i32 * 4 + 2);
        let result = self.map.click_point(lon, lat);
        self.report(result);
        self.process_events();
    }

    /// Step the province filter forwards or backwards
    pub fn cycle_province(&mut self, forward: bool) {
        let count = PROVINCES.len();
        let next = match (self.province, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        match self.demo.select_province(&mut self.map, PROVINCES[next].0) {
            Ok(true) => self.province = Some(next),
            Ok(false) => self.status = Some("no province filter on this page".to_string()),
            Err(e) => self.report(Err(e)),
        }
    }

    pub fn province_label(&self) -> Option<&'static str> {
        self.province.map(|i| PROVINCES[i].1)
    }

    pub fn toggle_legend(&mut self) {
        if self.demo.legend().is_none() {
            self.status = Some("no legend on this page".to_string());
            return;
        }
        let result = self.demo.toggle_legend(&mut self.map);
        self.report(result);
    }

    /// Hide or show the page's layer group
    pub fn toggle_layer(&mut self) {
        let id = self.demo.layer_id();
        let result = if self.layer_hidden {
            self.map.show_layer_group(id)
        } else {
            self.map.hide_layer_group(id)
        };
        if result.is_ok() {
            self.layer_hidden = !self.layer_hidden;
        }
        self.report(result);
    }

    pub fn fit_to_layer(&mut self) {
        let result = self.map.fit_map_bounds_to_layer(self.demo.layer_id(), DEFAULT_FIT_ZOOM);
        self.report(result);
    }

    /// Take every vector layer off the map
    pub fn clear(&mut self) {
        self.map.close_popup();
        let result = self.map.clear_all_rendered_layers();
        self.layer_hidden = true;
        self.report(result);
    }

    pub fn reset_colors(&mut self) {
        let result = self.map.reset_all_colors();
        self.report(result);
    }

    pub fn press_popup_button(&mut self) {
        if self.map.press_focused_button() {
            self.process_events();
        }
    }

    /// Close the popup if one is open, otherwise quit
    pub fn escape(&mut self) {
        if self.map.popup().is_some() {
            self.map.close_popup();
        } else {
            self.quit();
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("z{}", self.map.viewport().level())
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let v = self.map.viewport();
        format!(
            "{:.3}°{}, {:.3}°{}",
            v.center_lat.abs(),
            if v.center_lat >= 0.0 { "N" } else { "S" },
            v.center_lon.abs(),
            if v.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}
