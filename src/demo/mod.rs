//! The two demo pages: installer locations and top-25 target neighbourhoods.

mod installers;
mod sweetspot;

pub use installers::InstallersDemo;
pub use sweetspot::SweetspotDemo;

use crate::config::MapSettings;
use crate::element::{MapElement, PopupButton, PopupContent};
use crate::error::Result;
use crate::layers::{LayerCollection, Properties};
use crate::map::style::{PathStyle, Rgba};
use tracing::debug;

/// Province filter choices as `(value, label)`. The empty value selects
/// every feature.
pub const PROVINCES: [(&str, &str); 13] = [
    ("Groningen", "Groningen"),
    ("Friesland", "Friesland"),
    ("Drenthe", "Drenthe"),
    ("Overijssel", "Overijssel"),
    ("Flevoland", "Flevoland"),
    ("Gelderland", "Gelderland"),
    ("Utrecht", "Utrecht"),
    ("Noord-Holland", "Noord-Holland"),
    ("Zuid-Holland", "Zuid-Holland"),
    ("Zeeland", "Zeeland"),
    ("Noord-Brabant", "Noord-Brabant"),
    ("Limburg", "Limburg"),
    ("", "Nederland"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoKind {
    Installers,
    Sweetspot,
}

impl DemoKind {
    pub const ALL: [DemoKind; 2] = [DemoKind::Installers, DemoKind::Sweetspot];

    pub fn tag(self) -> &'static str {
        match self {
            DemoKind::Installers => "map-demo",
            DemoKind::Sweetspot => "map-demo-sweetspot",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Installers => "installers demo",
            DemoKind::Sweetspot => "sweetspot demo",
        }
    }

    pub fn create(self) -> Box<dyn Demo> {
        match self {
            DemoKind::Installers => Box::new(InstallersDemo::new()),
            DemoKind::Sweetspot => Box::new(SweetspotDemo::new()),
        }
    }
}

/// A page hosting one map element and reacting to its events.
pub trait Demo {
    fn kind(&self) -> DemoKind;

    fn title(&self) -> &'static str;

    /// Layer group the page adds
    fn layer_id(&self) -> &'static str;

    /// Settings handed to the map element
    fn settings(&self) -> MapSettings {
        MapSettings::default()
    }

    /// Add the page's datasets; runs once the map is loaded
    fn load(&mut self, map: &mut MapElement) -> Result<()>;

    /// Popup body for a clicked feature
    fn popup_content(&self, properties: &Properties) -> PopupContent;

    fn on_button(&mut self, map: &mut MapElement, button: &PopupButton) -> Result<()>;

    /// Show the features of one province. Returns `false` when the page
    /// has no province filter.
    fn select_province(&mut self, _map: &mut MapElement, _province: &str) -> Result<bool> {
        Ok(false)
    }

    fn legend(&self) -> Option<&Legend> {
        None
    }

    /// Switch legend colouring on or off
    fn toggle_legend(&mut self, _map: &mut MapElement) -> Result<()> {
        Ok(())
    }
}

/// Style of highlight overlays added from popup buttons and filters
pub fn overlay_style() -> PathStyle {
    PathStyle {
        fill_color: Rgba::rgb(0, 0, 255),
        color: Rgba::rgb(0x32, 0x32, 0x32),
        weight: 0.5,
        opacity: 0.4,
        fill_opacity: 0.4,
    }
}

/// Colour legend for bucket colouring on one attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub key: &'static str,
    pub entries: Vec<(&'static str, Rgba)>,
    pub active: bool,
}

impl Legend {
    pub fn palette(&self) -> Vec<Rgba> {
        self.entries.iter().map(|(_, color)| *color).collect()
    }
}

/// The one overlay a page shows at a time
#[derive(Default)]
struct OverlaySlot {
    active: Option<LayerCollection>,
}

impl OverlaySlot {
    fn replace(&mut self, map: &mut MapElement, collection: LayerCollection) -> Result<()> {
        self.clear(map);
        debug!(layers = collection.layers.len(), "overlay replaced");
        self.active = Some(map.add_layer(collection)?);
        Ok(())
    }

    fn clear(&mut self, map: &mut MapElement) {
        if let Some(previous) = self.active.take() {
            map.remove_layer(&previous);
        }
    }

    fn len(&self) -> usize {
        self.active.as_ref().map_or(0, |c| c.layers.len())
    }
}
