use crate::data::parse_feature_collection;
use crate::demo::{overlay_style, Demo, DemoKind, Legend, OverlaySlot};
use crate::element::{MapElement, PopupButton, PopupContent, DEFAULT_FIT_ZOOM};
use crate::error::Result;
use crate::layers::{DatasetOptions, Properties};
use crate::map::style::Rgba;
use geojson::FeatureCollection;
use tracing::info;

pub const LAYER_ID: &str = "top25";

/// Attribute the legend colours by
pub const LEGEND_KEY: &str = "Percentage";

const DATASET: &[u8] = include_bytes!("data/top25.geojson");

/// Top-25 target-market neighbourhoods with a percentage legend
pub struct SweetspotDemo {
    data: Option<FeatureCollection>,
    overlay: OverlaySlot,
    legend: Legend,
}

impl SweetspotDemo {
    pub fn new() -> Self {
        Self {
            data: None,
            overlay: OverlaySlot::default(),
            legend: Legend {
                key: LEGEND_KEY,
                // one entry per bucket; 25-35 lands in the 25-50 bucket
                entries: vec![
                    ("<= 5%", Rgba::rgb(0xff, 0xff, 0xcc)),
                    ("5-10%", Rgba::rgb(0xc7, 0xe9, 0xb4)),
                    ("10-20%", Rgba::rgb(0x7f, 0xcd, 0xbb)),
                    ("20-25%", Rgba::rgb(0x41, 0xb6, 0xc4)),
                    ("25-50%", Rgba::rgb(0x2c, 0x7f, 0xb8)),
                    ("> 50%", Rgba::rgb(0x25, 0x34, 0x94)),
                ],
                active: false,
            },
        }
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }
}

impl Default for SweetspotDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for SweetspotDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Sweetspot
    }

    fn title(&self) -> &'static str {
        " Sweetspot top 25 "
    }

    fn layer_id(&self) -> &'static str {
        LAYER_ID
    }

    fn load(&mut self, map: &mut MapElement) -> Result<()> {
        let data = parse_feature_collection(DATASET)?;
        map.add_dataset(&data, &DatasetOptions::new(LAYER_ID))?;
        map.fit_map_bounds_to_layer(LAYER_ID, DEFAULT_FIT_ZOOM)?;
        info!(features = data.features.len(), "top 25 loaded");
        self.data = Some(data);
        Ok(())
    }

    fn popup_content(&self, p: &Properties) -> PopupContent {
        PopupContent::new()
            .line(format!("Positie: {}", p.display("Positie")))
            .line(format!("Wijkcode: {}", p.display("wk_code")))
            .line(format!("Wijknaam: {}", p.display("wk_naam")))
            .line(format!("Gemeentenaam: {}", p.display("gm_naam")))
            .line(format!("Aantal huishoudens: {}", p.display("aantal_hh")))
            .line(format!("Aantal binnen doelgroep {}", p.display("aantal_doelgroep")))
            .line(format!("Percentage: {}%", p.display("Percentage")))
            .button(PopupButton::new("Verzorgingsgebied").with_data("id", p.display("wk_code")))
    }

    fn on_button(&mut self, map: &mut MapElement, button: &PopupButton) -> Result<()> {
        let (Some(data), Some(code)) = (self.data.as_ref(), button.data("id")) else {
            return Ok(());
        };
        let collection = map.geojson_collection(data, overlay_style(), |p| p.text("wk_code") == Some(code));
        self.overlay.replace(map, collection)
    }

    fn legend(&self) -> Option<&Legend> {
        Some(&self.legend)
    }

    fn toggle_legend(&mut self, map: &mut MapElement) -> Result<()> {
        if self.legend.active {
            map.reset_all_colors()?;
        } else {
            map.set_layer_colors_by_attribute_bucket(self.legend.key, &self.legend.palette())?;
        }
        self.legend.active = !self.legend.active;
        Ok(())
    }
}
