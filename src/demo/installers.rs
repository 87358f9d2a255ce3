use crate::data::parse_feature_collection;
use crate::demo::{overlay_style, Demo, DemoKind, OverlaySlot};
use crate::element::{MapElement, PopupButton, PopupContent, Tone, DEFAULT_FIT_ZOOM};
use crate::error::Result;
use crate::layers::{DatasetOptions, Properties};
use geojson::FeatureCollection;
use tracing::info;

pub const LAYER_ID: &str = "installateurs";

const DATASET: &[u8] = include_bytes!("data/installateurs.geojson");

/// Keywords scored per installer; an empty value means the company does
/// not mention it
pub const KEYWORDS: [&str; 14] = [
    "Duurzaam",
    "Warmtepompen",
    "Koelen",
    "Ventilatie",
    "WTW (warmte-terug-win)",
    "WTW",
    "warmte-terug-win",
    "Zonnepanelen",
    "Zonne-energie",
    "Zonneboilers",
    "Consumenten",
    "Energieadvies",
    "Besparen",
    "Vloerverwarming",
];

/// Installer locations with a service-area button and a province filter
pub struct InstallersDemo {
    data: Option<FeatureCollection>,
    overlay: OverlaySlot,
}

impl InstallersDemo {
    pub fn new() -> Self {
        Self {
            data: None,
            overlay: OverlaySlot::default(),
        }
    }

    /// Features in the current overlay
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }
}

impl Default for InstallersDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for InstallersDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Installers
    }

    fn title(&self) -> &'static str {
        " Installateurs "
    }

    fn layer_id(&self) -> &'static str {
        LAYER_ID
    }

    fn load(&mut self, map: &mut MapElement) -> Result<()> {
        let data = parse_feature_collection(DATASET)?;
        map.add_dataset(&data, &DatasetOptions::new(LAYER_ID).locations())?;
        map.fit_map_bounds_to_layer(LAYER_ID, DEFAULT_FIT_ZOOM)?;
        info!(features = data.features.len(), "installers loaded");
        self.data = Some(data);
        Ok(())
    }

    fn popup_content(&self, p: &Properties) -> PopupContent {
        let mut content = PopupContent::new()
            .line(p.display("company_name"))
            .line(p.display("street"))
            .line(format!("{} {}", p.display("zip"), p.display("city")))
            .line(p.display("region"))
            .line(format!("Tel: {}", p.display("Phone")))
            .line(format!("URL {}", p.display("web")))
            .line(format!("FTE: {}", p.display("employees")))
            .line(format!(
                "Trefwoorden: {}/{}",
                p.number("unique_words").unwrap_or(0.0),
                KEYWORDS.len()
            ));
        for keyword in KEYWORDS {
            let tone = if p.text(keyword) == Some("") {
                Tone::Negative
            } else {
                Tone::Positive
            };
            content = content.toned(keyword, tone);
        }
        content.button(PopupButton::new("Verzorgingsgebied").with_data("duns", p.display("duns")))
    }

    fn on_button(&mut self, map: &mut MapElement, button: &PopupButton) -> Result<()> {
        let (Some(data), Some(duns)) = (self.data.as_ref(), button.data("duns")) else {
            return Ok(());
        };
        let collection = map.geojson_collection(data, overlay_style(), |p| {
            p.get("duns").is_some_and(|v| v.matches(duns))
        });
        self.overlay.replace(map, collection)
    }

    fn select_province(&mut self, map: &mut MapElement, province: &str) -> Result<bool> {
        let Some(data) = self.data.as_ref() else {
            return Ok(true);
        };
        let collection = map.geojson_collection(data, overlay_style(), |p| {
            province.is_empty() || p.text("region") == Some(province)
        });
        self.overlay.replace(map, collection)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSettings;
    use crate::layers::LayerType;
    use pretty_assertions::assert_eq;

    fn loaded() -> (MapElement, InstallersDemo) {
        let mut map = MapElement::new(MapSettings::default(), vec![]);
        map.resize(120, 40);
        map.connected();
        let mut demo = InstallersDemo::new();
        demo.load(&mut map).unwrap();
        (map, demo)
    }

    #[test]
    fn loads_locations() {
        let (map, _) = loaded();
        let group = map.controller().registry().group(LAYER_ID).unwrap();
        assert_eq!(group.len(), 14);
        assert!(group.markers.is_empty());
        assert!(group.features.iter().all(|f| f.layer_type == LayerType::Locations));
    }

    #[test]
    fn keyword_tones_follow_empty_values() {
        let (_, demo) = loaded();
        let mut p: Properties = KEYWORDS.iter().map(|k| (*k, k.to_lowercase())).collect();
        p.insert("Koelen", "");
        p.insert("unique_words", 13.0);
        let content = demo.popup_content(&p);

        let tone = |text: &str| content.lines.iter().find(|l| l.text == text).map(|l| l.tone);
        assert_eq!(tone("Koelen"), Some(Tone::Negative));
        assert_eq!(tone("Duurzaam"), Some(Tone::Positive));
        assert!(content.lines.iter().any(|l| l.text == "Trefwoorden: 13/14"));
    }

    #[test]
    fn absent_keywords_are_positive() {
        let (_, demo) = loaded();
        let content = demo.popup_content(&Properties::new());
        assert!(content.lines.iter().all(|l| l.tone != Tone::Negative));
        assert_eq!(content.buttons[0].data("duns"), Some(""));
    }

    #[test]
    fn duns_button_shows_one_installer() {
        let (mut map, mut demo) = loaded();
        let button = PopupButton::new("Verzorgingsgebied").with_data("duns", "401200310");
        demo.on_button(&mut map, &button).unwrap();
        assert_eq!(demo.overlay_len(), 1);
    }

    #[test]
    fn province_filter_replaces_overlay() {
        let (mut map, mut demo) = loaded();
        demo.select_province(&mut map, "Zuid-Holland").unwrap();
        assert_eq!(demo.overlay_len(), 2);
        assert_eq!(map.surface().attached().len(), 17);

        demo.select_province(&mut map, "").unwrap();
        assert_eq!(demo.overlay_len(), 14);
        // 1 tile + 14 locations + 14 overlay markers
        assert_eq!(map.surface().attached().len(), 29);
    }
}
