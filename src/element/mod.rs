pub mod map;
pub mod popup;

pub use map::{MapElement, DEFAULT_FIT_ZOOM};
pub use popup::{PopupButton, PopupContent, PopupElement, PopupLine, PopupView, Tone};

use crate::demo::DemoKind;
use crate::error::{MapError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Tag of the map component
pub const MAP_TAG: &str = "layer-map";
/// Tag of the popup component
pub const POPUP_TAG: &str = "map-popup";

/// Component a tag resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Map,
    Popup,
    Demo(DemoKind),
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Map => "map",
            ElementKind::Popup => "popup",
            ElementKind::Demo(kind) => kind.name(),
        }
    }
}

/// Components known by tag.
///
/// Definitions are idempotent: defining a tag again with the same kind
/// changes nothing, a different kind is rejected.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    elements: BTreeMap<String, ElementKind>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in component defined
    pub fn bootstrap() -> Result<Self> {
        let mut registry = Self::new();
        registry.define(MAP_TAG, ElementKind::Map)?;
        registry.define(POPUP_TAG, ElementKind::Popup)?;
        for kind in DemoKind::ALL {
            registry.define(kind.tag(), ElementKind::Demo(kind))?;
        }
        Ok(registry)
    }

    /// Define `tag`. Returns `true` when the tag is new.
    pub fn define(&mut self, tag: &str, kind: ElementKind) -> Result<bool> {
        match self.elements.get(tag) {
            Some(existing) if *existing == kind => Ok(false),
            Some(existing) => Err(MapError::ElementConflict {
                tag: tag.to_string(),
                existing: existing.name(),
            }),
            None => {
                debug!(tag, kind = kind.name(), "element defined");
                self.elements.insert(tag.to_string(), kind);
                Ok(true)
            }
        }
    }

    pub fn lookup(&self, tag: &str) -> Result<ElementKind> {
        self.elements
            .get(tag)
            .copied()
            .ok_or_else(|| MapError::UnknownElement(tag.to_string()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bootstrap_defines_all_tags() {
        let registry = ElementRegistry::bootstrap().unwrap();
        assert_eq!(
            registry.tags().collect::<Vec<_>>(),
            vec!["layer-map", "map-demo", "map-demo-sweetspot", "map-popup"]
        );
        assert_eq!(
            registry.lookup("map-demo-sweetspot").unwrap(),
            ElementKind::Demo(DemoKind::Sweetspot)
        );
    }

    #[test]
    fn redefining_is_idempotent() {
        let mut registry = ElementRegistry::bootstrap().unwrap();
        assert_eq!(registry.define(MAP_TAG, ElementKind::Map), Ok(false));
        assert_eq!(registry.define("extra-map", ElementKind::Map), Ok(true));
    }

    #[test]
    fn conflicting_definition_is_rejected() {
        let mut registry = ElementRegistry::bootstrap().unwrap();
        let err = registry.define(MAP_TAG, ElementKind::Popup).unwrap_err();
        assert_eq!(
            err,
            MapError::ElementConflict {
                tag: MAP_TAG.to_string(),
                existing: "map"
            }
        );
        assert_eq!(registry.lookup(MAP_TAG), Ok(ElementKind::Map));
    }

    #[test]
    fn unknown_tags_are_reported() {
        let registry = ElementRegistry::bootstrap().unwrap();
        assert_eq!(
            registry.lookup("tile-map"),
            Err(MapError::UnknownElement("tile-map".to_string()))
        );
    }
}
