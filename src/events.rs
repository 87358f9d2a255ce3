use crate::element::popup::PopupButton;
use crate::layers::Properties;
use std::collections::VecDeque;

/// Notifications a map element raises for its host.
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    /// The surface is initialised and the basemap attached
    MapLoaded,
    /// A feature or marker was clicked; carries its merged properties
    MarkerClicked { properties: Properties },
    /// A button inside an open popup was pressed
    MarkerButtonClick { button: PopupButton },
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::MapLoaded => "map-loaded",
            MapEvent::MarkerClicked { .. } => "marker-clicked",
            MapEvent::MarkerButtonClick { .. } => "marker-button-click",
        }
    }
}

/// FIFO of pending events, drained by the host after each input event.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<MapEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: MapEvent) {
        tracing::debug!(event = event.name(), "event queued");
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<MapEvent> {
        self.pending.pop_front()
    }

    pub fn drain(&mut self) -> Vec<MapEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
