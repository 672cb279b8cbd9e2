//! Click dispatch.
//!
//! A click on the map is delivered to the marker under the cursor first, then
//! bubbles up to the map. Marker handlers stop propagation so the map's
//! close-sidebar handler never sees the click that opened the panel.

use crate::markers::MarkerMetadata;
use crate::sidebar::Sidebar;
use std::sync::Arc;
use tracing::debug;

/// A click at a canvas dot position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub x: i32,
    pub y: i32,
    propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            propagation_stopped: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Something that reacts to clicks
pub trait ClickHandler {
    fn on_click(&self, event: &mut ClickEvent, sidebar: &mut Sidebar);
}

/// Handler bound to one marker, holding a snapshot of its metadata
#[derive(Debug, Clone)]
pub struct MarkerClickHandler {
    metadata: Arc<MarkerMetadata>,
    panel_id: Arc<str>,
}

impl MarkerClickHandler {
    pub fn new(metadata: Arc<MarkerMetadata>, panel_id: Arc<str>) -> Self {
        Self { metadata, panel_id }
    }

    pub fn metadata(&self) -> &MarkerMetadata {
        &self.metadata
    }
}

impl ClickHandler for MarkerClickHandler {
    fn on_click(&self, event: &mut ClickEvent, sidebar: &mut Sidebar) {
        event.stop_propagation();
        debug!(x = event.x, y = event.y, institution = %self.metadata.institution, "marker clicked");

        if let Some(panel) = sidebar.panel_mut(&self.panel_id) {
            panel.show(&self.metadata);
        }
        sidebar.open(&self.panel_id);
    }
}

/// Map-wide handler closing the detail panel on bare clicks
#[derive(Debug, Clone)]
pub struct MapClickHandler {
    panel_id: String,
}

impl MapClickHandler {
    pub fn new(panel_id: impl Into<String>) -> Self {
        Self {
            panel_id: panel_id.into(),
        }
    }
}

impl ClickHandler for MapClickHandler {
    fn on_click(&self, event: &mut ClickEvent, sidebar: &mut Sidebar) {
        if event.is_propagation_stopped() {
            return;
        }
        sidebar.close(&self.panel_id);
    }
}

/// Deliver a click to the marker handler (if any), then the map handler
pub fn dispatch_click(
    event: &mut ClickEvent,
    target: Option<&MarkerClickHandler>,
    map: &MapClickHandler,
    sidebar: &mut Sidebar,
) {
    if let Some(handler) = target {
        handler.on_click(event, sidebar);
    }
    map.on_click(event, sidebar);
}
