//! Debug overlay data.

use crate::core::Point2D;

/// Points collected for an on-screen or SVG overlay.
#[derive(Clone, Debug, Default)]
pub struct DebugVisualization {
    /// Nodes the active search has touched
    pub search_nodes: Vec<Point2D>,
}

impl DebugVisualization {
    pub fn clear(&mut self) {
        self.search_nodes.clear();
    }
}
