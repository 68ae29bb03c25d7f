//! Push controller configuration.

use spillway_connectors::format::{CsvRenderConfig, JsonRenderConfig};

/// Render configuration shared by every push the controller starts.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    /// CSV renderer settings.
    pub csv: CsvRenderConfig,
    /// JSON renderer settings.
    pub json: JsonRenderConfig,
}
