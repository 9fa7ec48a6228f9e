use std::sync::Arc;

use ferrite_vision::{AppConfig, ChartRenderer, PredictionService};

/// Everything a handler needs.  Built once in `main`, immutable afterwards,
/// and shared by every request thread.
pub struct App {
    pub config: AppConfig,
    pub predictions: PredictionService,
    pub chart: Box<dyn ChartRenderer>,
}

impl App {
    pub fn new(config: AppConfig, predictions: PredictionService, chart: Box<dyn ChartRenderer>) -> App {
        App { config, predictions, chart }
    }

    /// Request bodies above this are not read.  Leaves headroom over the
    /// file limit for multipart framing.
    pub fn body_limit(&self) -> usize {
        self.config.max_upload_bytes.saturating_add(64 * 1024)
    }
}

pub type SharedApp = Arc<App>;
