use std::sync::Arc;

use crate::application::services::ShortenerService;
use crate::domain::repositories::Pinger;

/// Shared handler state.
///
/// `pinger` is only set when a database backend is configured.
#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<ShortenerService>,
    pub pinger: Option<Arc<dyn Pinger>>,
}

impl AppState {
    pub fn new(shortener: Arc<ShortenerService>, pinger: Option<Arc<dyn Pinger>>) -> Self {
        Self { shortener, pinger }
    }
}
