//! Shared application state for the solve server.

use std::sync::Arc;

use snapsolve::io::model::ModelClient;
use snapsolve::solve::SolveService;

/// Model backend shared by all requests.
pub type SharedModel = Arc<dyn ModelClient>;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SolveService<SharedModel>>,
}

impl AppState {
    pub fn new(service: SolveService<SharedModel>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
