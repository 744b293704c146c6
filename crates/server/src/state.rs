use std::sync::{Arc, Mutex};

use proctor_core::pipeline::detect_faces_use_case::DetectFacesUseCase;
use proctor_core::violation::domain::violation_logger::ViolationLogger;
use proctor_core::violation::domain::violation_store::SharedViolationStore;

/// Shared handler state. Cheap to clone; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The detect/count/log pipeline. One request runs it at a time.
    pub pipeline: Arc<Mutex<DetectFacesUseCase>>,
    /// Writer for client-reported violations.
    pub logger: ViolationLogger,
    /// Read access for listing violations.
    pub store: SharedViolationStore,
}

impl AppState {
    pub fn new(pipeline: DetectFacesUseCase, store: SharedViolationStore) -> Self {
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            logger: ViolationLogger::new(store.clone()),
            store,
        }
    }
}
