use adrotate_core::RotationStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RotationStore>,
    pub adrotate_env: String,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
