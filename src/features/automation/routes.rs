use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::automation::handlers::{
    check_feature, get_features, get_package_info, get_status,
};
use crate::features::automation::services::CapabilityService;

pub fn routes(capability_service: Arc<CapabilityService>) -> Router {
    Router::new()
        .route("/api/info/package", get(get_package_info))
        .route("/api/info/features", get(get_features))
        .route("/api/info/features/{operation}", get(check_feature))
        .route("/api/info/status", get(get_status))
        .with_state(capability_service)
}
