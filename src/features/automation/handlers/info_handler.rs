use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::automation::dtos::{
    FeatureCheckDto, FeaturesDto, PackageInfoDto, ServiceStatusDto,
};
use crate::features::automation::services::CapabilityService;
use crate::shared::types::ApiResponse;

/// Get the deployed automation package
#[utoipa::path(
    get,
    path = "/api/info/package",
    responses(
        (status = 200, description = "Package information", body = ApiResponse<PackageInfoDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "info",
    security(("bearer_auth" = []))
)]
pub async fn get_package_info(
    State(service): State<Arc<CapabilityService>>,
) -> Result<Json<ApiResponse<PackageInfoDto>>> {
    Ok(Json(ApiResponse::success(
        Some(service.as_ref().into()),
        None,
        None,
    )))
}

/// List supported automation operations
#[utoipa::path(
    get,
    path = "/api/info/features",
    responses(
        (status = 200, description = "Supported operations", body = ApiResponse<FeaturesDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "info",
    security(("bearer_auth" = []))
)]
pub async fn get_features(
    State(service): State<Arc<CapabilityService>>,
) -> Result<Json<ApiResponse<FeaturesDto>>> {
    Ok(Json(ApiResponse::success(
        Some(service.as_ref().into()),
        None,
        None,
    )))
}

/// Check a single operation
///
/// Responds 501 when the deployed package does not provide it.
#[utoipa::path(
    get,
    path = "/api/info/features/{operation}",
    params(
        ("operation" = String, Path, description = "Operation name, e.g. send_url_card")
    ),
    responses(
        (status = 200, description = "Operation is supported", body = ApiResponse<FeatureCheckDto>),
        (status = 401, description = "Unauthorized"),
        (status = 501, description = "Operation not available in this package")
    ),
    tag = "info",
    security(("bearer_auth" = []))
)]
pub async fn check_feature(
    State(service): State<Arc<CapabilityService>>,
    Path(operation): Path<String>,
) -> Result<Json<ApiResponse<FeatureCheckDto>>> {
    service.require(&operation)?;
    Ok(Json(ApiResponse::success(
        Some(FeatureCheckDto {
            operation,
            supported: true,
        }),
        None,
        None,
    )))
}

/// Get service status
#[utoipa::path(
    get,
    path = "/api/info/status",
    responses(
        (status = 200, description = "Service status", body = ApiResponse<ServiceStatusDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "info",
    security(("bearer_auth" = []))
)]
pub async fn get_status(
    State(service): State<Arc<CapabilityService>>,
) -> Result<Json<ApiResponse<ServiceStatusDto>>> {
    Ok(Json(ApiResponse::success(
        Some(service.as_ref().into()),
        None,
        None,
    )))
}
