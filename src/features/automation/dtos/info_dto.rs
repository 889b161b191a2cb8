use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::automation::models::AutomationPackage;
use crate::features::automation::services::CapabilityService;

/// Which automation package is deployed
#[derive(Debug, Serialize, ToSchema)]
pub struct PackageInfoDto {
    pub package: AutomationPackage,
    pub is_extended: bool,
    pub description: String,
}

impl From<&CapabilityService> for PackageInfoDto {
    fn from(service: &CapabilityService) -> Self {
        let package = service.package();
        Self {
            package,
            is_extended: package.is_extended(),
            description: package.description().to_string(),
        }
    }
}

/// Operations the deployed package supports
#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturesDto {
    pub package: AutomationPackage,
    pub features: Vec<String>,
    pub feature_count: usize,
}

impl From<&CapabilityService> for FeaturesDto {
    fn from(service: &CapabilityService) -> Self {
        let features: Vec<String> = service
            .supported_operations()
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            package: service.package(),
            feature_count: features.len(),
            features,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeatureCheckDto {
    pub operation: String,
    pub supported: bool,
}

/// Service overview: package, listener and storage backend
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatusDto {
    pub package: AutomationPackage,
    pub is_extended: bool,
    pub server_address: String,
    pub database_backend: String,
    pub features: Vec<String>,
}

impl From<&CapabilityService> for ServiceStatusDto {
    fn from(service: &CapabilityService) -> Self {
        let package = service.package();
        Self {
            package,
            is_extended: package.is_extended(),
            server_address: service.server_address().to_string(),
            database_backend: service.database_backend().to_string(),
            features: service
                .supported_operations()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
