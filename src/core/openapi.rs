use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::automation::{
    dtos as automation_dtos, handlers as automation_handlers, models as automation_models,
};
use crate::features::files::{
    dtos as files_dtos, handlers as files_handlers, models as files_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_file,
        files_handlers::import_local_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::delete_file,
        files_handlers::download_file,
        // Automation info
        automation_handlers::get_package_info,
        automation_handlers::get_features,
        automation_handlers::check_feature,
        automation_handlers::get_status,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Files
            files_models::FileSortBy,
            files_models::SortOrder,
            files_dtos::UploadFileDto,
            files_dtos::ImportLocalFileDto,
            files_dtos::FileUploadResponseDto,
            files_dtos::FileResponseDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::FileUploadResponseDto>,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            // Automation info
            automation_models::AutomationPackage,
            automation_dtos::PackageInfoDto,
            automation_dtos::FeaturesDto,
            automation_dtos::FeatureCheckDto,
            automation_dtos::ServiceStatusDto,
            ApiResponse<automation_dtos::PackageInfoDto>,
            ApiResponse<automation_dtos::FeaturesDto>,
            ApiResponse<automation_dtos::FeatureCheckDto>,
            ApiResponse<automation_dtos::ServiceStatusDto>,
        )
    ),
    tags(
        (name = "files", description = "Content-addressed file storage"),
        (name = "info", description = "Automation package and service information"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "ChatRelay API",
        version = "0.1.0",
        description = "File storage and automation info API for ChatRelay",
    )
)]
pub struct ApiDoc;

/// Adds the static bearer token security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Value of API_TOKEN"))
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document() {
        let mut openapi = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Relay".to_string(),
            version: "9.9.9".to_string(),
            description: "test".to_string(),
        }
        .modify(&mut openapi);

        assert_eq!(openapi.info.title, "Relay");
        assert!(openapi.paths.paths.contains_key("/api/files/{file_id}/download"));
        assert!(openapi.paths.paths.contains_key("/api/info/features"));
        assert!(openapi
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
