use std::env;
use std::path::PathBuf;

use crate::features::automation::AutomationPackage;
use crate::shared::constants::{
    DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_UPLOAD_SIZE,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub automation: AutomationConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Static bearer token shared with the callers of this service
#[derive(Clone)]
pub struct AuthConfig {
    pub api_token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Local content-addressed file store configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory under which every stored blob lives
    pub root_dir: PathBuf,
    /// Maximum accepted payload size in bytes
    pub max_upload_size: u64,
    /// MIME allow-list; empty means every type is accepted
    pub allowed_mime_types: Vec<String>,
    /// Read/write granularity for hashing and streaming
    pub chunk_size: usize,
    /// Directory that locally materialized files may be imported from
    pub import_dir: PathBuf,
}

/// Which variant of the messaging automation library is deployed
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    pub package: AutomationPackage,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            automation: AutomationConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = split_list(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // SQLite serializes writers, so the pool stays small
    const DEFAULT_URL: &'static str = "sqlite://./data/chatrelay.db";
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_token = env::var("API_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "API_TOKEN environment variable is required".to_string())?;

        Ok(Self { api_token })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "ChatRelay API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Remote control and file relay for a desktop messaging client".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    const DEFAULT_ROOT_DIR: &'static str = "./uploads";
    const DEFAULT_IMPORT_DIR: &'static str = "./downloads";

    pub fn from_env() -> Result<Self, String> {
        let root_dir = PathBuf::from(
            env::var("UPLOAD_ROOT_DIR").unwrap_or_else(|_| Self::DEFAULT_ROOT_DIR.to_string()),
        );

        let max_upload_size = env::var("UPLOAD_MAX_SIZE")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_SIZE.to_string())
            .parse::<u64>()
            .map_err(|_| "UPLOAD_MAX_SIZE must be a valid number".to_string())?;

        // An explicitly empty list disables the MIME check
        let allowed_mime_types = match env::var("UPLOAD_ALLOWED_TYPES") {
            Ok(raw) => split_list(&raw),
            Err(_) => DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let chunk_size = env::var("UPLOAD_CHUNK_SIZE")
            .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "UPLOAD_CHUNK_SIZE must be a valid number".to_string())?;
        if chunk_size == 0 {
            return Err("UPLOAD_CHUNK_SIZE must be greater than zero".to_string());
        }

        let import_dir = PathBuf::from(
            env::var("UPLOAD_IMPORT_DIR").unwrap_or_else(|_| Self::DEFAULT_IMPORT_DIR.to_string()),
        );

        Ok(Self {
            root_dir,
            max_upload_size,
            allowed_mime_types,
            chunk_size,
            import_dir,
        })
    }

    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.is_empty()
            || self.allowed_mime_types.iter().any(|t| t == mime_type)
    }
}

impl AutomationConfig {
    pub fn from_env() -> Result<Self, String> {
        let package = env::var("AUTOMATION_PACKAGE")
            .unwrap_or_else(|_| "basic".to_string())
            .parse::<AutomationPackage>()?;

        Ok(Self { package })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
