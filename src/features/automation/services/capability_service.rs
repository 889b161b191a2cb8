use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::automation::models::{
    AutomationPackage, COMMON_OPERATIONS, EXTENDED_ONLY_OPERATIONS,
};

/// Capability table for the automation package chosen at startup.
///
/// The basic package supports every operation outside the extended-only
/// set. The extended package supports that set plus the common operations.
pub struct CapabilityService {
    package: AutomationPackage,
    server_address: String,
    database_backend: &'static str,
}

impl CapabilityService {
    pub fn new(
        package: AutomationPackage,
        server_address: impl Into<String>,
        database_backend: &'static str,
    ) -> Self {
        info!(
            "Automation package '{}' with {} supported operations",
            package,
            supported_operations(package).len()
        );
        Self {
            package,
            server_address: server_address.into(),
            database_backend,
        }
    }

    pub fn package(&self) -> AutomationPackage {
        self.package
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn database_backend(&self) -> &'static str {
        self.database_backend
    }

    pub fn supports(&self, operation: &str) -> bool {
        let extended_only = EXTENDED_ONLY_OPERATIONS.contains(&operation);
        match self.package {
            AutomationPackage::Basic => !extended_only,
            AutomationPackage::Extended => {
                extended_only || COMMON_OPERATIONS.contains(&operation)
            }
        }
    }

    /// Fails with `NotImplemented` when the deployed package lacks `operation`
    pub fn require(&self, operation: &str) -> Result<()> {
        if self.supports(operation) {
            return Ok(());
        }
        Err(AppError::NotImplemented(format!(
            "Operation '{}' is not available in the {} package",
            operation, self.package
        )))
    }

    /// Known operations the deployed package supports
    pub fn supported_operations(&self) -> Vec<&'static str> {
        supported_operations(self.package)
    }
}

fn supported_operations(package: AutomationPackage) -> Vec<&'static str> {
    match package {
        AutomationPackage::Basic => COMMON_OPERATIONS.to_vec(),
        AutomationPackage::Extended => COMMON_OPERATIONS
            .iter()
            .chain(EXTENDED_ONLY_OPERATIONS)
            .copied()
            .collect(),
    }
}
