mod package;

pub use package::{AutomationPackage, COMMON_OPERATIONS, EXTENDED_ONLY_OPERATIONS};
