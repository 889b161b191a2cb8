pub mod automation;
pub mod files;
