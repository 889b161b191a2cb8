pub mod capability_service;

pub use capability_service::CapabilityService;
