//! Capability table for the messaging automation package.
//!
//! The automation itself runs elsewhere; this feature only reports which
//! package is deployed and which operations it provides.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/info/package` | Deployed package |
//! | GET | `/api/info/features` | Supported operations |
//! | GET | `/api/info/features/{operation}` | Check one operation (501 if absent) |
//! | GET | `/api/info/status` | Package, listener and storage backend |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use models::AutomationPackage;
pub use services::CapabilityService;
