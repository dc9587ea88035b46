#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod router;
mod service;

pub use error::ControlError;
pub use router::resource_router;
pub use service::{ManagedResource, ResourceService, deployment_dirty};
