#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod headers;

mod error;
mod principal;
mod record;

pub use error::HttpError;
pub use principal::{ADMIN_ROLE, Operation, Principal};
pub use record::{
    AdapterData, AdapterRecord, ToolData, ToolDefinition, ToolRecord, ToolSpec, normalize_roles, valid_resource_name,
};
