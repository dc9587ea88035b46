#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod cache;
mod dispatch;
mod protocol;
mod router;

pub use cache::ToolListCache;
pub use dispatch::ToolDispatcher;
pub use router::{ToolGatewayState, tool_gateway_router};
