#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod proxy;
mod rewrite;
mod session;

pub use error::ProxyError;
pub use proxy::{ProxyState, proxy_router};
pub use rewrite::rewrite_target;
pub use session::{RoutedBackend, SessionRouter};
