//! HTTP API.
//!
//! Public routes (`/health`, `/auth/*`) and bearer-protected resource
//! routes. Protected routes run Auth → Access log → Handler.
//!
//! `api_router()` returns a plain `Router`, so tests can drive it with
//! `oneshot` and the server can mount it on a listener.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
