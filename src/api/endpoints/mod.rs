//! API endpoint handlers.
//!
//! One module per resource. Handlers open a connection, call the
//! repository layer and map errors through `ApiError`.

pub mod appointments;
pub mod auth;
pub mod encounters;
pub mod health;
pub mod me;
pub mod patients;
