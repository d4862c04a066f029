//! Infrastructure layer
//!
//! The REST client and the backend-facing implementations of the domain
//! repositories, the persisted session, and in-memory stand-ins.

pub mod api;
pub mod http;
pub mod memory;
pub mod session;

pub use http::ApiClient;
pub use session::{Session, SessionStore};
