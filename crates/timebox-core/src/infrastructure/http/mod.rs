//! HTTP plumbing shared by every backend repository

pub mod client;
pub mod envelope;
pub mod normalize;

pub use client::{ApiClient, ApiClientBuilder};
pub use envelope::unwrap_envelope;
pub use normalize::normalize;
