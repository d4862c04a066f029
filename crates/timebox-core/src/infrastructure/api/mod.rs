//! REST implementations of the domain repositories

pub mod auth;
pub mod finance;
pub mod people;
pub mod project;
pub mod timebox;
pub mod upload;

pub use auth::{AuthService, Credentials, RegisterRequest};
pub use finance::{HttpPaymentOrderRepository, HttpRoleRepository};
pub use people::PeopleDirectory;
pub use project::HttpProjectRepository;
pub use timebox::HttpTimeboxRepository;
pub use upload::HttpUploader;
