//! Domain layer
//!
//! Plain value types, the pure logic over them, and the async repository
//! traits the infrastructure layer implements.

pub mod attachment;
pub mod dates;
pub mod finance;
pub mod gantt;
pub mod inbox;
pub mod project;
pub mod timebox;
pub mod user;

pub use attachment::{Adjunto, UploadFile, Uploader};
pub use user::{Persona, User};
