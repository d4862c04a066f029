//! Project domain module
//!
//! A project owns a recursive content tree (folders holding documents,
//! videos, images and further folders) and a flat list of timeboxes.

pub mod entity;
pub mod repository;

pub use entity::{ContentType, Project, ProjectContent, TimeboxRef};
pub use repository::ProjectRepository;
