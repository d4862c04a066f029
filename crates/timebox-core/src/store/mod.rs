//! Local mirrors of backend entities
//!
//! Stores are owned by the services that fill them and handed out by
//! reference. They only ever hold data the backend has confirmed.

pub mod entity_store;

pub use entity_store::{EntityReceiver, EntityStore, Keyed};
