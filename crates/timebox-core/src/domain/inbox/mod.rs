//! Developer task inbox
//!
//! Buckets published timeboxes relative to the current user and narrows them
//! by skill and effort. Applying is handled by
//! [`InboxService`](crate::application::inbox_service::InboxService).

pub mod filter;

pub use filter::{
    InboxBucket, InboxFilter, SortOrder, available_roles, bucket_counts, bucket_of, filter_inbox,
};
