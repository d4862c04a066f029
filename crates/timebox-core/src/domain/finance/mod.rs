//! Finance domain module
//!
//! Payment orders, their forward-only status lifecycle, weekly rate
//! resolution and the generator run when a timebox closes.

pub mod generator;
pub mod order;
pub mod rates;
pub mod repository;
pub mod weeks;

pub use generator::{GenerationReport, PaymentOrderGenerator, SkipReason};
pub use order::{OrdenDePago, PaymentStatus};
pub use rates::{RateResolver, RateSource, RateTable, ResolvedRate};
pub use repository::{PaymentOrderRepository, Role, RoleRepository};
pub use weeks::{MIN_WEEKS, billable_weeks, billing_end, elapsed_weeks};
