//! Grievance lifecycle core.
//!
//! Pure domain types, port traits, and the service implementing submission,
//! assignment, status transitions, the dashboard listing, the derived
//! timeline, and analytics. Storage adapters live in `grievance-postgres`
//! (production) and [`memory`] (tests and demo mode).

pub mod actor;
pub mod analytics;
pub mod error;
pub mod memory;
pub mod policy;
pub mod ports;
pub mod proto;
pub mod query;
pub mod service;
pub mod types;

pub use actor::{Actor, Role};
pub use error::GrievanceError;
pub use policy::TransitionPolicy;
pub use service::{GrievanceService, GrievanceServiceImpl};
pub use types::GrievanceStatus;
