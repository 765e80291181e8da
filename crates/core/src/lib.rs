//! Sponsor rotation and eligibility scheduling for newsletter issues.
//!
//! For every active module of an issue a rotation pass picks one sponsor and
//! one of that sponsor's creative units, never giving the same sponsor two
//! modules of one issue. Rotation state only moves when the selection is later
//! confirmed as delivered.

pub mod admin;
pub mod calendar;
pub mod config;
pub mod confirm;
pub mod coordinator;
pub mod cursor;
pub mod eligibility;
pub mod error;
pub mod policy;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod unit;

pub use admin::{manually_assign_unit, reset_module_cursor, set_module_cursor};
pub use confirm::{confirm_usage, UsageReport};
pub use coordinator::{run_rotation_pass, RotationPass};
pub use error::{RotationError, StoreError};
pub use store::RotationStore;
