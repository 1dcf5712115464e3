//! Topology validation.
//!
//! [`validate_basic`] applies sanity rules to any topology.
//! [`validate_task`] additionally scores the topology against the
//! requirements of a [`Task`]. Failures are data in the returned
//! [`ValidationResult`], never errors.

pub mod requirements;
pub mod result;
pub mod validator;

pub use requirements::{Requirement, RequirementKind, Task};
pub use result::{Severity, ValidationError, ValidationResult};
pub use validator::{can_communicate, custom_check, requirement_met, validate_basic, validate_task, CUSTOM_CHECKS};
