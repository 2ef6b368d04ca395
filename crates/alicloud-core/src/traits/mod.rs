//! Core traits for the Alicloud provider
//!
//! This module defines the abstract interfaces every resource adapter follows.
//!
//! - [`StateAccessor`]: Fetch the current logical state of a remote entity
//! - [`Resource`]: Create/Read/Update/Delete capability of a resource kind

pub mod resource;
pub mod state_accessor;

pub use resource::{Applied, Resource};
pub use state_accessor::{LogicalState, Observation, StateAccessor};
