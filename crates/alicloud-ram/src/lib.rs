// # RAM Login Profile Resource
//
// This crate provides the `alicloud_ram_login_profile` resource: the
// console login settings (password, reset and MFA flags) of a RAM user.
//
// ## Lifecycle
//
// - Create: `CreateLoginProfile`, then wait until the profile is readable
// - Read: `GetLoginProfile`; a missing profile means the resource is gone
// - Update: `UpdateLoginProfile` with the password and any changed flags
// - Delete: `DeleteLoginProfile`, then wait until the profile is not found
// - Import: by user name
//
// ## Layout
//
// - [`api`]: the `RamApi` seam and its request/response types
// - [`http`]: `RamApi` over the RAM RPC API
// - [`memory`]: `RamApi` over an eventually consistent in-memory store
// - [`resource`]: the resource adapter and its state accessor
//
// ## Security Requirements
//
// - Passwords NEVER appear in logs or `Debug` output
// - The password is write-only: it is never read back into state

pub mod api;
pub mod http;
pub mod memory;
pub mod resource;

pub use api::{CreateLoginProfileRequest, LoginProfile, RamApi, UpdateLoginProfileRequest};
pub use http::HttpRamApi;
pub use memory::MemoryRamApi;
pub use resource::{
    LoginProfileAccessor, LoginProfileConfig, LoginProfileState, RamLoginProfile,
};

/// Terraform type name of the resource
pub const RESOURCE_TYPE: &str = "alicloud_ram_login_profile";

/// RAM API version
pub const RAM_API_VERSION: &str = "2015-05-01";
