// # Function Compute Function Resource
//
// This crate provides the `alicloud_fc_function` resource: a function
// inside an existing Function Compute service, with its code taken from
// a local zip file or an OSS object.
//
// ## Lifecycle
//
// - Create: `CreateFunction`, then wait until the function is readable
// - Read: `GetFunction`; a missing function means the resource is gone
// - Update: `UpdateFunction` with the changed attributes
// - Delete: `DeleteFunction`, then wait until the function is not found
// - Import: by `<service>:<name>`
//
// ## Layout
//
// - [`api`]: the `FcApi` seam and its request/response types
// - [`http`]: `FcApi` over the Function Compute REST API
// - [`memory`]: `FcApi` over an eventually consistent in-memory store
// - [`resource`]: the resource adapter and its state accessor

pub mod api;
pub mod http;
pub mod memory;
pub mod resource;

pub use api::{CreateFunctionInput, FcApi, Function, FunctionCode, UpdateFunctionInput};
pub use http::HttpFcApi;
pub use memory::MemoryFcApi;
pub use resource::{
    FcFunction, FunctionAccessor, FunctionConfig, FunctionState, function_id, parse_function_id,
};

/// Terraform type name of the resource
pub const RESOURCE_TYPE: &str = "alicloud_fc_function";

/// Function Compute API version, also the first segment of every path
pub const FC_API_VERSION: &str = "2016-08-15";
