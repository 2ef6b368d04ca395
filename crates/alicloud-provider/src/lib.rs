// # alicloud-provider
//
// Provider layer over the Alicloud resource adapters.
//
// ## Architecture Overview
//
// - **ResourceKind**: Closed set of resource types the provider serves
// - **ProviderClients**: Cloud API clients, built once and shared by every adapter
// - **AlicloudProvider**: Decodes JSON configuration and instance state and
//   dispatches create, read, update, delete and import to the matching adapter
// - **InstanceState**: What the orchestrator records per instance
//
// The `alicloud-reconcile` binary is a thin shell over this library.

pub mod kind;
pub mod provider;
pub mod state;

pub use kind::ResourceKind;
pub use provider::{AlicloudProvider, ProviderClients};
pub use state::InstanceState;
