// # alicloud-core
//
// Core library shared by the Alicloud resource adapters.
//
// ## Architecture Overview
//
// Every resource adapter (RAM login profile, FC function, ...) is a thin
// CRUD translation onto the cloud API. The only reusable algorithm is the
// wait for eventual state that follows each mutating call:
//
// - **StateAccessor**: Read-only fetch of an entity's current logical state
// - **Resource**: Create/Read/Update/Delete capability every resource kind implements
// - **wait_for_state**: Bounded polling until an entity converges or the budget runs out
// - **classify**: Explicit table turning cloud error codes into NotFound / Transient / NonTransient
// - **AcsClient**: HTTP client for RPC and ROA style Alicloud APIs
// - **EventualStore**: In-memory store with propagation lag, backing the in-memory APIs
//
// ## Design Principles
//
// 1. **Explicit dependencies**: Cloud clients are passed in, never held globally
// 2. **Observe only**: The waiter never mutates the entity it watches
// 3. **Typed errors**: Classification comes from error codes, not message matching
// 4. **Bounded waits**: Every wait has a budget and returns when it is spent

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod traits;
pub mod waiter;

pub use classify::{classify_code, classify_response};
pub use client::{AcsClient, Credentials};
pub use config::{Backoff, BackendConfig, ProviderConfig, WaitConfig};
pub use error::{Error, ErrorClass, Result};
pub use state::EventualStore;
pub use traits::{Applied, LogicalState, Observation, Resource, StateAccessor};
pub use waiter::{WaitBudget, WaitOutcome, wait_for_state};
