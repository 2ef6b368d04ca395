// # In-Memory State
//
// Storage used by the in-memory cloud APIs, for tests, demos and dry runs.

pub mod memory;

pub use memory::EventualStore;
