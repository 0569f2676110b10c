//! Append-only event store boundary.
//!
//! Streams are keyed by aggregate id. Appends carry an expected version and are
//! rejected when the stream moved on, which is what gives the controller its
//! optimistic concurrency.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
