//! Server-side notification batching.
//!
//! Queued notifications are partitioned into delivery groups by a named
//! strategy and flushed when a group hits its size bound or its oldest
//! entry hits the wait bound, whichever comes first. Strategies are a
//! closed enumeration selected by name from configuration; configuration
//! never supplies executable code.

mod dispatcher;
mod grouper;
mod strategy;

pub use dispatcher::BatchDispatcher;
pub use grouper::{BatchConfig, BatchGrouper, GroupedDelivery};
pub use strategy::GroupingStrategy;
