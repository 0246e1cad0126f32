//! Infrastructure layer - store clients.

mod auth;
pub mod client;
pub mod cosmos;
pub mod memory;

pub use client::{FeedResponse, QueryCursor, StoreClient};
pub use cosmos::CosmosClient;
pub use memory::{DeleteFault, InMemoryStore, PageFault};

#[cfg(any(test, feature = "test-utils"))]
pub use client::MockStoreClient;
