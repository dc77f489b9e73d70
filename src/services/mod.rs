// Service exports
pub mod appwrite;
pub mod cache;
pub mod events;
pub mod postgres;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use cache::{CacheError, CacheKey, CacheManager, CachedEventStore};
pub use events::{run_notification_forwarder, DomainEvent, EventBus};
pub use postgres::{PostgresClient, PostgresError};
pub use store::{
    AvailabilityStore, EventStore, MemoryAvailabilityStore, MemoryEventStore, MemoryProposalStore,
    ProposalStore, StoreError,
};
