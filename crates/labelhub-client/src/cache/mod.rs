//! Client-side query cache
//!
//! Reads go through a [`QueryCache`] keyed by [`QueryKey`], giving
//! de-duplication of concurrent identical requests, a staleness window and
//! invalidation. [`Query`] and [`Mutation`] are the handles consumers hold;
//! [`QueryObserver`] keeps a query's state current in the background.

pub mod key;
pub mod mutation;
pub mod observer;
pub mod query;
pub mod store;

pub use key::QueryKey;
pub use mutation::{CacheEffects, Mutation};
pub use observer::QueryObserver;
pub use query::{Query, QueryOptions, QueryState};
pub use store::{CacheEvent, CacheSnapshot, QueryCache, DEFAULT_GC_TIME};
