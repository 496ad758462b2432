//! Record metadata, queries and stores.
//!
//! # Examples
//!
//! ```rust
//! use formset::db::{MemoryStore, Query, RecordStore};
//! use formset_test::fixtures::Author;
//!
//! let store = MemoryStore::with_records([Author::new(1, "Paul Verlaine")]).unwrap();
//! assert_eq!(store.fetch(&Query::new()).unwrap().len(), 1);
//! ```

#[cfg(feature = "db")]
pub use formset_db::*;
