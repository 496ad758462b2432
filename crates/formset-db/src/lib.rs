//! # Formset DB
//!
//! Record-side collaborators for model formsets.
//!
//! Formsets never introspect a database schema. Instead every record type
//! describes itself through [`ModelMetadata`] and exposes its values through
//! the [`Model`] trait, and persistence goes through the [`RecordStore`] seam.
//!
//! ## Modules
//!
//! - [`metadata`]: field and model descriptors
//! - [`constraints`]: unique-together and date-scoped uniqueness descriptors
//! - [`model`]: the [`Model`] trait and value helpers
//! - [`query`]: equality and date-part filters over records
//! - [`store`]: the [`RecordStore`] trait and [`StoreError`]
//! - [`memory`]: an in-memory [`RecordStore`] implementation
//!
//! ## Example
//!
//! ```
//! use formset_db::{FieldKind, FieldMetadata, MemoryStore, ModelMetadata, Query, RecordStore};
//! # use formset_db::{Model, ModelError};
//! # use serde_json::{Value, json};
//! # #[derive(Debug, Clone, Default)]
//! # struct Author { id: Option<i64>, name: String }
//! # impl Model for Author {
//! #     fn metadata() -> ModelMetadata {
//! #         ModelMetadata::new("Author")
//! #             .with_field(FieldMetadata::auto_key("id"))
//! #             .with_field(FieldMetadata::new("name", FieldKind::char(100)))
//! #     }
//! #     fn get_field(&self, name: &str) -> Option<Value> {
//! #         match name {
//! #             "id" => Some(self.id.map(Value::from).unwrap_or(Value::Null)),
//! #             "name" => Some(json!(self.name)),
//! #             _ => None,
//! #         }
//! #     }
//! #     fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
//! #         match name {
//! #             "id" => self.id = value.as_i64(),
//! #             "name" => self.name = value.as_str().unwrap_or_default().to_string(),
//! #             _ => return Err(ModelError::UnknownField(name.to_string())),
//! #         }
//! #         Ok(())
//! #     }
//! # }
//!
//! let mut store = MemoryStore::<Author>::new();
//! let mut author = Author { id: None, name: "Charles Baudelaire".to_string() };
//! store.insert(&mut author).unwrap();
//!
//! assert_eq!(author.id, Some(1));
//! assert_eq!(store.fetch(&Query::new()).unwrap().len(), 1);
//! ```

pub mod constraints;
pub mod memory;
pub mod metadata;
pub mod model;
pub mod query;
pub mod store;

pub use constraints::{DateScope, DateUniqueCheck, UniqueConstraint};
pub use memory::MemoryStore;
pub use metadata::{FieldKind, FieldMetadata, ModelMetadata};
pub use model::{Model, ModelError, capfirst, compare_values, value_key, values_equal};
pub use query::{Filter, Lookup, Query};
pub use store::{RecordStore, StoreError, StoreResult};
