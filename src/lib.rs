//! # Formset
//!
//! Model formsets for Rust: edit a collection of records through one
//! submitted payload.
//!
//! A formset renders one form slot per existing record plus a configurable
//! number of blank slots. On submission it validates every slot, enforces
//! slot-count bounds, rejects duplicate values between slots and writes back
//! only what changed: updates, inserts and deletions.
//!
//! ## Feature Flags
//!
//! - `db` - record metadata, queries and the in-memory store
//! - `forms` - forms, model forms, model formsets and inline formsets
//! - `test` - fixtures and payload helpers
//! - `full` (default) - `db` and `forms`
//!
//! ## Quick Start
//!
//! ```rust
//! use formset::{FormSetOptions, MemoryStore, ModelFormSet, ModelFormSetBuilder};
//! use formset_test::fixtures::Author;
//! use formset_test::payload;
//!
//! let mut store = MemoryStore::with_records([Author::new(1, "Charles Baudelaire")]).unwrap();
//! let config = ModelFormSetBuilder::<Author>::new()
//!     .with_fields(&["name"])
//!     .build()
//!     .unwrap();
//!
//! let data = payload! {
//!     "form-TOTAL_FORMS" => "2",
//!     "form-INITIAL_FORMS" => "1",
//!     "form-0-id" => "1",
//!     "form-0-name" => "Charles Baudelaire",
//!     "form-1-name" => "Paul Verlaine",
//! };
//! let mut formset = ModelFormSet::new(config, &store, FormSetOptions::new().with_data(data)).unwrap();
//!
//! assert!(formset.is_valid(&store).unwrap());
//! let saved = formset.save(&mut store, true).unwrap();
//! assert_eq!(saved.len(), 1);
//! assert_eq!(formset.new_objects()[0].name, "Paul Verlaine");
//! ```

#[cfg(feature = "db")]
pub mod db;
#[cfg(feature = "forms")]
pub mod forms;

// Re-export records and stores (db feature)
#[cfg(feature = "db")]
pub use formset_db::{
	FieldKind, FieldMetadata, MemoryStore, Model, ModelError, ModelMetadata, Query, RecordStore,
	StoreError, StoreResult, UniqueConstraint,
};

// Re-export formsets (forms feature)
#[cfg(feature = "forms")]
pub use formset_forms::{
	ConfigError, Form, FormData, FormSetError, FormSetOptions, FormSetResult, FormSetSettings,
	InlineFormSet, InlineFormSetBuilder, ManagementForm, ModelForm, ModelFormSet,
	ModelFormSetBuilder, ModelFormSetConfig,
};
