//! Forms, model forms and model formsets.
//!
//! # Examples
//!
//! ```rust
//! use formset::forms::ModelFormSetBuilder;
//! use formset_test::fixtures::Author;
//!
//! let config = ModelFormSetBuilder::<Author>::new().with_fields(&["name"]).build().unwrap();
//! assert_eq!(config.extra, 1);
//! ```

#[cfg(feature = "forms")]
pub use formset_forms::*;
