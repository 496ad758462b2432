//! Forms, model forms and model formsets
//!
//! This crate provides:
//! - Typed form fields with cleaning and change detection
//! - Model forms generated from [`formset_db::ModelMetadata`]
//! - Model formsets that edit many records in one submission
//! - Inline formsets over the children of a parent record
//! - Management data parsing and slot counting
//! - Formset settings loaded from TOML

pub mod bound_field;
pub mod error;
pub mod field;
pub mod fields;
pub mod form;
pub mod inline_formset;
pub mod management;
pub mod messages;
pub mod model_form;
pub mod model_formset;
pub mod settings;
mod uniqueness;

pub use bound_field::BoundField;
pub use error::{ConfigError, FormSetError, FormSetResult};
pub use field::{FieldError, FieldResult, FormField, Widget};
pub use fields::{
	BooleanField, CharField, Choice, Choices, DateField, DecimalField, InlineForeignKeyField,
	IntegerField, ModelChoiceField, ModelMultipleChoiceField,
};
pub use form::{ALL_FIELDS_KEY, CleanFunction, Form, FormData, FormError, FormResult};
pub use inline_formset::{InlineFormSet, InlineFormSetBuilder, InlineFormSetConfig};
pub use management::{DEFAULT_MAX_NUM, ManagementForm};
pub use model_form::{ModelForm, ModelFormConfig};
pub use model_formset::{
	DELETION_FIELD_NAME, FormSetCleanHook, FormSetOptions, ModelFormSet, ModelFormSetBuilder,
	ModelFormSetConfig, PreSaveHook,
};
pub use settings::FormSetSettings;
