use formset_db::{ModelError, StoreError};

/// Formset definition errors, reported by the builders' `build()`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error(
		"Calling modelformset_factory without defining 'fields' or 'exclude' explicitly is prohibited."
	)]
	MissingFields,
	#[error("Unknown field(s) ({fields}) specified for {model}")]
	UnknownFields { fields: String, model: String },
	#[error("'{field}' cannot be specified for {model} model form as it is a non-editable field")]
	NonEditableField { field: String, model: String },
	#[error("'absolute_max' must be greater or equal to 'max_num'.")]
	AbsoluteMaxBelowMaxNum,
	#[error("'{model}' has no field named '{fk_name}'.")]
	NoSuchField { model: String, fk_name: String },
	#[error("fk_name '{fk_name}' is not a ForeignKey to '{parent}'.")]
	NotAForeignKey { fk_name: String, parent: String },
	#[error("'{child}' has no ForeignKey to '{parent}'.")]
	NoForeignKey { child: String, parent: String },
	#[error(
		"'{child}' has more than one ForeignKey to '{parent}'. You must specify a 'fk_name' attribute."
	)]
	AmbiguousForeignKey { child: String, parent: String },
	#[error("Invalid formset settings: {0}")]
	Settings(#[from] toml::de::Error),
	#[error("Failed to read {path}: {reason}")]
	SettingsFile { path: String, reason: String },
}

/// Errors raised while saving a formset
#[derive(Debug, thiserror::Error)]
pub enum FormSetError {
	#[error("The {model} could not be {action} because the data didn't validate.")]
	InvalidData { model: String, action: String },
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Model(#[from] ModelError),
	#[error("save() prohibited to prevent data loss due to unsaved related object '{parent}'.")]
	UnsavedParent { parent: String },
	#[error("Expected {expected} record(s) to save related data for, got {actual}.")]
	RelatedMismatch { expected: usize, actual: usize },
	#[error("Related data cannot be saved for an unsaved {model}.")]
	UnsavedRecord { model: String },
}

pub type FormSetResult<T> = Result<T, FormSetError>;
