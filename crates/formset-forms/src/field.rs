//! Field trait, widgets and field errors

use formset_db::value_key;
use serde_json::Value;

/// Message used for missing required values
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Message used when a submitted key matches none of the available records
pub const INVALID_CHOICE_MESSAGE: &str =
	"Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	#[error("{0}")]
	Required(String),
	#[error("{0}")]
	Invalid(String),
	#[error("{0}")]
	Validation(String),
}

impl FieldError {
	/// Required-value error with an optional custom message
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::FieldError;
	///
	/// assert_eq!(FieldError::required(None).to_string(), "This field is required.");
	/// assert_eq!(FieldError::required(Some("Name me.")).to_string(), "Name me.");
	/// ```
	pub fn required(message: Option<&str>) -> Self {
		FieldError::Required(message.unwrap_or(REQUIRED_MESSAGE).to_string())
	}
}

pub type FieldResult<T> = Result<T, FieldError>;

/// Widget a field renders with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
	TextInput,
	NumberInput,
	DateInput,
	CheckboxInput,
	TextArea,
	HiddenInput,
	Select { choices: Vec<(String, String)> },
	SelectMultiple { choices: Vec<(String, String)> },
}

impl Widget {
	pub fn is_hidden(&self) -> bool {
		matches!(self, Widget::HiddenInput)
	}
}

/// A single input of a form
pub trait FormField: Send + Sync {
	fn name(&self) -> &str;
	fn label(&self) -> Option<&str>;
	fn required(&self) -> bool;
	fn help_text(&self) -> Option<&str>;
	fn widget(&self) -> &Widget;
	fn initial(&self) -> Option<&Value>;

	/// Validate and normalise a submitted value
	fn clean(&self, value: Option<&Value>) -> FieldResult<Value>;

	/// Whether `data` differs from `initial`
	///
	/// Missing values, `null` and the empty string all count as empty.
	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		initial.and_then(value_key) != data.and_then(value_key)
	}
}

/// Whether a submitted value is empty: missing, `null`, blank string or empty list
pub fn is_empty_value(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => true,
		Some(Value::String(s)) => s.trim().is_empty(),
		Some(Value::Array(items)) => items.is_empty(),
		Some(_) => false,
	}
}

/// Render a scalar value as submitted text
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.trim().to_string()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}
