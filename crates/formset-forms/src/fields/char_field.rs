//! Character field for text input

use crate::field::{FieldError, FieldResult, FormField, Widget, scalar_text};
use serde_json::Value;

/// Character field with length validation
#[derive(Debug, Clone)]
pub struct CharField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub max_length: Option<usize>,
	pub min_length: Option<usize>,
	pub strip: bool,
}

impl CharField {
	/// Create a new CharField with the given name
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::CharField;
	///
	/// let field = CharField::new("slug".to_string());
	/// assert_eq!(field.name, "slug");
	/// assert!(!field.required);
	/// assert_eq!(field.max_length, None);
	/// ```
	pub fn new(name: String) -> Self {
		Self {
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::TextInput,
			initial: None,
			max_length: None,
			min_length: None,
			strip: true,
		}
	}
	/// Set the field as required
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::CharField;
	///
	/// let field = CharField::new("name".to_string()).required();
	/// assert!(field.required);
	/// ```
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
	/// Set the maximum length for the field
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::CharField;
	///
	/// let field = CharField::new("name".to_string()).with_max_length(100);
	/// assert_eq!(field.max_length, Some(100));
	/// ```
	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}
	pub fn with_min_length(mut self, min_length: usize) -> Self {
		self.min_length = Some(min_length);
		self
	}
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
	pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
		self.initial = Some(Value::String(initial.into()));
		self
	}
	/// Disable whitespace stripping for the field
	pub fn no_strip(mut self) -> Self {
		self.strip = false;
		self
	}
}

impl FormField for CharField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn required(&self) -> bool {
		self.required
	}

	fn help_text(&self) -> Option<&str> {
		self.help_text.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn initial(&self) -> Option<&Value> {
		self.initial.as_ref()
	}

	fn clean(&self, value: Option<&Value>) -> FieldResult<Value> {
		let text = match value {
			None | Some(Value::Null) => String::new(),
			Some(Value::String(s)) if !self.strip => s.clone(),
			Some(v) => scalar_text(v)
				.ok_or_else(|| FieldError::Invalid("Enter a valid value.".to_string()))?,
		};

		if text.is_empty() {
			if self.required {
				return Err(FieldError::required(None));
			}
			return Ok(Value::String(String::new()));
		}

		// Lengths count characters, not bytes
		let char_count = text.chars().count();
		if let Some(max_length) = self.max_length
			&& char_count > max_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at most {} characters (it has {}).",
				max_length, char_count
			)));
		}

		if let Some(min_length) = self.min_length
			&& char_count < min_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at least {} characters (it has {}).",
				min_length, char_count
			)));
		}

		Ok(Value::String(text))
	}
}
