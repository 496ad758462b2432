//! Checkbox field

use crate::field::{FieldError, FieldResult, FormField, Widget};
use serde_json::Value;

/// Boolean field with checkbox semantics
///
/// An unchecked box is simply absent from the submitted data, so a missing
/// value cleans to `false`. A required boolean field must be checked.
#[derive(Debug, Clone)]
pub struct BooleanField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
}

impl BooleanField {
	/// Create a new BooleanField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::BooleanField;
	/// use formset_forms::FormField;
	/// use serde_json::json;
	///
	/// let field = BooleanField::new("DELETE".to_string());
	/// assert_eq!(field.clean(Some(&json!("on"))).unwrap(), json!(true));
	/// assert_eq!(field.clean(None).unwrap(), json!(false));
	/// ```
	pub fn new(name: String) -> Self {
		Self {
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::CheckboxInput,
			initial: None,
		}
	}
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// Checkbox truthiness of a submitted value
///
/// # Examples
///
/// ```
/// use formset_forms::fields::boolean_field::is_checked;
/// use serde_json::json;
///
/// assert!(is_checked(Some(&json!("on"))));
/// assert!(!is_checked(Some(&json!("false"))));
/// assert!(!is_checked(None));
/// ```
pub fn is_checked(value: Option<&Value>) -> bool {
	match value {
		Some(Value::Bool(b)) => *b,
		Some(Value::String(s)) => !matches!(
			s.trim().to_ascii_lowercase().as_str(),
			"" | "false" | "0" | "off"
		),
		Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
		_ => false,
	}
}

impl FormField for BooleanField {
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
		let checked = is_checked(value);
		if !checked && self.required {
			return Err(FieldError::required(None));
		}
		Ok(Value::Bool(checked))
	}

	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		is_checked(initial) != is_checked(data)
	}
}
