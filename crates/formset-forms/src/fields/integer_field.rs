//! Integer field

use crate::field::{FieldError, FieldResult, FormField, Widget, is_empty_value};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct IntegerField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub min_value: Option<i64>,
	pub max_value: Option<i64>,
}

impl IntegerField {
	/// Create a new IntegerField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::IntegerField;
	/// use formset_forms::FormField;
	/// use serde_json::json;
	///
	/// let field = IntegerField::new("quantity".to_string());
	/// assert_eq!(field.clean(Some(&json!("7"))).unwrap(), json!(7));
	/// ```
	pub fn new(name: String) -> Self {
		Self {
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::NumberInput,
			initial: None,
			min_value: None,
			max_value: None,
		}
	}
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
	pub fn with_min_value(mut self, min_value: i64) -> Self {
		self.min_value = Some(min_value);
		self
	}
	pub fn with_max_value(mut self, max_value: i64) -> Self {
		self.max_value = Some(max_value);
		self
	}

	fn to_integer(value: &Value) -> Option<i64> {
		match value {
			Value::Number(n) => n
				.as_i64()
				.or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
			Value::String(s) => s.trim().parse::<i64>().ok(),
			_ => None,
		}
	}
}

impl FormField for IntegerField {
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
		if is_empty_value(value) {
			if self.required {
				return Err(FieldError::required(None));
			}
			return Ok(Value::Null);
		}

		let number = value
			.and_then(Self::to_integer)
			.ok_or_else(|| FieldError::Invalid("Enter a whole number.".to_string()))?;

		if let Some(min) = self.min_value
			&& number < min
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is greater than or equal to {}.",
				min
			)));
		}
		if let Some(max) = self.max_value
			&& number > max
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is less than or equal to {}.",
				max
			)));
		}

		Ok(Value::from(number))
	}

	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		let parse = |v: Option<&Value>| v.and_then(Self::to_integer);
		match (parse(initial), parse(data)) {
			(Some(a), Some(b)) => a != b,
			(None, None) => is_empty_value(initial) != is_empty_value(data),
			_ => true,
		}
	}
}
