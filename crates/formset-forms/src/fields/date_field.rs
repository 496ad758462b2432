//! Date field

use crate::field::{FieldError, FieldResult, FormField, Widget, is_empty_value};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Date field accepting ISO and common written formats
///
/// Cleaned values are ISO 8601 strings (`YYYY-MM-DD`).
#[derive(Debug, Clone)]
pub struct DateField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub input_formats: Vec<String>,
}

impl DateField {
	/// Create a new DateField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::DateField;
	/// use formset_forms::FormField;
	/// use serde_json::json;
	///
	/// let field = DateField::new("posted".to_string());
	/// assert_eq!(field.clean(Some(&json!("01/15/2008"))).unwrap(), json!("2008-01-15"));
	/// ```
	pub fn new(name: String) -> Self {
		Self {
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::DateInput,
			initial: None,
			input_formats: vec![
				"%Y-%m-%d".to_string(),  // 2008-01-15
				"%m/%d/%Y".to_string(),  // 01/15/2008
				"%b %d %Y".to_string(),  // Jan 15 2008
				"%b %d, %Y".to_string(), // Jan 15, 2008
				"%d %b %Y".to_string(),  // 15 Jan 2008
				"%B %d %Y".to_string(),  // January 15 2008
				"%B %d, %Y".to_string(), // January 15, 2008
				"%d %B %Y".to_string(),  // 15 January 2008
			],
		}
	}
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	fn parse_date(&self, s: &str) -> Option<NaiveDate> {
		self.input_formats
			.iter()
			.filter_map(|format| NaiveDate::parse_from_str(s, format).ok())
			// Two-digit years are ambiguous
			.find(|date| (1000..=9999).contains(&date.year()))
	}
}

impl FormField for DateField {
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

		let s = value
			.and_then(Value::as_str)
			.ok_or_else(|| FieldError::Invalid("Enter a valid date.".to_string()))?;
		let date = self
			.parse_date(s.trim())
			.ok_or_else(|| FieldError::Validation("Enter a valid date.".to_string()))?;

		Ok(Value::String(date.format("%Y-%m-%d").to_string()))
	}

	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		let parse = |v: Option<&Value>| v.and_then(Value::as_str).and_then(|s| self.parse_date(s.trim()));
		match (parse(initial), parse(data)) {
			(Some(a), Some(b)) => a != b,
			(None, None) => is_empty_value(initial) != is_empty_value(data),
			_ => true,
		}
	}
}
