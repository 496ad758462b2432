//! Fixed-point decimal field
//!
//! Decimals are validated and normalised on their textual form, never through
//! a float, so `"1.10"` keeps both of its places.

use crate::field::{FieldError, FieldResult, FormField, Widget, is_empty_value, scalar_text};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

// Optional sign, integer digits, optional fraction. One side of the point may be empty.
static DECIMAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<sign>[+-]?)(?P<int>\d*)(?:\.(?P<frac>\d*))?$")
		.expect("DECIMAL_PATTERN: invalid regex pattern")
});

#[derive(Debug, Clone)]
pub struct DecimalField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub initial: Option<Value>,
	pub max_digits: Option<usize>,
	pub decimal_places: Option<usize>,
}

impl DecimalField {
	/// Create a new DecimalField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::DecimalField;
	/// use formset_forms::FormField;
	/// use serde_json::json;
	///
	/// let field = DecimalField::new("price".to_string()).with_precision(10, 2);
	/// assert_eq!(field.clean(Some(&json!("1"))).unwrap(), json!("1.00"));
	/// assert!(field.clean(Some(&json!("1.005"))).is_err());
	/// ```
	pub fn new(name: String) -> Self {
		Self {
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::NumberInput,
			initial: None,
			max_digits: None,
			decimal_places: None,
		}
	}
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
	pub fn with_precision(mut self, max_digits: usize, decimal_places: usize) -> Self {
		self.max_digits = Some(max_digits);
		self.decimal_places = Some(decimal_places);
		self
	}

	/// Validate `s` and return its canonical text
	fn normalize(&self, s: &str) -> Result<String, String> {
		let captures = DECIMAL_PATTERN
			.captures(s)
			.ok_or_else(|| "Enter a number.".to_string())?;
		let sign = captures.name("sign").map_or("", |m| m.as_str());
		let int = captures.name("int").map_or("", |m| m.as_str());
		let frac = captures.name("frac").map_or("", |m| m.as_str());
		if int.is_empty() && frac.is_empty() {
			return Err("Enter a number.".to_string());
		}

		let int = int.trim_start_matches('0');
		let int = if int.is_empty() { "0" } else { int };
		let significant_frac = frac.trim_end_matches('0');

		if let Some(decimal_places) = self.decimal_places
			&& significant_frac.len() > decimal_places
		{
			return Err(format!(
				"Ensure that there are no more than {} decimal places.",
				decimal_places
			));
		}

		let int_digits = if int == "0" { 0 } else { int.len() };
		if let Some(max_digits) = self.max_digits
			&& int_digits + significant_frac.len() > max_digits
		{
			return Err(format!(
				"Ensure that there are no more than {} digits in total.",
				max_digits
			));
		}

		let frac = match self.decimal_places {
			Some(places) => format!("{:0<width$}", significant_frac, width = places),
			None => significant_frac.to_string(),
		};
		let is_zero = int == "0" && frac.chars().all(|c| c == '0');
		let sign = if sign == "-" && !is_zero { "-" } else { "" };
		if frac.is_empty() {
			Ok(format!("{sign}{int}"))
		} else {
			Ok(format!("{sign}{int}.{frac}"))
		}
	}
}

impl FormField for DecimalField {
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
		let text = value
			.and_then(scalar_text)
			.ok_or_else(|| FieldError::Invalid("Enter a number.".to_string()))?;
		let normalized = self.normalize(&text).map_err(FieldError::Validation)?;
		Ok(Value::String(normalized))
	}

	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		let canonical = |v: Option<&Value>| {
			v.filter(|v| !is_empty_value(Some(*v)))
				.and_then(scalar_text)
				.map(|text| self.normalize(&text).unwrap_or(text))
		};
		canonical(initial) != canonical(data)
	}
}
