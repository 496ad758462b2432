//! ModelChoiceField and ModelMultipleChoiceField for record selection

use crate::field::{
	FieldError, FieldResult, FormField, INVALID_CHOICE_MESSAGE, Widget, is_empty_value, scalar_text,
};
use formset_db::{Model, value_key};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// One selectable record: its key and display label
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
	pub value: Value,
	pub label: String,
}

impl Choice {
	pub fn new(value: Value, label: impl Into<String>) -> Self {
		Self {
			value,
			label: label.into(),
		}
	}

	/// Choices for every record in `queryset`, in order
	///
	/// Records without a key are skipped.
	pub fn from_queryset<T: Model>(queryset: &[T]) -> Vec<Choice> {
		queryset
			.iter()
			.filter_map(|record| {
				record
					.primary_key()
					.map(|pk| Choice::new(pk, record.to_choice_label()))
			})
			.collect()
	}
}

pub type Choices = Arc<Vec<Choice>>;

fn find_choice<'a>(choices: &'a [Choice], key: &str) -> Option<&'a Choice> {
	choices
		.iter()
		.find(|c| value_key(&c.value).as_deref() == Some(key))
}

/// Turn free-form submitted text into a key value: integers become numbers
fn loose_key(text: String) -> Value {
	match text.parse::<i64>() {
		Ok(n) => Value::from(n),
		Err(_) => Value::String(text),
	}
}

fn select_choices(choices: Option<&Choices>) -> Vec<(String, String)> {
	choices
		.map(|choices| {
			choices
				.iter()
				.map(|c| (value_key(&c.value).unwrap_or_default(), c.label.clone()))
				.collect()
		})
		.unwrap_or_default()
}

/// A field for selecting a single record
///
/// With `choices` set, the submitted key must match one of them and the
/// cleaned value is that choice's key. Without choices any scalar key is
/// accepted.
pub struct ModelChoiceField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub error_messages: HashMap<String, String>,
	pub widget: Widget,
	pub help_text: String,
	pub initial: Option<Value>,
	pub choices: Option<Choices>,
}

impl ModelChoiceField {
	/// Create a new ModelChoiceField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::{Choice, ModelChoiceField};
	/// use formset_forms::FormField;
	/// use serde_json::json;
	/// use std::sync::Arc;
	///
	/// let choices = Arc::new(vec![Choice::new(json!(1), "Poe"), Choice::new(json!(2), "Baudelaire")]);
	/// let field = ModelChoiceField::new("author", Some(choices));
	///
	/// assert!(FormField::required(&field));
	/// assert_eq!(field.clean(Some(&json!("2"))).unwrap(), json!(2));
	/// assert!(field.clean(Some(&json!("3"))).is_err());
	/// ```
	pub fn new(name: impl Into<String>, choices: Option<Choices>) -> Self {
		let mut error_messages = HashMap::new();
		error_messages.insert("required".to_string(), "This field is required.".to_string());
		error_messages.insert("invalid_choice".to_string(), INVALID_CHOICE_MESSAGE.to_string());

		Self {
			name: name.into(),
			label: None,
			required: true,
			error_messages,
			widget: Widget::Select {
				choices: select_choices(choices.as_ref()),
			},
			help_text: String::new(),
			initial: None,
			choices,
		}
	}
	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}
	pub fn hidden(mut self) -> Self {
		self.widget = Widget::HiddenInput;
		self
	}
	pub fn initial(mut self, value: Value) -> Self {
		self.initial = Some(value);
		self
	}
	pub fn error_message(
		mut self,
		error_type: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		self.error_messages
			.insert(error_type.into(), message.into());
		self
	}

	fn message(&self, key: &str, fallback: &str) -> String {
		self.error_messages
			.get(key)
			.cloned()
			.unwrap_or_else(|| fallback.to_string())
	}
}

impl FormField for ModelChoiceField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn required(&self) -> bool {
		self.required
	}

	fn initial(&self) -> Option<&Value> {
		self.initial.as_ref()
	}

	fn help_text(&self) -> Option<&str> {
		if self.help_text.is_empty() {
			None
		} else {
			Some(&self.help_text)
		}
	}

	fn clean(&self, value: Option<&Value>) -> FieldResult<Value> {
		if is_empty_value(value) {
			if self.required {
				let message = self.message("required", "This field is required.");
				return Err(FieldError::required(Some(&message)));
			}
			return Ok(Value::Null);
		}

		let invalid = || FieldError::Validation(self.message("invalid_choice", INVALID_CHOICE_MESSAGE));
		let key = value.and_then(scalar_text).ok_or_else(invalid)?;

		match &self.choices {
			Some(choices) => find_choice(choices, &key)
				.map(|choice| choice.value.clone())
				.ok_or_else(invalid),
			None => Ok(loose_key(key)),
		}
	}
}

/// A field for selecting several records
pub struct ModelMultipleChoiceField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub widget: Widget,
	pub help_text: String,
	pub initial: Option<Value>,
	pub choices: Option<Choices>,
}

impl ModelMultipleChoiceField {
	/// Create a new ModelMultipleChoiceField
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::{Choice, ModelMultipleChoiceField};
	/// use formset_forms::FormField;
	/// use serde_json::json;
	/// use std::sync::Arc;
	///
	/// let choices = Arc::new(vec![Choice::new(json!(1), "Poe"), Choice::new(json!(2), "Baudelaire")]);
	/// let field = ModelMultipleChoiceField::new("authors", Some(choices));
	///
	/// assert_eq!(field.clean(Some(&json!(["1", "2"]))).unwrap(), json!([1, 2]));
	/// ```
	pub fn new(name: impl Into<String>, choices: Option<Choices>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: true,
			widget: Widget::SelectMultiple {
				choices: select_choices(choices.as_ref()),
			},
			help_text: String::new(),
			initial: None,
			choices,
		}
	}
	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	fn keys(value: Option<&Value>) -> Option<Vec<String>> {
		match value {
			None | Some(Value::Null) => Some(Vec::new()),
			Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
			Some(other) => scalar_text(other).map(|s| {
				if s.is_empty() { Vec::new() } else { vec![s] }
			}),
		}
	}
}

impl FormField for ModelMultipleChoiceField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn required(&self) -> bool {
		self.required
	}

	fn initial(&self) -> Option<&Value> {
		self.initial.as_ref()
	}

	fn help_text(&self) -> Option<&str> {
		if self.help_text.is_empty() {
			None
		} else {
			Some(&self.help_text)
		}
	}

	fn clean(&self, value: Option<&Value>) -> FieldResult<Value> {
		let keys = Self::keys(value)
			.ok_or_else(|| FieldError::Invalid("Enter a list of values.".to_string()))?;
		if keys.is_empty() {
			if self.required {
				return Err(FieldError::required(None));
			}
			return Ok(Value::Array(Vec::new()));
		}

		let mut cleaned = Vec::with_capacity(keys.len());
		for key in keys {
			let value = match &self.choices {
				Some(choices) => find_choice(choices, &key)
					.map(|choice| choice.value.clone())
					.ok_or_else(|| {
						FieldError::Validation(format!(
							"Select a valid choice. {} is not one of the available choices.",
							key
						))
					})?,
				None => loose_key(key),
			};
			cleaned.push(value);
		}
		Ok(Value::Array(cleaned))
	}

	fn has_changed(&self, initial: Option<&Value>, data: Option<&Value>) -> bool {
		let as_set = |v: Option<&Value>| -> BTreeSet<String> {
			Self::keys(v).unwrap_or_default().into_iter().collect()
		};
		as_set(initial) != as_set(data)
	}
}
