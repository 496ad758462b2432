//! Hidden foreign key pinned to the parent record of an inline formset

use crate::field::{FieldResult, FormField, Widget};
use serde_json::Value;

/// Hidden field whose cleaned value is always the parent's key
///
/// Whatever the client submits for the foreign key is ignored: children of an
/// inline formset can only ever point at the formset's parent.
#[derive(Debug, Clone)]
pub struct InlineForeignKeyField {
	pub name: String,
	pub parent_key: Option<Value>,
	widget: Widget,
}

impl InlineForeignKeyField {
	/// # Examples
	///
	/// ```
	/// use formset_forms::fields::InlineForeignKeyField;
	/// use formset_forms::FormField;
	/// use serde_json::json;
	///
	/// let field = InlineForeignKeyField::new("poet", Some(json!(1)));
	/// assert_eq!(field.clean(Some(&json!("2"))).unwrap(), json!(1));
	/// assert!(!field.has_changed(Some(&json!(1)), Some(&json!("2"))));
	/// ```
	pub fn new(name: impl Into<String>, parent_key: Option<Value>) -> Self {
		Self {
			name: name.into(),
			parent_key,
			widget: Widget::HiddenInput,
		}
	}
}

impl FormField for InlineForeignKeyField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		None
	}

	fn required(&self) -> bool {
		false
	}

	fn help_text(&self) -> Option<&str> {
		None
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn initial(&self) -> Option<&Value> {
		self.parent_key.as_ref()
	}

	fn clean(&self, _value: Option<&Value>) -> FieldResult<Value> {
		Ok(self.parent_key.clone().unwrap_or(Value::Null))
	}

	fn has_changed(&self, _initial: Option<&Value>, _data: Option<&Value>) -> bool {
		false
	}
}
