use crate::field::{FormField, Widget};
use serde_json::Value;

/// BoundField represents a field bound to form data
pub struct BoundField<'a> {
	field: &'a dyn FormField,
	data: Option<&'a Value>,
	initial: Option<&'a Value>,
	errors: &'a [String],
	prefix: &'a str,
}

impl<'a> BoundField<'a> {
	/// Bind `field` to its submitted and initial values
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{BoundField, CharField, FormField};
	///
	/// let field: Box<dyn FormField> = Box::new(CharField::new("name".to_string()));
	/// let data = serde_json::json!("John");
	///
	/// let bound = BoundField::new(field.as_ref(), Some(&data), None, &[], "form-0");
	/// assert_eq!(bound.name(), "name");
	/// assert_eq!(bound.value(), Some(&data));
	/// ```
	pub fn new(
		field: &'a dyn FormField,
		data: Option<&'a Value>,
		initial: Option<&'a Value>,
		errors: &'a [String],
		prefix: &'a str,
	) -> Self {
		Self {
			field,
			data,
			initial,
			errors,
			prefix,
		}
	}
	pub fn name(&self) -> &str {
		self.field.name()
	}
	/// Get the HTML name attribute (with prefix)
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{BoundField, CharField, FormField};
	///
	/// let field: Box<dyn FormField> = Box::new(CharField::new("title".to_string()));
	///
	/// let bound = BoundField::new(field.as_ref(), None, None, &[], "");
	/// assert_eq!(bound.html_name(), "title");
	///
	/// let bound_prefixed = BoundField::new(field.as_ref(), None, None, &[], "book_set-2");
	/// assert_eq!(bound_prefixed.html_name(), "book_set-2-title");
	/// ```
	pub fn html_name(&self) -> String {
		if self.prefix.is_empty() {
			self.field.name().to_string()
		} else {
			format!("{}-{}", self.prefix, self.field.name())
		}
	}
	/// Get the HTML id attribute
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{BoundField, CharField, FormField};
	///
	/// let field: Box<dyn FormField> = Box::new(CharField::new("name".to_string()));
	/// let bound = BoundField::new(field.as_ref(), None, None, &[], "form-0");
	///
	/// assert_eq!(bound.id_for_label(), "id_form-0-name");
	/// ```
	pub fn id_for_label(&self) -> String {
		format!("id_{}", self.html_name())
	}
	pub fn label(&self) -> Option<&str> {
		self.field.label()
	}
	/// Submitted value, falling back to the initial value
	pub fn value(&self) -> Option<&Value> {
		self.data.or(self.initial)
	}
	pub fn errors(&self) -> &[String] {
		self.errors
	}
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}
	pub fn is_hidden(&self) -> bool {
		self.field.widget().is_hidden()
	}
	pub fn widget(&self) -> &Widget {
		self.field.widget()
	}
}
