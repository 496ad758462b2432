use crate::bound_field::BoundField;
use crate::field::{FieldError, FormField};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Submitted key-value data, keyed by prefixed field names
pub type FormData = HashMap<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	#[error("Field error in {field}: {error}")]
	Field { field: String, error: FieldError },
	#[error("Validation error: {0}")]
	Validation(String),
}

pub type FormResult<T> = Result<T, FormError>;

/// Form-level clean hook; may rewrite cleaned data or reject the form
pub type CleanFunction = Arc<dyn Fn(&mut HashMap<String, Value>) -> FormResult<()> + Send + Sync>;

/// Special key for form-level (non-field-specific) errors.
pub const ALL_FIELDS_KEY: &str = "_all";

/// A set of fields bound to submitted data
pub struct Form {
	fields: Vec<Box<dyn FormField>>,
	data: FormData,
	initial: HashMap<String, Value>,
	cleaned_data: HashMap<String, Value>,
	errors: HashMap<String, Vec<String>>,
	is_bound: bool,
	cleaned: bool,
	empty_permitted: bool,
	clean_functions: Vec<CleanFunction>,
	prefix: String,
}

impl Form {
	/// Create a new empty form
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::Form;
	///
	/// let form = Form::new();
	/// assert!(!form.is_bound());
	/// assert!(form.fields().is_empty());
	/// ```
	pub fn new() -> Self {
		Self::with_prefix(String::new())
	}
	/// Create a new form with initial data
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::Form;
	/// use std::collections::HashMap;
	/// use serde_json::json;
	///
	/// let mut initial = HashMap::new();
	/// initial.insert("name".to_string(), json!("John"));
	///
	/// let form = Form::with_initial(initial);
	/// assert_eq!(form.initial().get("name"), Some(&json!("John")));
	/// ```
	pub fn with_initial(initial: HashMap<String, Value>) -> Self {
		let mut form = Self::new();
		form.initial = initial;
		form
	}
	/// Create a new form with a field prefix
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::Form;
	///
	/// let form = Form::with_prefix("form-0".to_string());
	/// assert_eq!(form.prefix(), "form-0");
	/// assert_eq!(form.add_prefix_to_field_name("title"), "form-0-title");
	/// ```
	pub fn with_prefix(prefix: String) -> Self {
		Self {
			fields: vec![],
			data: HashMap::new(),
			initial: HashMap::new(),
			cleaned_data: HashMap::new(),
			errors: HashMap::new(),
			is_bound: false,
			cleaned: false,
			empty_permitted: false,
			clean_functions: vec![],
			prefix,
		}
	}
	/// Add a field to the form
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{Form, CharField};
	///
	/// let mut form = Form::new();
	/// form.add_field(Box::new(CharField::new("username".to_string())));
	/// assert_eq!(form.fields().len(), 1);
	/// ```
	pub fn add_field(&mut self, field: Box<dyn FormField>) {
		self.fields.push(field);
		self.cleaned = false;
	}
	/// Bind form data for validation
	///
	/// Data is keyed by prefixed names, so a form with prefix `form-0` reads
	/// its `title` field from `form-0-title`.
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::Form;
	/// use std::collections::HashMap;
	/// use serde_json::json;
	///
	/// let mut form = Form::new();
	/// let mut data = HashMap::new();
	/// data.insert("username".to_string(), json!("john"));
	///
	/// form.bind(data);
	/// assert!(form.is_bound());
	/// ```
	pub fn bind(&mut self, data: FormData) {
		self.data = data;
		self.is_bound = true;
		self.cleaned = false;
	}
	/// Allow an unchanged form to be valid without any validation
	pub fn set_empty_permitted(&mut self, empty_permitted: bool) {
		self.empty_permitted = empty_permitted;
		self.cleaned = false;
	}
	pub fn empty_permitted(&self) -> bool {
		self.empty_permitted
	}
	/// Validate the form and return true if all fields are valid
	///
	/// Validation runs once; later calls reuse the result until the form is
	/// re-bound.
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{Form, CharField};
	/// use std::collections::HashMap;
	/// use serde_json::json;
	///
	/// let mut form = Form::new();
	/// form.add_field(Box::new(CharField::new("username".to_string())));
	///
	/// let mut data = HashMap::new();
	/// data.insert("username".to_string(), json!("john"));
	/// form.bind(data);
	///
	/// assert!(form.is_valid());
	/// assert!(form.errors().is_empty());
	/// assert_eq!(form.cleaned_data().get("username"), Some(&json!("john")));
	/// ```
	pub fn is_valid(&mut self) -> bool {
		if !self.is_bound {
			return false;
		}
		if !self.cleaned {
			self.full_clean();
		}
		self.errors.is_empty()
	}
	/// Run field cleaning and clean hooks, replacing previous results
	pub fn full_clean(&mut self) {
		self.errors.clear();
		self.cleaned_data.clear();
		self.cleaned = true;

		if !self.is_bound {
			return;
		}
		if self.empty_permitted && !self.has_changed() {
			return;
		}

		for field in &self.fields {
			let key = self.add_prefix_to_field_name(field.name());
			match field.clean(self.data.get(&key)) {
				Ok(cleaned) => {
					self.cleaned_data.insert(field.name().to_string(), cleaned);
				}
				Err(e) => {
					self.errors
						.entry(field.name().to_string())
						.or_default()
						.push(e.to_string());
				}
			}
		}

		// Run custom clean functions
		for clean_fn in &self.clean_functions {
			if let Err(e) = clean_fn(&mut self.cleaned_data) {
				match e {
					FormError::Field { field, error } => {
						self.cleaned_data.remove(&field);
						self.errors
							.entry(field)
							.or_default()
							.push(error.to_string());
					}
					FormError::Validation(msg) => {
						self.errors
							.entry(ALL_FIELDS_KEY.to_string())
							.or_default()
							.push(msg);
					}
				}
			}
		}
	}
	/// True once validation has run for the current data
	pub fn is_cleaned(&self) -> bool {
		self.cleaned
	}
	pub fn cleaned_data(&self) -> &HashMap<String, Value> {
		&self.cleaned_data
	}
	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		&self.errors
	}
	/// Errors not tied to a single field
	pub fn non_field_errors(&self) -> &[String] {
		self.errors
			.get(ALL_FIELDS_KEY)
			.map(|e| e.as_slice())
			.unwrap_or(&[])
	}
	/// Record an error after validation; `None` targets the whole form
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{Form, CharField};
	/// use std::collections::HashMap;
	/// use serde_json::json;
	///
	/// let mut form = Form::new();
	/// form.add_field(Box::new(CharField::new("slug".to_string())));
	/// form.bind(HashMap::from([("slug".to_string(), json!("car-red"))]));
	/// assert!(form.is_valid());
	///
	/// form.add_error(Some("slug"), "Already taken.");
	/// assert!(!form.is_valid());
	/// assert!(form.cleaned_data().get("slug").is_none());
	/// ```
	pub fn add_error(&mut self, field: Option<&str>, message: impl Into<String>) {
		let key = field.unwrap_or(ALL_FIELDS_KEY);
		if let Some(name) = field {
			self.cleaned_data.remove(name);
		}
		self.errors
			.entry(key.to_string())
			.or_default()
			.push(message.into());
	}
	pub fn is_bound(&self) -> bool {
		self.is_bound
	}
	pub fn fields(&self) -> &[Box<dyn FormField>] {
		&self.fields
	}
	pub fn data(&self) -> &FormData {
		&self.data
	}
	pub fn initial(&self) -> &HashMap<String, Value> {
		&self.initial
	}
	/// Set initial data for the form
	pub fn set_initial(&mut self, initial: HashMap<String, Value>) {
		self.initial = initial;
	}
	pub fn set_initial_value(&mut self, name: impl Into<String>, value: Value) {
		self.initial.insert(name.into(), value);
	}
	/// Initial value of a field: the form's initial data, then the field's own
	pub fn initial_for(&self, name: &str) -> Option<&Value> {
		self.initial
			.get(name)
			.or_else(|| self.get_field(name).and_then(|f| f.initial()))
	}
	/// Submitted value of a field, looked up under its prefixed name
	pub fn data_for(&self, name: &str) -> Option<&Value> {
		self.data.get(&self.add_prefix_to_field_name(name))
	}
	/// Check if any field has changed from its initial value
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{Form, CharField};
	/// use std::collections::HashMap;
	/// use serde_json::json;
	///
	/// let mut initial = HashMap::new();
	/// initial.insert("name".to_string(), json!("John"));
	///
	/// let mut form = Form::with_initial(initial);
	/// form.add_field(Box::new(CharField::new("name".to_string())));
	///
	/// let mut data = HashMap::new();
	/// data.insert("name".to_string(), json!("Jane"));
	/// form.bind(data);
	///
	/// assert!(form.has_changed());
	/// assert_eq!(form.changed_data(), vec!["name".to_string()]);
	/// ```
	pub fn has_changed(&self) -> bool {
		!self.changed_data().is_empty()
	}
	/// Names of the fields whose submitted value differs from the initial one
	pub fn changed_data(&self) -> Vec<String> {
		if !self.is_bound {
			return Vec::new();
		}
		self.fields
			.iter()
			.filter(|field| {
				field.has_changed(self.initial_for(field.name()), self.data_for(field.name()))
			})
			.map(|field| field.name().to_string())
			.collect()
	}
	pub fn get_field(&self, name: &str) -> Option<&dyn FormField> {
		self.fields
			.iter()
			.find(|f| f.name() == name)
			.map(|f| f.as_ref())
	}
	pub fn remove_field(&mut self, name: &str) -> Option<Box<dyn FormField>> {
		let pos = self.fields.iter().position(|f| f.name() == name)?;
		self.cleaned = false;
		Some(self.fields.remove(pos))
	}
	pub fn field_count(&self) -> usize {
		self.fields.len()
	}
	/// Add a custom clean function for form validation
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{Form, FormError};
	///
	/// let mut form = Form::new();
	/// form.add_clean_function(|data| {
	///     if data.get("password") != data.get("confirm_password") {
	///         Err(FormError::Validation("Passwords do not match".to_string()))
	///     } else {
	///         Ok(())
	///     }
	/// });
	/// ```
	pub fn add_clean_function<F>(&mut self, f: F)
	where
		F: Fn(&mut HashMap<String, Value>) -> FormResult<()> + Send + Sync + 'static,
	{
		self.add_shared_clean_function(Arc::new(f));
	}
	/// Add a clean function shared with other forms
	pub fn add_shared_clean_function(&mut self, f: CleanFunction) {
		self.clean_functions.push(f);
		self.cleaned = false;
	}
	pub fn prefix(&self) -> &str {
		&self.prefix
	}
	pub fn set_prefix(&mut self, prefix: String) {
		self.prefix = prefix;
	}
	pub fn add_prefix_to_field_name(&self, field_name: &str) -> String {
		if self.prefix.is_empty() {
			field_name.to_string()
		} else {
			format!("{}-{}", self.prefix, field_name)
		}
	}
	pub fn get_bound_field<'a>(&'a self, name: &str) -> Option<BoundField<'a>> {
		let field = self.get_field(name)?;
		let errors = self.errors.get(name).map(|e| e.as_slice()).unwrap_or(&[]);

		Some(BoundField::new(
			field,
			self.data_for(name),
			self.initial_for(name),
			errors,
			&self.prefix,
		))
	}
}

impl Default for Form {
	fn default() -> Self {
		Self::new()
	}
}
