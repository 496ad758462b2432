//! Forms generated from record metadata

use crate::field::{FormField, Widget};
use crate::fields::{
	BooleanField, CharField, Choices, DateField, DecimalField, IntegerField, ModelChoiceField,
	ModelMultipleChoiceField,
};
use crate::error::{FormSetError, FormSetResult};
use crate::form::Form;
use crate::messages;
use chrono::{Datelike, NaiveDate};
use formset_db::{
	DateScope, FieldKind, FieldMetadata, Lookup, Model, ModelError, ModelMetadata, Query,
	RecordStore, StoreResult, value_key,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-field presentation overrides for generated forms
#[derive(Debug, Clone, Default)]
pub struct ModelFormConfig {
	pub labels: HashMap<String, String>,
	pub help_texts: HashMap<String, String>,
	pub widgets: HashMap<String, Widget>,
	/// Error message overrides by field, then by error kind (`required`, `invalid_choice`)
	pub error_messages: HashMap<String, HashMap<String, String>>,
}

impl ModelFormConfig {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn with_label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
		self.labels.insert(field.into(), label.into());
		self
	}
	pub fn with_help_text(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
		self.help_texts.insert(field.into(), text.into());
		self
	}
	pub fn with_widget(mut self, field: impl Into<String>, widget: Widget) -> Self {
		self.widgets.insert(field.into(), widget);
		self
	}
	pub fn with_error_message(
		mut self,
		field: impl Into<String>,
		kind: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		self.error_messages
			.entry(field.into())
			.or_default()
			.insert(kind.into(), message.into());
		self
	}
}

/// Build the form field for a record field
///
/// Relations become choice fields over `choices`; `None` accepts any key.
/// A field is required unless it allows blank input.
///
/// # Examples
///
/// ```
/// use formset_db::{FieldKind, FieldMetadata};
/// use formset_forms::model_form::{ModelFormConfig, form_field_for};
///
/// let meta = FieldMetadata::new("birth_date", FieldKind::Date).blank(true);
/// let field = form_field_for(&meta, &ModelFormConfig::default(), None);
///
/// assert_eq!(field.name(), "birth_date");
/// assert_eq!(field.label(), Some("Birth date"));
/// assert!(!field.required());
/// ```
pub fn form_field_for(
	meta: &FieldMetadata,
	config: &ModelFormConfig,
	choices: Option<Choices>,
) -> Box<dyn FormField> {
	let name = meta.name.clone();
	let label = config
		.labels
		.get(&name)
		.cloned()
		.unwrap_or_else(|| meta.label());
	let help_text = config.help_texts.get(&name).cloned();
	let required = !meta.blank;
	let initial = meta.default.clone();
	let widget = config.widgets.get(&name).cloned();

	macro_rules! configure {
		($field:expr) => {{
			let mut field = $field;
			field.label = Some(label);
			field.help_text = help_text;
			field.required = required;
			field.initial = initial;
			if let Some(widget) = widget {
				field.widget = widget;
			}
			Box::new(field)
		}};
	}

	match &meta.kind {
		FieldKind::Char { max_length } => {
			let mut field = CharField::new(name);
			field.max_length = *max_length;
			configure!(field)
		}
		FieldKind::Integer => configure!(IntegerField::new(name)),
		FieldKind::Decimal {
			max_digits,
			decimal_places,
		} => {
			let mut field = DecimalField::new(name);
			field.max_digits = *max_digits;
			field.decimal_places = *decimal_places;
			configure!(field)
		}
		FieldKind::Boolean => {
			let mut field = BooleanField::new(name);
			field.label = Some(label);
			field.help_text = help_text;
			field.initial = initial;
			if let Some(widget) = widget {
				field.widget = widget;
			}
			// An unchecked box is a legitimate value
			field.required = false;
			Box::new(field)
		}
		FieldKind::Date => configure!(DateField::new(name)),
		FieldKind::ForeignKey { .. } => {
			let mut field = ModelChoiceField::new(name, choices).required(required);
			field.label = Some(label);
			field.help_text = help_text.unwrap_or_default();
			field.initial = initial;
			if let Some(widget) = widget {
				field.widget = widget;
			}
			if let Some(overrides) = config.error_messages.get(&meta.name) {
				for (kind, message) in overrides {
					field = field.error_message(kind.clone(), message.clone());
				}
			}
			Box::new(field)
		}
		FieldKind::ManyToMany { .. } => {
			let mut field = ModelMultipleChoiceField::new(name, choices).required(required);
			field.label = Some(label);
			field.help_text = help_text.unwrap_or_default();
			field.initial = initial;
			if let Some(widget) = widget {
				field.widget = widget;
			}
			Box::new(field)
		}
	}
}

/// A form over the fields of one record, optionally editing an existing one
pub struct ModelForm<M: Model> {
	form: Form,
	instance: Option<M>,
	metadata: Arc<ModelMetadata>,
	model_fields: Vec<String>,
}

impl<M: Model> ModelForm<M> {
	/// Create a form for `fields`, seeded from `instance` when editing
	///
	/// Relation fields draw their options from `choices`, keyed by field name.
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::model_form::{ModelForm, ModelFormConfig};
	/// use formset_test::fixtures::Author;
	/// use formset_db::Model;
	/// use std::collections::HashMap;
	/// use std::sync::Arc;
	///
	/// let author = Author::new(1, "Charles Baudelaire");
	/// let form = ModelForm::new(
	///     Arc::new(Author::metadata()),
	///     &ModelFormConfig::default(),
	///     &["name".to_string()],
	///     Some(author),
	///     &HashMap::new(),
	///     "form-0".to_string(),
	/// );
	///
	/// assert_eq!(form.form().initial_for("name"), Some(&serde_json::json!("Charles Baudelaire")));
	/// ```
	pub fn new(
		metadata: Arc<ModelMetadata>,
		config: &ModelFormConfig,
		fields: &[String],
		instance: Option<M>,
		choices: &HashMap<String, Choices>,
		prefix: String,
	) -> Self {
		let mut form = Form::with_prefix(prefix);
		for name in fields {
			let Some(meta) = metadata.field(name) else {
				continue;
			};
			form.add_field(form_field_for(meta, config, choices.get(name).cloned()));
			if let Some(record) = &instance {
				let value = if meta.is_many_to_many() {
					None
				} else {
					record.get_field(name)
				};
				if let Some(value) = value.filter(|v| !v.is_null()) {
					form.set_initial_value(name.clone(), value);
				}
			}
		}

		Self {
			form,
			instance,
			metadata,
			model_fields: fields.to_vec(),
		}
	}

	pub fn form(&self) -> &Form {
		&self.form
	}

	pub fn form_mut(&mut self) -> &mut Form {
		&mut self.form
	}

	pub fn instance(&self) -> Option<&M> {
		self.instance.as_ref()
	}

	pub fn set_instance(&mut self, instance: Option<M>) {
		self.instance = instance;
	}

	pub fn metadata(&self) -> &ModelMetadata {
		&self.metadata
	}

	/// Record fields this form writes back to its instance
	pub fn model_fields(&self) -> &[String] {
		&self.model_fields
	}

	/// Add a form field that maps onto a record field
	pub fn add_model_field(&mut self, field: Box<dyn FormField>) {
		let name = field.name().to_string();
		self.form.remove_field(&name);
		self.form.add_field(field);
		if !self.model_fields.contains(&name) {
			self.model_fields.push(name);
		}
	}

	/// True when editing a record that already has a key
	pub fn is_editing(&self) -> bool {
		self.instance
			.as_ref()
			.and_then(|record| record.primary_key())
			.is_some()
	}

	/// Apply cleaned values onto a copy of the instance (or a fresh record)
	///
	/// Auto keys and many-to-many fields are left alone; the latter are saved
	/// with [`save_related`](Self::save_related) once the record has a key.
	pub fn construct_instance(&self) -> Result<M, ModelError> {
		let mut record = self.instance.clone().unwrap_or_default();
		let cleaned = self.form.cleaned_data();
		for name in &self.model_fields {
			let Some(meta) = self.metadata.field(name) else {
				continue;
			};
			if meta.auto || meta.is_many_to_many() {
				continue;
			}
			if let Some(value) = cleaned.get(name) {
				record.set_field(name, value.clone())?;
			}
		}
		Ok(record)
	}

	/// Cleaned many-to-many selections, by field name
	pub fn related_values(&self) -> Vec<(String, Vec<Value>)> {
		let cleaned = self.form.cleaned_data();
		self.model_fields
			.iter()
			.filter(|name| {
				self.metadata
					.field(name)
					.is_some_and(|meta| meta.is_many_to_many())
			})
			.filter_map(|name| {
				let ids = match cleaned.get(name)? {
					Value::Array(ids) => ids.clone(),
					Value::Null => Vec::new(),
					other => vec![other.clone()],
				};
				Some((name.clone(), ids))
			})
			.collect()
	}

	/// Fields skipped by uniqueness checks: those not in the form or already in error
	fn validation_exclusions(&self) -> Vec<String> {
		let errors = self.form.errors();
		self.metadata
			.fields
			.iter()
			.map(|f| f.name.clone())
			.filter(|name| !self.model_fields.contains(name) || errors.contains_key(name))
			.collect()
	}

	/// Check unique, unique-together and date-scoped rules against stored records
	///
	/// Collisions are recorded as form errors: single-field ones on the field,
	/// unique-together ones on the whole form. The record being edited never
	/// collides with itself.
	pub fn validate_unique<S: RecordStore<M>>(&mut self, store: &S) -> StoreResult<()> {
		if !self.form.is_bound() || (self.form.empty_permitted() && !self.form.has_changed()) {
			return Ok(());
		}
		let candidate = match self.construct_instance() {
			Ok(record) => record,
			Err(e) => {
				self.form.add_error(None, e.to_string());
				return Ok(());
			}
		};
		let editing = self.is_editing();
		let own_key = if editing {
			candidate.primary_key()
		} else {
			None
		};
		let exclusions = self.validation_exclusions();
		let exclude: Vec<&str> = exclusions.iter().map(String::as_str).collect();

		for check in self.metadata.unique_checks(&exclude) {
			let mut query = Query::new();
			let mut complete = true;
			for name in &check {
				let value = candidate.get_field(name).unwrap_or(Value::Null);
				let is_key = self.metadata.field(name).is_some_and(|f| f.primary_key);
				if value_key(&value).is_none() || (is_key && editing) {
					complete = false;
					break;
				}
				query = query.filter(name.clone(), value);
			}
			if !complete {
				continue;
			}
			if let Some(pk) = &own_key {
				query = query.exclude_pk(pk.clone());
			}
			if store.exists(&query)? {
				let message = messages::unique_error(&self.metadata, &check);
				match check.as_slice() {
					[field] => self.form.add_error(Some(field), message),
					_ => self.form.add_error(None, message),
				}
			}
		}

		for check in self.metadata.date_checks(&exclude) {
			let Some(date) = candidate
				.get_field(&check.date_field)
				.and_then(|v| v.as_str().and_then(|s| s.parse::<NaiveDate>().ok()))
			else {
				continue;
			};
			let value = candidate.get_field(&check.field).unwrap_or(Value::Null);
			if value_key(&value).is_none() {
				continue;
			}
			let mut query = Query::new().filter(check.field.clone(), value);
			query = match check.scope {
				DateScope::Date => query
					.filter_lookup(check.date_field.clone(), Lookup::Year, date.year().into())
					.filter_lookup(check.date_field.clone(), Lookup::Month, date.month().into())
					.filter_lookup(check.date_field.clone(), Lookup::Day, date.day().into()),
				DateScope::Year => {
					query.filter_lookup(check.date_field.clone(), Lookup::Year, date.year().into())
				}
				DateScope::Month => query.filter_lookup(
					check.date_field.clone(),
					Lookup::Month,
					date.month().into(),
				),
			};
			if let Some(pk) = &own_key {
				query = query.exclude_pk(pk.clone());
			}
			if store.exists(&query)? {
				let message = messages::date_error(&self.metadata, &check);
				self.form.add_error(Some(&check.field), message);
			}
		}
		Ok(())
	}

	/// Clean the form and check uniqueness against `store`
	///
	/// Both steps run once per binding; uniqueness is checked even when some
	/// fields failed, skipping those fields.
	pub fn is_valid<S: RecordStore<M>>(&mut self, store: &S) -> StoreResult<bool> {
		if !self.form.is_bound() {
			return Ok(false);
		}
		if !self.form.is_cleaned() {
			self.form.full_clean();
			self.validate_unique(store)?;
		}
		Ok(self.form.errors().is_empty())
	}

	/// Write the cleaned record and its many-to-many data to `store`
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::{MemoryStore, Model};
	/// use formset_forms::model_form::{ModelForm, ModelFormConfig};
	/// use formset_test::fixtures::Author;
	/// use std::collections::HashMap;
	/// use std::sync::Arc;
	///
	/// let mut store = MemoryStore::<Author>::new();
	/// let mut form = ModelForm::<Author>::new(
	///     Arc::new(Author::metadata()),
	///     &ModelFormConfig::default(),
	///     &["name".to_string()],
	///     None,
	///     &HashMap::new(),
	///     String::new(),
	/// );
	/// form.form_mut().bind(HashMap::from([("name".to_string(), serde_json::json!("Paul Verlaine"))]));
	///
	/// assert!(form.is_valid(&store).unwrap());
	/// let saved = form.save(&mut store).unwrap();
	/// assert!(saved.primary_key().is_some());
	/// ```
	pub fn save<S: RecordStore<M>>(&mut self, store: &mut S) -> FormSetResult<M> {
		if !self.form.is_bound() || !self.form.errors().is_empty() {
			return Err(FormSetError::InvalidData {
				model: self.metadata.display_name(),
				action: if self.is_editing() { "changed" } else { "created" }.to_string(),
			});
		}
		let mut record = self.construct_instance()?;
		self.persist(store, &mut record)?;
		self.save_related(store, &record)?;
		Ok(record)
	}

	/// Insert or update `record` depending on whether this form edits one
	pub fn persist<S: RecordStore<M>>(&self, store: &mut S, record: &mut M) -> FormSetResult<()> {
		if self.is_editing() {
			store.update(record)?;
		} else {
			store.insert(record)?;
		}
		Ok(())
	}

	/// Replace the many-to-many selections of a saved `record`
	pub fn save_related<S: RecordStore<M>>(&self, store: &mut S, record: &M) -> FormSetResult<()> {
		let related = self.related_values();
		if related.is_empty() {
			return Ok(());
		}
		let pk = record
			.primary_key()
			.ok_or_else(|| FormSetError::UnsavedRecord {
				model: self.metadata.display_name(),
			})?;
		for (field, ids) in related {
			store.set_related(&pk, &field, ids)?;
		}
		Ok(())
	}

	/// Form-level errors, such as unique-together collisions
	pub fn non_field_errors(&self) -> &[String] {
		self.form.non_field_errors()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formset_db::MemoryStore;
	use formset_test::fixtures::{Post, Price, Product};
	use rstest::rstest;
	use serde_json::json;

	fn bind<M: Model>(form: &mut ModelForm<M>, pairs: &[(&str, Value)]) {
		let data = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect();
		form.form_mut().bind(data);
	}

	fn model_form<M: Model>(fields: &[&str], instance: Option<M>) -> ModelForm<M> {
		let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
		ModelForm::new(
			Arc::new(M::metadata()),
			&ModelFormConfig::default(),
			&fields,
			instance,
			&HashMap::new(),
			String::new(),
		)
	}

	#[rstest]
	fn test_form_field_for_kinds() {
		// Arrange
		let config = ModelFormConfig::new()
			.with_label("price", "Unit price")
			.with_help_text("price", "In euros");

		// Act
		let price = form_field_for(
			&FieldMetadata::new("price", FieldKind::decimal(10, 2)),
			&config,
			None,
		);
		let active = form_field_for(&FieldMetadata::new("active", FieldKind::Boolean), &config, None);

		// Assert
		assert_eq!(price.label(), Some("Unit price"));
		assert_eq!(price.help_text(), Some("In euros"));
		assert!(price.required());
		assert!(!active.required());
		assert_eq!(price.clean(Some(&json!("1.5"))).unwrap(), json!("1.50"));
	}

	#[rstest]
	fn test_char_field_length_limit_is_optional() {
		// Arrange
		let config = ModelFormConfig::new();
		let long = json!("x".repeat(300));

		// Act
		let unbounded = form_field_for(
			&FieldMetadata::new("bio", FieldKind::Char { max_length: None }),
			&config,
			None,
		);
		let bounded = form_field_for(&FieldMetadata::new("name", FieldKind::char(5)), &config, None);

		// Assert
		assert_eq!(unbounded.clean(Some(&long)).unwrap(), long);
		assert_eq!(
			bounded.clean(Some(&json!("Baudelaire"))).unwrap_err().to_string(),
			"Ensure this value has at most 5 characters (it has 10)."
		);
	}

	#[rstest]
	fn test_foreign_key_error_message_override() {
		// Arrange
		let config =
			ModelFormConfig::new().with_error_message("author", "required", "Pick an author.");
		let meta = FieldMetadata::new("author", FieldKind::foreign_key("Author"));

		// Act
		let field = form_field_for(&meta, &config, None);

		// Assert
		let err = field.clean(None).unwrap_err();
		assert_eq!(err.to_string(), "Pick an author.");
	}

	#[rstest]
	fn test_construct_instance_skips_auto_key() {
		// Arrange
		let mut form = model_form::<Product>(&["id", "slug"], None);
		bind(&mut form, &[("id", json!("9")), ("slug", json!("car-red"))]);
		assert!(form.form_mut().is_valid());

		// Act
		let product = form.construct_instance().unwrap();

		// Assert
		assert_eq!(product.slug, "car-red");
		assert_eq!(product.id, None);
	}

	#[rstest]
	fn test_validate_unique_single_field() {
		// Arrange
		let store = MemoryStore::with_records([Product::new(1, "car-red")]).unwrap();
		let mut form = model_form::<Product>(&["slug"], None);
		bind(&mut form, &[("slug", json!("car-red"))]);

		// Act
		let valid = form.is_valid(&store).unwrap();

		// Assert
		assert!(!valid);
		assert_eq!(
			form.form().errors().get("slug"),
			Some(&vec!["Product with this Slug already exists.".to_string()])
		);
	}

	#[rstest]
	fn test_validate_unique_ignores_own_record() {
		// Arrange
		let existing = Product::new(1, "car-red");
		let store = MemoryStore::with_records([existing.clone()]).unwrap();
		let mut form = model_form::<Product>(&["slug"], Some(existing));
		bind(&mut form, &[("slug", json!("car-red"))]);

		// Act & Assert
		assert!(form.is_valid(&store).unwrap());
	}

	#[rstest]
	fn test_validate_unique_together_goes_to_form_errors() {
		// Arrange
		let store = MemoryStore::with_records([Price::new(1, "12.00", 1)]).unwrap();
		let mut form = model_form::<Price>(&["price", "quantity"], None);
		bind(&mut form, &[("price", json!("12")), ("quantity", json!("1"))]);

		// Act
		let valid = form.is_valid(&store).unwrap();

		// Assert
		assert!(!valid);
		assert_eq!(
			form.non_field_errors(),
			&["Price with this Price and Quantity already exists.".to_string()]
		);
	}

	#[rstest]
	fn test_validate_unique_for_date() {
		// Arrange
		let store = MemoryStore::with_records([Post::new(
			1,
			"Release 1.0 is out",
			"release-1-0",
			"Finally",
			"2008-09-03",
		)])
		.unwrap();
		let mut form = model_form::<Post>(&["title", "slug", "subtitle", "posted"], None);
		bind(
			&mut form,
			&[
				("title", json!("Release 1.0 is out")),
				("slug", json!("release-1-0")),
				("subtitle", json!("Finally")),
				("posted", json!("2008-09-03")),
			],
		);

		// Act
		let valid = form.is_valid(&store).unwrap();

		// Assert
		assert!(!valid);
		let errors = form.form().errors();
		assert_eq!(
			errors.get("title"),
			Some(&vec!["Title must be unique for Posted date.".to_string()])
		);
		assert_eq!(
			errors.get("slug"),
			Some(&vec!["Slug must be unique for Posted year.".to_string()])
		);
		assert_eq!(
			errors.get("subtitle"),
			Some(&vec!["Subtitle must be unique for Posted month.".to_string()])
		);
	}

	#[rstest]
	fn test_save_rejects_invalid_form() {
		// Arrange
		let mut store = MemoryStore::<Product>::new();
		let mut form = model_form::<Product>(&["slug"], None);
		bind(&mut form, &[]);
		assert!(!form.is_valid(&store).unwrap());

		// Act
		let err = form.save(&mut store).unwrap_err();

		// Assert
		assert_eq!(
			err.to_string(),
			"The Product could not be created because the data didn't validate."
		);
	}
}
