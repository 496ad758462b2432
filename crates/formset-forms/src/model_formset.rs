//! Model formsets: editing a collection of records through one submission
//!
//! A formset is an ordered list of slots, each a [`ModelForm`]. Slots
//! `[0, initial_form_count)` edit existing records; the rest create new ones.
//! Validation runs every slot, checks the slot count against the configured
//! bounds and looks for duplicate values between slots; saving writes only the
//! slots that changed.

use crate::error::{ConfigError, FormSetError, FormSetResult};
use crate::fields::{BooleanField, Choice, Choices, InlineForeignKeyField, ModelChoiceField};
use crate::form::{CleanFunction, FormData, FormError, FormResult};
use crate::management::{self, DEFAULT_MAX_NUM, ManagementForm};
use crate::messages;
use crate::model_form::{ModelForm, ModelFormConfig};
use crate::settings::FormSetSettings;
use crate::uniqueness::{self, SlotRow};
use formset_db::{Model, ModelMetadata, Query, RecordStore, StoreResult, value_key};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the per-slot deletion checkbox
pub const DELETION_FIELD_NAME: &str = "DELETE";
/// Slot index used by [`ModelFormSet::empty_form`]
pub const EMPTY_FORM_INDEX: &str = "__prefix__";
pub const DEFAULT_PREFIX: &str = "form";

/// Formset-level clean hook, called with the cleaned data of every live slot
pub type FormSetCleanHook =
	Arc<dyn Fn(&[&HashMap<String, Value>]) -> FormResult<()> + Send + Sync>;

/// Called on each record right before it is inserted or updated
pub type PreSaveHook<M> = Arc<dyn Fn(&mut M) + Send + Sync>;

pub(crate) struct FormSetDefaults {
	pub extra: usize,
	pub can_delete: bool,
	pub prefix: String,
}

impl Default for FormSetDefaults {
	fn default() -> Self {
		Self {
			extra: 1,
			can_delete: false,
			prefix: DEFAULT_PREFIX.to_string(),
		}
	}
}

/// Builder for [`ModelFormSetConfig`]
///
/// # Examples
///
/// ```
/// use formset_forms::ModelFormSetBuilder;
/// use formset_test::fixtures::Author;
///
/// let config = ModelFormSetBuilder::<Author>::new()
///     .with_fields(&["name"])
///     .with_extra(3)
///     .with_max_num(4)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.extra, 3);
/// assert_eq!(config.max_num, 4);
/// assert_eq!(config.absolute_max, 1004);
/// assert_eq!(config.prefix, "form");
/// ```
pub struct ModelFormSetBuilder<M: Model> {
	fields: Option<Vec<String>>,
	exclude: Option<Vec<String>>,
	extra: Option<usize>,
	min_num: usize,
	max_num: Option<usize>,
	absolute_max: Option<usize>,
	validate_min: bool,
	validate_max: bool,
	can_delete: Option<bool>,
	can_delete_extra: bool,
	edit_only: bool,
	prefix: Option<String>,
	form_config: ModelFormConfig,
	choices: HashMap<String, Choices>,
	clean_form: Option<CleanFunction>,
	clean: Option<FormSetCleanHook>,
	pre_save: Option<PreSaveHook<M>>,
}

impl<M: Model> ModelFormSetBuilder<M> {
	pub fn new() -> Self {
		Self {
			fields: None,
			exclude: None,
			extra: None,
			min_num: 0,
			max_num: None,
			absolute_max: None,
			validate_min: false,
			validate_max: false,
			can_delete: None,
			can_delete_extra: true,
			edit_only: false,
			prefix: None,
			form_config: ModelFormConfig::default(),
			choices: HashMap::new(),
			clean_form: None,
			clean: None,
			pre_save: None,
		}
	}

	/// Record fields shown in each slot, in order
	pub fn with_fields(mut self, fields: &[&str]) -> Self {
		self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
		self
	}

	/// Show every editable field
	pub fn with_all_fields(mut self) -> Self {
		let metadata = M::metadata();
		self.fields = Some(
			metadata
				.fields
				.iter()
				.filter(|f| f.editable && !f.auto)
				.map(|f| f.name.clone())
				.collect(),
		);
		self
	}

	pub fn with_exclude(mut self, exclude: &[&str]) -> Self {
		self.exclude = Some(exclude.iter().map(|f| f.to_string()).collect());
		self
	}

	pub fn with_extra(mut self, extra: usize) -> Self {
		self.extra = Some(extra);
		self
	}

	pub fn with_min_num(mut self, min_num: usize) -> Self {
		self.min_num = min_num;
		self
	}

	pub fn with_max_num(mut self, max_num: usize) -> Self {
		self.max_num = Some(max_num);
		self
	}

	pub fn with_absolute_max(mut self, absolute_max: usize) -> Self {
		self.absolute_max = Some(absolute_max);
		self
	}

	pub fn with_validate_min(mut self, validate_min: bool) -> Self {
		self.validate_min = validate_min;
		self
	}

	pub fn with_validate_max(mut self, validate_max: bool) -> Self {
		self.validate_max = validate_max;
		self
	}

	pub fn with_can_delete(mut self, can_delete: bool) -> Self {
		self.can_delete = Some(can_delete);
		self
	}

	pub fn with_can_delete_extra(mut self, can_delete_extra: bool) -> Self {
		self.can_delete_extra = can_delete_extra;
		self
	}

	/// Only update existing records; new slots are never saved
	pub fn with_edit_only(mut self, edit_only: bool) -> Self {
		self.edit_only = edit_only;
		self
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn with_form_config(mut self, form_config: ModelFormConfig) -> Self {
		self.form_config = form_config;
		self
	}

	/// Options offered by a relation field
	pub fn with_choices(mut self, field: impl Into<String>, choices: Vec<Choice>) -> Self {
		self.choices.insert(field.into(), Arc::new(choices));
		self
	}

	/// Options offered by a relation field, taken from related records
	pub fn with_related_choices<R: Model>(self, field: impl Into<String>, records: &[R]) -> Self {
		self.with_choices(field, Choice::from_queryset(records))
	}

	/// Per-slot clean hook, run after field cleaning
	pub fn with_clean_form<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut HashMap<String, Value>) -> FormResult<()> + Send + Sync + 'static,
	{
		self.clean_form = Some(Arc::new(hook));
		self
	}

	/// Formset-level clean hook, run after the built-in checks
	pub fn with_clean<F>(mut self, hook: F) -> Self
	where
		F: Fn(&[&HashMap<String, Value>]) -> FormResult<()> + Send + Sync + 'static,
	{
		self.clean = Some(Arc::new(hook));
		self
	}

	pub fn with_pre_save<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut M) + Send + Sync + 'static,
	{
		self.pre_save = Some(Arc::new(hook));
		self
	}

	/// Override values with the keys present in `settings`
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::{FormSetSettings, ModelFormSetBuilder};
	/// use formset_test::fixtures::Author;
	///
	/// let settings = FormSetSettings::from_toml_str("fields = [\"name\"]\nextra = 0").unwrap();
	/// let config = ModelFormSetBuilder::<Author>::new()
	///     .with_extra(5)
	///     .with_settings(&settings)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(config.extra, 0);
	/// assert_eq!(config.fields, vec!["name".to_string()]);
	/// ```
	pub fn with_settings(mut self, settings: &FormSetSettings) -> Self {
		if let Some(extra) = settings.extra {
			self.extra = Some(extra);
		}
		if let Some(min_num) = settings.min_num {
			self.min_num = min_num;
		}
		if let Some(max_num) = settings.max_num {
			self.max_num = Some(max_num);
		}
		if let Some(absolute_max) = settings.absolute_max {
			self.absolute_max = Some(absolute_max);
		}
		if let Some(validate_min) = settings.validate_min {
			self.validate_min = validate_min;
		}
		if let Some(validate_max) = settings.validate_max {
			self.validate_max = validate_max;
		}
		if let Some(can_delete) = settings.can_delete {
			self.can_delete = Some(can_delete);
		}
		if let Some(can_delete_extra) = settings.can_delete_extra {
			self.can_delete_extra = can_delete_extra;
		}
		if let Some(edit_only) = settings.edit_only {
			self.edit_only = edit_only;
		}
		if let Some(prefix) = &settings.prefix {
			self.prefix = Some(prefix.clone());
		}
		if let Some(fields) = &settings.fields {
			self.fields = Some(fields.clone());
		}
		if let Some(exclude) = &settings.exclude {
			self.exclude = Some(exclude.clone());
		}
		self
	}

	pub fn build(self) -> Result<Arc<ModelFormSetConfig<M>>, ConfigError> {
		Ok(Arc::new(self.finish(FormSetDefaults::default())?))
	}

	pub(crate) fn cap_max_num(mut self, max_num: usize) -> Self {
		self.max_num = Some(max_num);
		self
	}

	pub(crate) fn finish(self, defaults: FormSetDefaults) -> Result<ModelFormSetConfig<M>, ConfigError> {
		let metadata = M::metadata();
		let fields = resolve_fields(&metadata, self.fields.as_deref(), self.exclude.as_deref())?;
		let max_num = self.max_num.unwrap_or(DEFAULT_MAX_NUM);
		let absolute_max = self.absolute_max.unwrap_or(max_num.saturating_add(DEFAULT_MAX_NUM));
		if absolute_max < max_num {
			return Err(ConfigError::AbsoluteMaxBelowMaxNum);
		}

		Ok(ModelFormSetConfig {
			metadata: Arc::new(metadata),
			fields,
			extra: self.extra.unwrap_or(defaults.extra),
			min_num: self.min_num,
			max_num,
			absolute_max,
			validate_min: self.validate_min,
			validate_max: self.validate_max,
			can_delete: self.can_delete.unwrap_or(defaults.can_delete),
			can_delete_extra: self.can_delete_extra,
			edit_only: self.edit_only,
			prefix: self.prefix.unwrap_or(defaults.prefix),
			form_config: self.form_config,
			choices: self.choices,
			clean_form: self.clean_form,
			clean: self.clean,
			pre_save: self.pre_save,
		})
	}
}

impl<M: Model> Default for ModelFormSetBuilder<M> {
	fn default() -> Self {
		Self::new()
	}
}

/// Form fields for a record type: the requested ones, minus exclusions and
/// generated keys
fn resolve_fields(
	metadata: &ModelMetadata,
	fields: Option<&[String]>,
	exclude: Option<&[String]>,
) -> Result<Vec<String>, ConfigError> {
	if fields.is_none() && exclude.is_none() {
		return Err(ConfigError::MissingFields);
	}

	let selected: Vec<String> = match fields {
		Some(fields) => {
			let unknown: Vec<&str> = fields
				.iter()
				.filter(|name| metadata.field(name).is_none())
				.map(String::as_str)
				.collect();
			if !unknown.is_empty() {
				return Err(ConfigError::UnknownFields {
					fields: unknown.join(", "),
					model: metadata.name.clone(),
				});
			}
			if let Some(field) = fields
				.iter()
				.filter_map(|name| metadata.field(name))
				.find(|f| !f.editable && !f.auto)
			{
				return Err(ConfigError::NonEditableField {
					field: field.name.clone(),
					model: metadata.name.clone(),
				});
			}
			fields
				.iter()
				.filter(|name| metadata.field(name).is_some_and(|f| !f.auto))
				.cloned()
				.collect()
		}
		None => metadata
			.fields
			.iter()
			.filter(|f| f.editable && !f.auto)
			.map(|f| f.name.clone())
			.collect(),
	};

	let exclude = exclude.unwrap_or_default();
	Ok(selected
		.into_iter()
		.filter(|name| !exclude.contains(name))
		.collect())
}

/// Immutable formset definition, shared between requests
pub struct ModelFormSetConfig<M: Model> {
	pub metadata: Arc<ModelMetadata>,
	/// Record fields shown in each slot
	pub fields: Vec<String>,
	pub extra: usize,
	pub min_num: usize,
	pub max_num: usize,
	pub absolute_max: usize,
	pub validate_min: bool,
	pub validate_max: bool,
	pub can_delete: bool,
	pub can_delete_extra: bool,
	pub edit_only: bool,
	pub prefix: String,
	pub form_config: ModelFormConfig,
	pub choices: HashMap<String, Choices>,
	clean_form: Option<CleanFunction>,
	clean: Option<FormSetCleanHook>,
	pre_save: Option<PreSaveHook<M>>,
}

impl<M: Model> ModelFormSetConfig<M> {
	pub(crate) fn without_field(mut self, name: &str) -> Self {
		self.fields.retain(|f| f != name);
		self
	}
}

/// Per-request inputs of a formset
pub struct FormSetOptions<M> {
	/// Submitted payload; `None` renders an unbound formset
	pub data: Option<FormData>,
	/// Overrides the configured prefix
	pub prefix: Option<String>,
	/// Existing records to edit instead of every stored record
	pub queryset: Option<Vec<M>>,
	/// Initial values for the extra slots, in order
	pub initial: Vec<HashMap<String, Value>>,
	/// Inline formsets only: treat every slot as a new child
	pub save_as_new: bool,
}

impl<M> FormSetOptions<M> {
	pub fn new() -> Self {
		Self {
			data: None,
			prefix: None,
			queryset: None,
			initial: Vec::new(),
			save_as_new: false,
		}
	}

	pub fn with_data(mut self, data: FormData) -> Self {
		self.data = Some(data);
		self
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn with_queryset(mut self, queryset: Vec<M>) -> Self {
		self.queryset = Some(queryset);
		self
	}

	pub fn with_initial(mut self, initial: Vec<HashMap<String, Value>>) -> Self {
		self.initial = initial;
		self
	}

	pub fn with_save_as_new(mut self, save_as_new: bool) -> Self {
		self.save_as_new = save_as_new;
		self
	}
}

impl<M> Default for FormSetOptions<M> {
	fn default() -> Self {
		Self::new()
	}
}

/// Parent of an inline formset, as seen by the engine
#[derive(Debug, Clone)]
pub(crate) struct InlineBinding {
	pub fk_name: String,
	pub parent_name: String,
	pub parent_key: Option<Value>,
}

/// A bound or unbound set of slots over one record type
pub struct ModelFormSet<M: Model> {
	config: Arc<ModelFormSetConfig<M>>,
	prefix: String,
	data: Option<FormData>,
	queryset: Vec<M>,
	object_index: HashMap<String, usize>,
	initial_extra: Vec<HashMap<String, Value>>,
	key_choices: Option<Choices>,
	inline: Option<InlineBinding>,
	save_as_new: bool,
	declared_total: usize,
	management_error: Option<String>,
	initial_form_count: usize,
	forms: Vec<ModelForm<M>>,
	non_form_errors: Vec<String>,
	validated: bool,
	new_objects: Vec<M>,
	changed_objects: Vec<(M, Vec<String>)>,
	deleted_objects: Vec<M>,
	saved_forms: Vec<usize>,
}

impl<M: Model> ModelFormSet<M> {
	/// Build the slots for one request
	///
	/// Without [`FormSetOptions::queryset`] every record in `store` is
	/// editable, ordered by the model's default ordering or by key.
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::MemoryStore;
	/// use formset_forms::{FormSetOptions, ModelFormSet, ModelFormSetBuilder};
	/// use formset_test::fixtures::Author;
	///
	/// let store = MemoryStore::with_records([Author::new(1, "Arthur Rimbaud")]).unwrap();
	/// let config = ModelFormSetBuilder::<Author>::new()
	///     .with_fields(&["name"])
	///     .with_extra(2)
	///     .build()
	///     .unwrap();
	///
	/// let formset = ModelFormSet::new(config, &store, FormSetOptions::new()).unwrap();
	/// assert_eq!(formset.total_form_count(), 3);
	/// assert_eq!(formset.initial_form_count(), 1);
	/// assert_eq!(formset.forms()[0].form().prefix(), "form-0");
	/// ```
	pub fn new<S: RecordStore<M>>(
		config: Arc<ModelFormSetConfig<M>>,
		store: &S,
		options: FormSetOptions<M>,
	) -> FormSetResult<Self> {
		Self::with_binding(config, store, options, None)
	}

	pub(crate) fn with_binding<S: RecordStore<M>>(
		config: Arc<ModelFormSetConfig<M>>,
		store: &S,
		options: FormSetOptions<M>,
		inline: Option<InlineBinding>,
	) -> FormSetResult<Self> {
		let prefix = options.prefix.unwrap_or_else(|| config.prefix.clone());
		let save_as_new = options.save_as_new && inline.is_some();
		let queryset = load_queryset(&config.metadata, store, options.queryset, inline.as_ref())?;
		let object_index = queryset
			.iter()
			.enumerate()
			.filter_map(|(i, record)| {
				record
					.primary_key()
					.and_then(|pk| value_key(&pk))
					.map(|key| (key, i))
			})
			.collect();

		let generated_key = config
			.metadata
			.primary_key()
			.is_some_and(|pk| pk.auto || !pk.editable);
		let key_choices = if generated_key {
			let all = store.fetch(&Query::new())?;
			Some(Arc::new(Choice::from_queryset(&all)))
		} else {
			None
		};

		let mut declared_total = 0;
		let mut management_error = None;
		let (initial_form_count, total) = match &options.data {
			Some(data) => match ManagementForm::from_data(data, &prefix) {
				Ok(submitted) => {
					declared_total = submitted.total_forms;
					let total = management::bound_form_count(submitted.total_forms, config.absolute_max);
					if total < submitted.total_forms {
						tracing::warn!(
							prefix = %prefix,
							declared = submitted.total_forms,
							absolute_max = config.absolute_max,
							"TOTAL_FORMS exceeds absolute_max; extra slots dropped"
						);
					}
					let initial = if save_as_new {
						0
					} else {
						submitted.initial_forms.min(total)
					};
					(initial, total)
				}
				Err(missing) => {
					tracing::warn!(prefix = %prefix, missing = ?missing, "management data missing or invalid");
					management_error = Some(messages::missing_management_form(&missing));
					(0, 0)
				}
			},
			None => {
				let initial = if save_as_new { 0 } else { queryset.len() };
				let total = management::unbound_form_count(
					initial,
					config.min_num,
					config.extra,
					config.max_num,
					config.absolute_max,
				);
				(initial.min(total), total)
			}
		};

		let mut formset = Self {
			config,
			prefix,
			data: options.data,
			queryset,
			object_index,
			initial_extra: options.initial,
			key_choices,
			inline,
			save_as_new,
			declared_total,
			management_error,
			initial_form_count,
			forms: Vec::with_capacity(total),
			non_form_errors: Vec::new(),
			validated: false,
			new_objects: Vec::new(),
			changed_objects: Vec::new(),
			deleted_objects: Vec::new(),
			saved_forms: Vec::new(),
		};
		for i in 0..total {
			let form = formset.construct_form(Some(i));
			formset.forms.push(form);
		}

		tracing::debug!(
			model = %formset.config.metadata.name,
			prefix = %formset.prefix,
			bound = formset.is_bound(),
			total,
			initial = formset.initial_form_count,
			"constructed formset slots"
		);
		Ok(formset)
	}

	/// Build slot `index`, or the template slot when `index` is `None`
	fn construct_form(&self, index: Option<usize>) -> ModelForm<M> {
		let config = &self.config;
		let pk_name = config.metadata.pk_name().to_string();
		let slot_prefix = match index {
			Some(i) => format!("{}-{}", self.prefix, i),
			None => format!("{}-{}", self.prefix, EMPTY_FORM_INDEX),
		};
		let initial_slot = index.is_some_and(|i| i < self.initial_form_count);

		let instance = match (index, &self.data) {
			(Some(_), Some(data)) if initial_slot => data
				.get(&format!("{}-{}", slot_prefix, pk_name))
				.and_then(|key| self.existing_object(key))
				.cloned(),
			(Some(i), None) if initial_slot => self.queryset.get(i).cloned(),
			_ => None,
		};
		let key_initial = instance.as_ref().and_then(|record| record.primary_key());

		let mut form = ModelForm::new(
			config.metadata.clone(),
			&config.form_config,
			&config.fields,
			instance,
			&config.choices,
			slot_prefix.clone(),
		);

		if let Some(i) = index
			&& i >= self.initial_form_count
			&& let Some(initial) = self.initial_extra.get(i - self.initial_form_count)
		{
			for (name, value) in initial {
				form.form_mut().set_initial_value(name.clone(), value.clone());
			}
		}

		if let Some(choices) = &self.key_choices {
			let mut field = ModelChoiceField::new(pk_name.clone(), Some(choices.clone()))
				.hidden()
				.required(initial_slot);
			if let Some(widget) = config.form_config.widgets.get(&pk_name) {
				field.widget = widget.clone();
			}
			if let Some(pk) = key_initial {
				form.form_mut().set_initial_value(pk_name.clone(), pk.clone());
				field = field.initial(pk);
			}
			form.add_model_field(Box::new(field));
		}

		if let Some(binding) = &self.inline {
			form.add_model_field(Box::new(InlineForeignKeyField::new(
				binding.fk_name.clone(),
				binding.parent_key.clone(),
			)));
		}

		if config.can_delete && (initial_slot || config.can_delete_extra) {
			let mut field = BooleanField::new(DELETION_FIELD_NAME.to_string());
			field.label = Some("Delete".to_string());
			form.form_mut().add_field(Box::new(field));
		}

		if let Some(hook) = &config.clean_form {
			form.form_mut().add_shared_clean_function(hook.clone());
		}

		let empty_permitted = match index {
			Some(i) => i >= self.initial_form_count && i >= config.min_num,
			None => true,
		};
		form.form_mut().set_empty_permitted(empty_permitted);

		if let (Some(_), Some(data)) = (index, &self.data) {
			let slot_key_prefix = format!("{}-", slot_prefix);
			let mut slot_data: FormData = data
				.iter()
				.filter(|(key, _)| key.starts_with(&slot_key_prefix))
				.map(|(key, value)| (key.clone(), value.clone()))
				.collect();
			if self.save_as_new
				&& let Some(binding) = &self.inline
			{
				slot_data.remove(&format!("{}{}", slot_key_prefix, pk_name));
				slot_data.remove(&format!("{}{}", slot_key_prefix, binding.fk_name));
			}
			form.form_mut().bind(slot_data);
		}

		form
	}

	fn existing_object(&self, key: &Value) -> Option<&M> {
		let key = value_key(key)?;
		self.object_index
			.get(&key)
			.and_then(|&i| self.queryset.get(i))
	}

	pub fn config(&self) -> &ModelFormSetConfig<M> {
		&self.config
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn is_bound(&self) -> bool {
		self.data.is_some()
	}

	pub fn forms(&self) -> &[ModelForm<M>] {
		&self.forms
	}

	/// Slots editing existing records
	pub fn initial_forms(&self) -> &[ModelForm<M>] {
		&self.forms[..self.initial_form_count]
	}

	/// Slots for new records
	pub fn extra_forms(&self) -> &[ModelForm<M>] {
		&self.forms[self.initial_form_count..]
	}

	pub fn total_form_count(&self) -> usize {
		self.forms.len()
	}

	pub fn initial_form_count(&self) -> usize {
		self.initial_form_count
	}

	pub fn len(&self) -> usize {
		self.forms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.forms.is_empty()
	}

	/// The existing records this formset edits
	pub fn get_queryset(&self) -> &[M] {
		&self.queryset
	}

	/// Management values to render alongside the slots
	pub fn management_form(&self) -> ManagementForm {
		ManagementForm {
			total_forms: self.forms.len(),
			initial_forms: self.initial_form_count,
			min_num: self.config.min_num,
			max_num: self.config.max_num,
		}
	}

	/// A blank slot template whose index placeholder is `__prefix__`
	pub fn empty_form(&self) -> ModelForm<M> {
		self.construct_form(None)
	}

	pub fn has_changed(&self) -> bool {
		self.forms.iter().any(|form| form.form().has_changed())
	}

	/// The slot's DELETE box was checked
	fn should_delete(&self, index: usize) -> bool {
		self.config.can_delete
			&& self.forms[index]
				.form()
				.cleaned_data()
				.get(DELETION_FIELD_NAME)
				== Some(&Value::Bool(true))
	}

	/// Deletion applies to existing slots and to new slots that carry data
	fn is_deleted_slot(&self, index: usize) -> bool {
		self.should_delete(index)
			&& (index < self.initial_form_count || self.forms[index].form().has_changed())
	}

	/// Slots marked for deletion
	pub fn deleted_forms(&self) -> Vec<&ModelForm<M>> {
		(0..self.forms.len())
			.filter(|&i| self.is_deleted_slot(i))
			.map(|i| &self.forms[i])
			.collect()
	}

	/// Validate every slot, the slot count and duplicates between slots
	///
	/// Validation runs once; later calls return the same verdict.
	pub fn is_valid<S: RecordStore<M>>(&mut self, store: &S) -> StoreResult<bool> {
		if !self.is_bound() {
			return Ok(false);
		}
		self.full_clean(store)?;
		let forms_valid = (0..self.forms.len())
			.all(|i| self.should_delete(i) || self.forms[i].form().errors().is_empty());
		Ok(forms_valid && self.non_form_errors.is_empty())
	}

	fn full_clean<S: RecordStore<M>>(&mut self, store: &S) -> StoreResult<()> {
		if self.validated {
			return Ok(());
		}
		self.validated = true;
		self.non_form_errors.clear();
		if !self.is_bound() {
			return Ok(());
		}
		if let Some(message) = &self.management_error {
			self.non_form_errors.push(message.clone());
			return Ok(());
		}

		for form in &mut self.forms {
			form.is_valid(store)?;
		}

		let total = self.forms.len();
		let deleted = (0..total).filter(|&i| self.is_deleted_slot(i)).count();
		let empty = (self.initial_form_count..total)
			.filter(|&i| !self.forms[i].form().has_changed())
			.count();
		let filled = total.saturating_sub(deleted + empty);
		let config = &self.config;

		if (config.validate_max && filled > config.max_num)
			|| self.declared_total > config.absolute_max
		{
			self.non_form_errors
				.push(messages::too_many_forms(config.max_num));
			return Ok(());
		}
		if config.validate_min && filled < config.min_num {
			self.non_form_errors
				.push(messages::too_few_forms(config.min_num));
			return Ok(());
		}

		self.check_duplicates();
		self.run_clean_hook();
		Ok(())
	}

	fn check_duplicates(&mut self) {
		let live: Vec<usize> = (0..self.forms.len())
			.filter(|&i| !self.is_deleted_slot(i) && self.forms[i].form().errors().is_empty())
			.collect();
		let Some(&first) = live.first() else {
			return;
		};

		let report = {
			let metadata = &self.config.metadata;
			let model_fields = self.forms[first].model_fields();
			let exclude: Vec<&str> = metadata
				.fields
				.iter()
				.map(|f| f.name.as_str())
				.filter(|name| !model_fields.iter().any(|m| m == name))
				.collect();
			let constant: Vec<String> = self
				.inline
				.iter()
				.map(|binding| binding.fk_name.clone())
				.collect();
			let rows: Vec<SlotRow<'_>> = live
				.iter()
				.map(|&i| SlotRow {
					index: i,
					cleaned: self.forms[i].form().cleaned_data(),
				})
				.collect();
			uniqueness::find_duplicates(metadata, &exclude, &constant, &rows)
		};

		for &i in &report.slots {
			self.forms[i]
				.form_mut()
				.add_error(None, messages::DUPLICATE_VALUES);
		}
		self.non_form_errors.extend(report.errors);
	}

	fn run_clean_hook(&mut self) {
		let Some(hook) = self.config.clean.clone() else {
			return;
		};
		let cleaned: Vec<&HashMap<String, Value>> = (0..self.forms.len())
			.filter(|&i| !self.is_deleted_slot(i))
			.map(|i| self.forms[i].form().cleaned_data())
			.filter(|data| !data.is_empty())
			.collect();
		if let Err(e) = hook(&cleaned) {
			let message = match e {
				FormError::Validation(message) => message,
				FormError::Field { error, .. } => error.to_string(),
			};
			self.non_form_errors.push(message);
		}
	}

	/// Per-slot error maps; deletion-marked slots report no errors
	///
	/// Populated by [`is_valid`](Self::is_valid).
	pub fn errors(&self) -> Vec<HashMap<String, Vec<String>>> {
		(0..self.forms.len())
			.map(|i| {
				if self.should_delete(i) {
					HashMap::new()
				} else {
					self.forms[i].form().errors().clone()
				}
			})
			.collect()
	}

	/// Errors that belong to the formset rather than to one slot
	pub fn non_form_errors(&self) -> &[String] {
		&self.non_form_errors
	}

	/// Non-form errors plus the number of erroneous fields across all slots
	pub fn total_error_count(&self) -> usize {
		self.non_form_errors.len() + self.errors().iter().map(HashMap::len).sum::<usize>()
	}

	/// Save changed and new slots and delete marked ones
	///
	/// Returns the inserted and updated records, existing ones first. With
	/// `commit` false nothing reaches the store; persist the returned records
	/// yourself and then call [`save_related`](Self::save_related).
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::{MemoryStore, RecordStore, Query};
	/// use formset_forms::{FormSetOptions, ModelFormSet, ModelFormSetBuilder};
	/// use formset_test::fixtures::Author;
	/// use formset_test::payload;
	///
	/// let mut store = MemoryStore::<Author>::new();
	/// let config = ModelFormSetBuilder::<Author>::new()
	///     .with_fields(&["name"])
	///     .with_extra(3)
	///     .build()
	///     .unwrap();
	/// let data = payload! {
	///     "form-TOTAL_FORMS" => "3",
	///     "form-INITIAL_FORMS" => "0",
	///     "form-0-name" => "Charles Baudelaire",
	///     "form-1-name" => "Arthur Rimbaud",
	///     "form-2-name" => "",
	/// };
	///
	/// let mut formset =
	///     ModelFormSet::new(config, &store, FormSetOptions::new().with_data(data)).unwrap();
	/// assert!(formset.is_valid(&store).unwrap());
	///
	/// let saved = formset.save(&mut store, true).unwrap();
	/// assert_eq!(saved.len(), 2);
	/// assert_eq!(store.fetch(&Query::new()).unwrap().len(), 2);
	/// ```
	pub fn save<S: RecordStore<M>>(&mut self, store: &mut S, commit: bool) -> FormSetResult<Vec<M>> {
		if !self.is_valid(&*store)? {
			return Err(FormSetError::InvalidData {
				model: self.config.metadata.display_name(),
				action: "changed".to_string(),
			});
		}
		self.new_objects.clear();
		self.changed_objects.clear();
		self.deleted_objects.clear();
		self.saved_forms.clear();

		let mut saved = self.save_existing_objects(store, commit)?;
		if !self.config.edit_only {
			saved.extend(self.save_new_objects(store, commit)?);
		}

		tracing::debug!(
			model = %self.config.metadata.name,
			commit,
			created = self.new_objects.len(),
			changed = self.changed_objects.len(),
			deleted = self.deleted_objects.len(),
			"saved formset"
		);
		Ok(saved)
	}

	fn save_existing_objects<S: RecordStore<M>>(
		&mut self,
		store: &mut S,
		commit: bool,
	) -> FormSetResult<Vec<M>> {
		let mut saved = Vec::new();
		for i in 0..self.initial_form_count {
			// No instance: the submitted key is unknown or the record is gone
			let Some(existing) = self.forms[i].instance().cloned() else {
				continue;
			};
			let Some(pk) = existing.primary_key() else {
				continue;
			};
			if self.is_deleted_slot(i) {
				if commit && !store.delete(&pk)? {
					tracing::debug!(pk = %pk, "record already deleted");
				}
				self.deleted_objects.push(existing);
				continue;
			}
			if !self.forms[i].form().has_changed() {
				continue;
			}
			let record = self.save_form(i, store, commit)?;
			let changed = self.forms[i].form().changed_data();
			self.changed_objects.push((record.clone(), changed));
			saved.push(record);
		}
		Ok(saved)
	}

	fn save_new_objects<S: RecordStore<M>>(
		&mut self,
		store: &mut S,
		commit: bool,
	) -> FormSetResult<Vec<M>> {
		let mut saved = Vec::new();
		for i in self.initial_form_count..self.forms.len() {
			if !self.forms[i].form().has_changed() || self.should_delete(i) {
				continue;
			}
			let record = self.save_form(i, store, commit)?;
			self.new_objects.push(record.clone());
			saved.push(record);
		}
		Ok(saved)
	}

	fn save_form<S: RecordStore<M>>(
		&mut self,
		index: usize,
		store: &mut S,
		commit: bool,
	) -> FormSetResult<M> {
		let form = &self.forms[index];
		let mut record = form.construct_instance()?;
		if let Some(binding) = &self.inline {
			let parent = binding
				.parent_key
				.clone()
				.ok_or_else(|| FormSetError::UnsavedParent {
					parent: binding.parent_name.clone(),
				})?;
			record.set_field(&binding.fk_name, parent)?;
		}
		if let Some(hook) = &self.config.pre_save {
			hook(&mut record);
		}
		if commit {
			form.persist(store, &mut record)?;
			form.save_related(store, &record)?;
		} else {
			self.saved_forms.push(index);
		}
		Ok(record)
	}

	/// Save many-to-many data after a `commit = false` save
	///
	/// `records` are the records returned by [`save`](Self::save), in order,
	/// after the caller persisted them.
	pub fn save_related<S: RecordStore<M>>(&mut self, store: &mut S, records: &[M]) -> FormSetResult<()> {
		if records.len() != self.saved_forms.len() {
			return Err(FormSetError::RelatedMismatch {
				expected: self.saved_forms.len(),
				actual: records.len(),
			});
		}
		let pending = std::mem::take(&mut self.saved_forms);
		for (index, record) in pending.into_iter().zip(records) {
			self.forms[index].save_related(store, record)?;
		}
		Ok(())
	}

	/// Records inserted by the last save
	pub fn new_objects(&self) -> &[M] {
		&self.new_objects
	}

	/// Records updated by the last save, with the names of the changed fields
	pub fn changed_objects(&self) -> &[(M, Vec<String>)] {
		&self.changed_objects
	}

	/// Records deleted by the last save
	pub fn deleted_objects(&self) -> &[M] {
		&self.deleted_objects
	}

	pub(crate) fn set_parent_key(&mut self, parent_key: Option<Value>) {
		if let Some(binding) = &mut self.inline {
			binding.parent_key = parent_key;
		}
	}
}

/// Existing records for a formset: explicit ones, or everything in the store
fn load_queryset<M: Model, S: RecordStore<M>>(
	metadata: &ModelMetadata,
	store: &S,
	explicit: Option<Vec<M>>,
	inline: Option<&InlineBinding>,
) -> StoreResult<Vec<M>> {
	let mut query = Query::new();
	if let Some(binding) = inline {
		let Some(parent_key) = &binding.parent_key else {
			return Ok(Vec::new());
		};
		query = query.filter(binding.fk_name.clone(), parent_key.clone());
	}
	match explicit {
		Some(records) => Ok(records.into_iter().filter(|r| query.matches(r)).collect()),
		None => {
			if metadata.ordering.is_empty() {
				query = query.order_by(&[metadata.pk_name()]);
			}
			store.fetch(&query)
		}
	}
}
