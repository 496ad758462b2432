//! Inline formsets: the children of one parent record
//!
//! An inline formset is a model formset restricted to the child records whose
//! foreign key points at a given parent. The foreign key is never editable
//! through the slots; every saved child is attached to the parent.

use crate::error::{ConfigError, FormSetResult};
use crate::management::ManagementForm;
use crate::model_form::ModelForm;
use crate::model_formset::{
	FormSetDefaults, FormSetOptions, InlineBinding, ModelFormSet, ModelFormSetBuilder,
	ModelFormSetConfig,
};
use formset_db::{FieldKind, FieldMetadata, Model, ModelMetadata, RecordStore, StoreResult};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builder for [`InlineFormSetConfig`]
///
/// Defaults differ from plain formsets: three extra slots, deletion enabled
/// and a prefix of `<child>_set`.
///
/// # Examples
///
/// ```
/// use formset_forms::{InlineFormSetBuilder, ModelFormSetBuilder};
/// use formset_test::fixtures::{Poem, Poet};
///
/// let config = InlineFormSetBuilder::<Poet, Poem>::new(
///     ModelFormSetBuilder::new().with_fields(&["name"]),
/// )
/// .build()
/// .unwrap();
///
/// assert_eq!(config.fk().name, "poet");
/// assert_eq!(config.formset().extra, 3);
/// assert!(config.formset().can_delete);
/// assert_eq!(config.formset().prefix, "poem_set");
/// ```
pub struct InlineFormSetBuilder<P: Model, M: Model> {
	formset: ModelFormSetBuilder<M>,
	fk_name: Option<String>,
	_parent: PhantomData<fn() -> P>,
}

impl<P: Model, M: Model> InlineFormSetBuilder<P, M> {
	pub fn new(formset: ModelFormSetBuilder<M>) -> Self {
		Self {
			formset,
			fk_name: None,
			_parent: PhantomData,
		}
	}

	/// Foreign key to use when the child has several pointing at the parent
	pub fn with_fk_name(mut self, fk_name: impl Into<String>) -> Self {
		self.fk_name = Some(fk_name.into());
		self
	}

	pub fn build(self) -> Result<Arc<InlineFormSetConfig<P, M>>, ConfigError> {
		let parent = P::metadata();
		let child = M::metadata();
		let fk = resolve_foreign_key(&parent, &child, self.fk_name.as_deref())?.clone();

		let mut formset = self.formset;
		if matches!(fk.kind, FieldKind::ForeignKey { unique: true, .. }) || fk.unique {
			formset = formset.cap_max_num(1);
		}
		let defaults = FormSetDefaults {
			extra: 3,
			can_delete: true,
			prefix: format!("{}_set", child.name.to_lowercase()),
		};
		let formset = formset.finish(defaults)?.without_field(&fk.name);

		tracing::debug!(
			parent = %parent.name,
			child = %child.name,
			fk = %fk.name,
			"resolved inline foreign key"
		);
		Ok(Arc::new(InlineFormSetConfig {
			formset: Arc::new(formset),
			fk,
			_parent: PhantomData,
		}))
	}
}

/// The foreign key on `child` that points at `parent`
fn resolve_foreign_key<'a>(
	parent: &ModelMetadata,
	child: &'a ModelMetadata,
	fk_name: Option<&str>,
) -> Result<&'a FieldMetadata, ConfigError> {
	match fk_name {
		Some(fk_name) => {
			let field = child.field(fk_name).ok_or_else(|| ConfigError::NoSuchField {
				model: child.name.clone(),
				fk_name: fk_name.to_string(),
			})?;
			match &field.kind {
				FieldKind::ForeignKey { to, .. } if *to == parent.name => Ok(field),
				_ => Err(ConfigError::NotAForeignKey {
					fk_name: fk_name.to_string(),
					parent: parent.name.clone(),
				}),
			}
		}
		None => match child.foreign_keys_to(&parent.name).as_slice() {
			[fk] => Ok(fk),
			[] => Err(ConfigError::NoForeignKey {
				child: child.name.clone(),
				parent: parent.name.clone(),
			}),
			_ => Err(ConfigError::AmbiguousForeignKey {
				child: child.name.clone(),
				parent: parent.name.clone(),
			}),
		},
	}
}

/// Inline formset definition: a child formset plus the resolved foreign key
pub struct InlineFormSetConfig<P: Model, M: Model> {
	formset: Arc<ModelFormSetConfig<M>>,
	fk: FieldMetadata,
	_parent: PhantomData<fn() -> P>,
}

impl<P: Model, M: Model> InlineFormSetConfig<P, M> {
	pub fn formset(&self) -> &ModelFormSetConfig<M> {
		&self.formset
	}

	/// The child's foreign key to the parent
	pub fn fk(&self) -> &FieldMetadata {
		&self.fk
	}
}

/// The child slots of one parent record
pub struct InlineFormSet<P: Model, M: Model> {
	config: Arc<InlineFormSetConfig<P, M>>,
	instance: P,
	formset: ModelFormSet<M>,
}

impl<P: Model, M: Model> InlineFormSet<P, M> {
	/// Build the slots for the children of `instance`
	///
	/// An unsaved parent has no children; its slots are all new and can only
	/// be saved once the parent has a key (see [`set_instance`](Self::set_instance)).
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::MemoryStore;
	/// use formset_forms::{FormSetOptions, InlineFormSet, InlineFormSetBuilder, ModelFormSetBuilder};
	/// use formset_test::fixtures::{Poem, Poet};
	///
	/// let store = MemoryStore::with_records([
	///     Poem::new(1, 1, "The Raven"),
	///     Poem::new(2, 2, "Ozymandias"),
	/// ])
	/// .unwrap();
	/// let config = InlineFormSetBuilder::<Poet, Poem>::new(
	///     ModelFormSetBuilder::new().with_fields(&["name"]),
	/// )
	/// .build()
	/// .unwrap();
	///
	/// let formset =
	///     InlineFormSet::new(config, &store, Poet::new(1, "Edgar Allen Poe"), FormSetOptions::new())
	///         .unwrap();
	/// assert_eq!(formset.get_queryset().len(), 1);
	/// assert_eq!(formset.total_form_count(), 4);
	/// ```
	pub fn new<S: RecordStore<M>>(
		config: Arc<InlineFormSetConfig<P, M>>,
		store: &S,
		instance: P,
		options: FormSetOptions<M>,
	) -> FormSetResult<Self> {
		let binding = InlineBinding {
			fk_name: config.fk.name.clone(),
			parent_name: P::metadata().display_name(),
			parent_key: instance.primary_key(),
		};
		let formset =
			ModelFormSet::with_binding(config.formset.clone(), store, options, Some(binding))?;
		Ok(Self {
			config,
			instance,
			formset,
		})
	}

	pub fn config(&self) -> &InlineFormSetConfig<P, M> {
		&self.config
	}

	/// The parent record
	pub fn instance(&self) -> &P {
		&self.instance
	}

	/// Replace the parent, typically once it has been saved and has a key
	///
	/// New children are attached to this parent on the next save.
	pub fn set_instance(&mut self, instance: P) {
		self.formset.set_parent_key(instance.primary_key());
		self.instance = instance;
	}

	pub fn fk(&self) -> &FieldMetadata {
		&self.config.fk
	}

	/// The underlying child formset
	pub fn formset(&self) -> &ModelFormSet<M> {
		&self.formset
	}

	pub fn formset_mut(&mut self) -> &mut ModelFormSet<M> {
		&mut self.formset
	}

	pub fn prefix(&self) -> &str {
		self.formset.prefix()
	}

	pub fn forms(&self) -> &[ModelForm<M>] {
		self.formset.forms()
	}

	pub fn total_form_count(&self) -> usize {
		self.formset.total_form_count()
	}

	pub fn initial_form_count(&self) -> usize {
		self.formset.initial_form_count()
	}

	/// Children of the parent being edited
	pub fn get_queryset(&self) -> &[M] {
		self.formset.get_queryset()
	}

	pub fn management_form(&self) -> ManagementForm {
		self.formset.management_form()
	}

	pub fn empty_form(&self) -> ModelForm<M> {
		self.formset.empty_form()
	}

	pub fn is_valid<S: RecordStore<M>>(&mut self, store: &S) -> StoreResult<bool> {
		self.formset.is_valid(store)
	}

	pub fn errors(&self) -> Vec<HashMap<String, Vec<String>>> {
		self.formset.errors()
	}

	pub fn non_form_errors(&self) -> &[String] {
		self.formset.non_form_errors()
	}

	/// Save the children, attaching new ones to the parent
	pub fn save<S: RecordStore<M>>(&mut self, store: &mut S, commit: bool) -> FormSetResult<Vec<M>> {
		self.formset.save(store, commit)
	}

	pub fn save_related<S: RecordStore<M>>(&mut self, store: &mut S, records: &[M]) -> FormSetResult<()> {
		self.formset.save_related(store, records)
	}

	pub fn new_objects(&self) -> &[M] {
		self.formset.new_objects()
	}

	pub fn changed_objects(&self) -> &[(M, Vec<String>)] {
		self.formset.changed_objects()
	}

	pub fn deleted_objects(&self) -> &[M] {
		self.formset.deleted_objects()
	}
}
