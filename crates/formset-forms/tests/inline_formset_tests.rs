//! Inline formset tests
//!
//! Children edited through their parent: foreign key binding, save-as-new,
//! one-to-one children and duplicate detection across sibling slots.

use formset_db::{MemoryStore, Model, Query, RecordStore};
use formset_forms::{
	ConfigError, FormSetError, FormSetOptions, InlineFormSet, InlineFormSetBuilder,
	InlineFormSetConfig, ModelFormSetBuilder,
};
use formset_test::fixtures::{Author, Book, Owner, OwnerProfile, Poem, Poet, Translation};
use formset_test::{init_test_logging, management_data, with_slot};
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;

#[fixture]
fn poems() -> MemoryStore<Poem> {
	init_test_logging();
	MemoryStore::with_records([
		Poem::new(1, 1, "The Raven"),
		Poem::new(2, 1, "Annabel Lee"),
		Poem::new(3, 2, "Ozymandias"),
	])
	.unwrap()
}

#[fixture]
fn poem_config() -> Arc<InlineFormSetConfig<Poet, Poem>> {
	InlineFormSetBuilder::new(ModelFormSetBuilder::new().with_fields(&["name"]))
		.build()
		.unwrap()
}

#[rstest]
fn test_only_children_of_parent_are_edited(
	poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Act
	let formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(1, "Edgar Allen Poe"),
		FormSetOptions::new(),
	)
	.unwrap();

	// Assert
	assert_eq!(formset.prefix(), "poem_set");
	assert_eq!(formset.initial_form_count(), 2);
	assert_eq!(formset.total_form_count(), 5);
	assert!(formset.get_queryset().iter().all(|p| p.poet == Some(1)));
	let first = formset.forms()[0].form();
	assert_eq!(first.initial_for("poet"), Some(&json!(1)));
	assert!(first.get_field("DELETE").is_some());
	let key = first.get_bound_field("id").unwrap();
	assert!(key.is_hidden());
	assert_eq!(key.html_name(), "poem_set-0-id");
	assert_eq!(key.value(), Some(&json!(1)));
}

#[rstest]
fn test_new_children_point_at_parent(
	mut poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut data = management_data("poem_set", 3, 0);
	with_slot(&mut data, "poem_set", 0, &[("name", "Ozymandias II"), ("poet", "9")]);
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(2, "Percy Bysshe Shelley"),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();

	// Act
	let saved = formset.save(&mut poems, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 1);
	assert_eq!(saved[0].poet, Some(2));
	let shelley = poems
		.fetch(&Query::new().filter("poet", json!(2)))
		.unwrap();
	assert_eq!(shelley.len(), 2);
}

#[rstest]
fn test_duplicate_names_between_siblings(
	poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut data = management_data("poem_set", 2, 0);
	with_slot(&mut data, "poem_set", 0, &[("name", "Sonnet")]);
	with_slot(&mut data, "poem_set", 1, &[("name", "Sonnet")]);
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(1, "Edgar Allen Poe"),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();

	// Act
	let valid = formset.is_valid(&poems).unwrap();

	// Assert
	assert!(!valid);
	assert_eq!(
		formset.non_form_errors(),
		&["Please correct the duplicate data for poet and name, which must be unique.".to_string()]
	);
}

#[rstest]
fn test_duplicate_of_stored_sibling(
	poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut data = management_data("poem_set", 1, 0);
	with_slot(&mut data, "poem_set", 0, &[("name", "The Raven")]);
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(1, "Edgar Allen Poe"),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();

	// Act
	let valid = formset.is_valid(&poems).unwrap();

	// Assert
	assert!(!valid);
	assert_eq!(
		formset.forms()[0].non_field_errors(),
		&["Poem with this Poet and Name already exists.".to_string()]
	);
}

#[rstest]
fn test_save_as_new_copies_children(
	mut poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut data = management_data("poem_set", 2, 2);
	with_slot(&mut data, "poem_set", 0, &[("id", "1"), ("poet", "1"), ("name", "The Raven")]);
	with_slot(&mut data, "poem_set", 1, &[("id", "2"), ("poet", "1"), ("name", "Annabel Lee")]);

	// Act
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(3, "Edgar Allen Poe (copy)"),
		FormSetOptions::new().with_data(data).with_save_as_new(true),
	)
	.unwrap();
	let saved = formset.save(&mut poems, true).unwrap();

	// Assert
	assert_eq!(formset.initial_form_count(), 0);
	assert_eq!(saved.len(), 2);
	assert!(saved.iter().all(|p| p.poet == Some(3)));
	assert!(saved.iter().all(|p| p.id.is_some_and(|id| id > 3)));
	assert_eq!(poems.len(), 5);
	assert_eq!(poems.get(&json!(1)).unwrap().and_then(|p| p.poet), Some(1));
}

#[rstest]
fn test_unsaved_parent_blocks_save_until_set(
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut poems = MemoryStore::<Poem>::new();
	let mut poets = MemoryStore::<Poet>::new();
	let mut data = management_data("poem_set", 1, 0);
	with_slot(&mut data, "poem_set", 0, &[("name", "Leaves of Grass")]);
	let mut poet = Poet {
		id: None,
		name: "Walt Whitman".to_string(),
	};
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		poet.clone(),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();

	// Act
	let unsaved = formset.save(&mut poems, true).unwrap_err();
	poets.insert(&mut poet).unwrap();
	formset.set_instance(poet.clone());
	let saved = formset.save(&mut poems, true).unwrap();

	// Assert
	assert!(matches!(unsaved, FormSetError::UnsavedParent { .. }));
	assert!(
		unsaved
			.to_string()
			.contains("unsaved related object 'Poet'")
	);
	assert_eq!(saved[0].poet, poet.id);
	assert_eq!(poems.len(), 1);
}

#[rstest]
fn test_deleting_a_vanished_child_is_ignored(
	mut poems: MemoryStore<Poem>,
	poem_config: Arc<InlineFormSetConfig<Poet, Poem>>,
) {
	// Arrange
	let mut data = management_data("poem_set", 2, 2);
	with_slot(&mut data, "poem_set", 0, &[("id", "1"), ("name", "The Raven"), ("DELETE", "on")]);
	with_slot(&mut data, "poem_set", 1, &[("id", "2"), ("name", "Annabel Lee")]);
	let mut formset = InlineFormSet::new(
		poem_config,
		&poems,
		Poet::new(1, "Edgar Allen Poe"),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();
	poems.delete(&json!(1)).unwrap();

	// Act
	assert!(formset.is_valid(&poems).unwrap());
	let saved = formset.save(&mut poems, true).unwrap();

	// Assert
	assert!(saved.is_empty());
	assert_eq!(formset.deleted_objects().len(), 1);
	assert_eq!(poems.len(), 2);
}

#[rstest]
fn test_one_to_one_child_gets_a_single_slot() {
	// Arrange
	let config = InlineFormSetBuilder::<Owner, OwnerProfile>::new(
		ModelFormSetBuilder::new().with_fields(&["age"]),
	)
	.build()
	.unwrap();
	let empty = MemoryStore::<OwnerProfile>::new();
	let existing = MemoryStore::with_records([OwnerProfile::new(1, 1, 10)]).unwrap();

	// Act
	let without = InlineFormSet::new(
		config.clone(),
		&empty,
		Owner::new(1, "Joe Perry"),
		FormSetOptions::new(),
	)
	.unwrap();
	let with = InlineFormSet::new(config, &existing, Owner::new(1, "Joe Perry"), FormSetOptions::new())
		.unwrap();

	// Assert
	assert_eq!(without.total_form_count(), 1);
	assert_eq!(without.initial_form_count(), 0);
	assert_eq!(with.total_form_count(), 1);
	assert_eq!(with.initial_form_count(), 1);
	assert_eq!(with.forms()[0].form().initial_for("age"), Some(&json!(10)));
}

#[rstest]
fn test_explicit_fk_name_picks_one_of_several() {
	// Act
	let ambiguous = InlineFormSetBuilder::<Author, Translation>::new(
		ModelFormSetBuilder::new().with_fields(&["title"]),
	)
	.build()
	.err()
	.unwrap();
	let chosen = InlineFormSetBuilder::<Author, Translation>::new(
		ModelFormSetBuilder::new().with_fields(&["translator", "title"]),
	)
	.with_fk_name("translator")
	.build()
	.unwrap();

	// Assert
	assert!(matches!(ambiguous, ConfigError::AmbiguousForeignKey { .. }));
	assert_eq!(chosen.fk().name, "translator");
	assert_eq!(chosen.formset().fields, vec!["title".to_string()]);
	assert_eq!(chosen.formset().prefix, "translation_set");
}

#[rstest]
fn test_book_inline_saves_and_reports_changes() {
	// Arrange
	let mut books = MemoryStore::with_records([Book::new(1, 1, "Les Fleurs du Mal")]).unwrap();
	let config = InlineFormSetBuilder::<Author, Book>::new(
		ModelFormSetBuilder::new()
			.with_fields(&["title"])
			.with_extra(1),
	)
	.build()
	.unwrap();
	let mut data = management_data("book_set", 2, 1);
	with_slot(&mut data, "book_set", 0, &[("id", "1"), ("title", "Les Fleurs du mal")]);
	with_slot(&mut data, "book_set", 1, &[("title", "Le Spleen de Paris")]);
	let mut formset = InlineFormSet::new(
		config,
		&books,
		Author::new(1, "Charles Baudelaire"),
		FormSetOptions::new().with_data(data),
	)
	.unwrap();

	// Act
	let saved = formset.save(&mut books, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 2);
	assert_eq!(formset.changed_objects()[0].1, vec!["title".to_string()]);
	assert_eq!(formset.new_objects()[0].author, Some(1));
	assert_eq!(
		books.get(&json!(1)).unwrap().map(|b| b.title),
		Some("Les Fleurs du mal".to_string())
	);
	assert!(formset.instance().primary_key().is_some());
}
