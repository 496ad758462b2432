//! Model formset tests
//!
//! Binding, validation and saving of model formsets against the in-memory
//! store.

use formset_db::{MemoryStore, Model, Query, RecordStore};
use formset_forms::{
	FormData, FormError, FormSetError, FormSetOptions, FormSetSettings, ModelFormSet,
	ModelFormSetBuilder,
};
use formset_test::fixtures::{Author, AuthorMeeting, Post, Price, Product};
use formset_test::{init_test_logging, management_data, payload, with_slot};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn poets() -> MemoryStore<Author> {
	init_test_logging();
	MemoryStore::with_records([
		Author::new(1, "Charles Baudelaire"),
		Author::new(2, "Paul Verlaine"),
	])
	.unwrap()
}

fn bound<M: Model>(
	builder: ModelFormSetBuilder<M>,
	store: &MemoryStore<M>,
	data: FormData,
) -> ModelFormSet<M> {
	ModelFormSet::new(
		builder.build().unwrap(),
		store,
		FormSetOptions::new().with_data(data),
	)
	.unwrap()
}

fn names(store: &MemoryStore<Author>) -> Vec<String> {
	store
		.fetch(&Query::new())
		.unwrap()
		.into_iter()
		.map(|a| a.name)
		.collect()
}

#[rstest]
fn test_new_records_are_created() {
	// Arrange
	init_test_logging();
	let mut store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 3, 0);
	with_slot(&mut data, "form", 0, &[("name", "Charles Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("name", "Arthur Rimbaud")]);
	with_slot(&mut data, "form", 2, &[("name", "")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]).with_extra(3),
		&store,
		data,
	);

	// Act
	assert!(formset.is_valid(&store).unwrap());
	let saved = formset.save(&mut store, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 2);
	assert!(saved.iter().all(|a| a.id.is_some()));
	assert_eq!(formset.new_objects().len(), 2);
	assert_eq!(names(&store), vec!["Arthur Rimbaud", "Charles Baudelaire"]);
}

#[rstest]
fn test_existing_records_are_updated(mut poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("form", 3, 2);
	with_slot(&mut data, "form", 0, &[("id", "1"), ("name", "Charles Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("id", "2"), ("name", "Paul Verlaine (bis)")]);
	with_slot(&mut data, "form", 2, &[("name", "Walt Whitman")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]),
		&poets,
		data,
	);

	// Act
	let saved = formset.save(&mut poets, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 2);
	assert_eq!(saved[0].name, "Paul Verlaine (bis)");
	assert_eq!(saved[1].name, "Walt Whitman");
	let changed = formset.changed_objects();
	assert_eq!(changed.len(), 1);
	assert_eq!(changed[0].0.id, Some(2));
	assert_eq!(changed[0].1, vec!["name".to_string()]);
	assert_eq!(
		poets.get(&json!(2)).unwrap().map(|a| a.name),
		Some("Paul Verlaine (bis)".to_string())
	);
	assert_eq!(poets.len(), 3);
}

#[rstest]
fn test_unchanged_submission_saves_nothing(mut poets: MemoryStore<Author>) {
	// Arrange
	let config = ModelFormSetBuilder::<Author>::new()
		.with_fields(&["name"])
		.build()
		.unwrap();
	let rendered = ModelFormSet::new(config.clone(), &poets, FormSetOptions::new()).unwrap();
	let mut data = rendered.management_form().to_data(rendered.prefix());
	for slot in rendered.forms() {
		let form = slot.form();
		for field in form.fields() {
			if let Some(value) = form.initial_for(field.name()) {
				data.insert(form.add_prefix_to_field_name(field.name()), value.clone());
			}
		}
	}

	// Act
	let mut formset =
		ModelFormSet::new(config, &poets, FormSetOptions::new().with_data(data)).unwrap();
	let saved = formset.save(&mut poets, true).unwrap();

	// Assert
	assert!(!formset.has_changed());
	assert!(saved.is_empty());
	assert_eq!(poets.len(), 2);
}

#[rstest]
fn test_marked_slots_are_deleted_even_when_invalid(mut poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("form", 3, 2);
	with_slot(&mut data, "form", 0, &[("id", "1"), ("name", "Charles Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("id", "2"), ("name", ""), ("DELETE", "on")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_can_delete(true),
		&poets,
		data,
	);

	// Act
	assert!(formset.is_valid(&poets).unwrap());
	let saved = formset.save(&mut poets, true).unwrap();

	// Assert
	assert!(saved.is_empty());
	assert_eq!(formset.deleted_forms().len(), 1);
	assert_eq!(formset.deleted_objects().len(), 1);
	assert_eq!(formset.deleted_objects()[0].id, Some(2));
	assert!(formset.errors()[1].is_empty());
	assert_eq!(names(&poets), vec!["Charles Baudelaire"]);
}

#[rstest]
fn test_delete_without_commit_leaves_store(mut poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("form", 2, 2);
	with_slot(&mut data, "form", 0, &[("id", "1"), ("name", "Charles Baudelaire"), ("DELETE", "on")]);
	with_slot(&mut data, "form", 1, &[("id", "2"), ("name", "Paul Verlaine")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_can_delete(true),
		&poets,
		data,
	);

	// Act
	formset.save(&mut poets, false).unwrap();

	// Assert
	assert_eq!(formset.deleted_objects().len(), 1);
	assert_eq!(poets.len(), 2);
}

#[rstest]
fn test_deleting_unknown_key_is_a_no_op(mut poets: MemoryStore<Author>) -> anyhow::Result<()> {
	// Arrange
	let mut data = management_data("form", 1, 1);
	with_slot(&mut data, "form", 0, &[("id", "99"), ("name", "Nobody"), ("DELETE", "on")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_can_delete(true),
		&poets,
		data,
	);

	// Act
	let valid = formset.is_valid(&poets)?;
	let saved = formset.save(&mut poets, true)?;

	// Assert
	assert!(valid);
	assert!(saved.is_empty());
	assert!(formset.deleted_objects().is_empty());
	assert_eq!(poets.len(), 2);
	Ok(())
}

#[rstest]
#[case(2, true, Some("Please submit at most 2 forms."))]
#[case(1, true, Some("Please submit at most 1 form."))]
#[case(2, false, None)]
fn test_validate_max(
	#[case] max_num: usize,
	#[case] validate_max: bool,
	#[case] expected: Option<&str>,
) {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 3, 0);
	for (i, name) in ["Charles Baudelaire", "Paul Verlaine", "Walt Whitman"].iter().enumerate() {
		with_slot(&mut data, "form", i, &[("name", name)]);
	}
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_max_num(max_num)
			.with_validate_max(validate_max),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	let expected: Vec<String> = expected.into_iter().map(str::to_string).collect();
	assert_eq!(valid, expected.is_empty());
	assert_eq!(formset.non_form_errors(), expected.as_slice());
	assert_eq!(formset.total_error_count(), expected.len());
}

#[rstest]
#[case(3, Some("Please submit at most 2 forms."))]
#[case(1, Some("Please submit at least 2 forms."))]
#[case(2, None)]
fn test_min_num_equal_to_max_num(#[case] filled: usize, #[case] expected: Option<&str>) {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let mut data = management_data("form", filled, 0);
	let authors = ["Charles Baudelaire", "Paul Verlaine", "Walt Whitman"];
	for (i, name) in authors.iter().take(filled).enumerate() {
		with_slot(&mut data, "form", i, &[("name", name)]);
	}
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_min_num(2)
			.with_max_num(2)
			.with_validate_min(true)
			.with_validate_max(true),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	let expected: Vec<String> = expected.into_iter().map(str::to_string).collect();
	assert_eq!(valid, expected.is_empty());
	assert_eq!(formset.non_form_errors(), expected.as_slice());
}

#[rstest]
fn test_max_num_without_validation_accepts_more() {
	// Arrange
	let mut store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 2, 0);
	with_slot(&mut data, "form", 0, &[("name", "Charles Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("name", "Paul Verlaine")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]).with_max_num(1),
		&store,
		data,
	);

	// Act
	let saved = formset.save(&mut store, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 2);
}

#[rstest]
fn test_validate_min() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 1, 0);
	with_slot(&mut data, "form", 0, &[("name", "Charles Baudelaire")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_min_num(2)
			.with_validate_min(true),
		&store,
		data,
	);

	// Act & Assert
	assert!(!formset.is_valid(&store).unwrap());
	assert_eq!(
		formset.non_form_errors(),
		&["Please submit at least 2 forms.".to_string()]
	);
}

#[rstest]
fn test_slots_below_min_num_must_be_filled() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let data = management_data("form", 2, 0);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]).with_min_num(1),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	assert!(!valid);
	let errors = formset.errors();
	assert_eq!(
		errors[0].get("name"),
		Some(&vec!["This field is required.".to_string()])
	);
	assert!(errors[1].is_empty());
}

#[rstest]
fn test_absolute_max_caps_allocated_slots() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let data = payload! {
		"form-TOTAL_FORMS" => "2001",
		"form-INITIAL_FORMS" => "0",
	};

	// Act
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]),
		&store,
		data,
	);

	// Assert
	assert_eq!(formset.total_form_count(), 2000);
	assert!(!formset.is_valid(&store).unwrap());
	assert_eq!(
		formset.non_form_errors(),
		&["Please submit at most 1000 forms.".to_string()]
	);
}

#[rstest]
fn test_declared_total_over_absolute_max_reports_max_num() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let data = management_data("form", 101, 0);

	// Act
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_max_num(20)
			.with_absolute_max(100),
		&store,
		data,
	);

	// Assert
	assert_eq!(formset.total_form_count(), 100);
	assert!(!formset.is_valid(&store).unwrap());
	assert_eq!(
		formset.non_form_errors(),
		&["Please submit at most 20 forms.".to_string()]
	);
}

#[rstest]
fn test_duplicate_unique_field() {
	// Arrange
	let store = MemoryStore::<Product>::new();
	let mut data = management_data("form", 2, 0);
	with_slot(&mut data, "form", 0, &[("slug", "car-red")]);
	with_slot(&mut data, "form", 1, &[("slug", "car-red")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["slug"]),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	assert!(!valid);
	assert_eq!(
		formset.non_form_errors(),
		&["Please correct the duplicate data for slug.".to_string()]
	);
	for errors in formset.errors() {
		assert_eq!(
			errors.get("_all"),
			Some(&vec!["Please correct the duplicate values below.".to_string()])
		);
	}
}

#[rstest]
fn test_unique_field_against_stored_records() {
	// Arrange
	let store = MemoryStore::with_records([Product::new(1, "car-red")]).unwrap();
	let mut data = management_data("form", 2, 1);
	with_slot(&mut data, "form", 0, &[("id", "1"), ("slug", "car-red")]);
	with_slot(&mut data, "form", 1, &[("slug", "car-red")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["slug"]),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	assert!(!valid);
	let errors = formset.errors();
	assert!(errors[0].is_empty());
	assert_eq!(
		errors[1].get("slug"),
		Some(&vec!["Product with this Slug already exists.".to_string()])
	);
	assert!(formset.non_form_errors().is_empty());
}

#[rstest]
fn test_duplicate_unique_together() {
	// Arrange
	let store = MemoryStore::<Price>::new();
	let mut data = management_data("form", 3, 0);
	with_slot(&mut data, "form", 0, &[("price", "12.00"), ("quantity", "1")]);
	with_slot(&mut data, "form", 1, &[("price", "12"), ("quantity", "1")]);
	with_slot(&mut data, "form", 2, &[("price", "12.00"), ("quantity", "2")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["price", "quantity"]),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	assert!(!valid);
	assert_eq!(
		formset.non_form_errors(),
		&["Please correct the duplicate data for price and quantity, which must be unique."
			.to_string()]
	);
	assert!(formset.errors()[2].is_empty());
}

#[rstest]
fn test_duplicate_unique_for_date() {
	// Arrange
	let store = MemoryStore::<Post>::new();
	let mut data = management_data("form", 2, 0);
	with_slot(
		&mut data,
		"form",
		0,
		&[("title", "Release 1.0 is out"), ("slug", "release-1-0"), ("subtitle", "Finally"), ("posted", "2008-09-03")],
	);
	with_slot(
		&mut data,
		"form",
		1,
		&[("title", "Release 1.0 is out"), ("slug", "release-1-0-b"), ("subtitle", "Again"), ("posted", "2008-09-03")],
	);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["title", "slug", "subtitle", "posted"]),
		&store,
		data,
	);

	// Act
	let valid = formset.is_valid(&store).unwrap();

	// Assert
	assert!(!valid);
	assert_eq!(
		formset.non_form_errors(),
		&["Please correct the duplicate data for title which must be unique for the date in posted."
			.to_string()]
	);
}

#[rstest]
fn test_edit_only_ignores_new_slots(mut poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("form", 3, 2);
	with_slot(&mut data, "form", 0, &[("id", "1"), ("name", "Charles Pierre Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("id", "2"), ("name", "Paul Verlaine")]);
	with_slot(&mut data, "form", 2, &[("name", "Walt Whitman")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_edit_only(true),
		&poets,
		data,
	);

	// Act
	let saved = formset.save(&mut poets, true).unwrap();

	// Assert
	assert_eq!(saved.len(), 1);
	assert!(formset.new_objects().is_empty());
	assert_eq!(names(&poets), vec!["Charles Pierre Baudelaire", "Paul Verlaine"]);
}

#[rstest]
fn test_explicit_queryset_limits_initial_slots(poets: MemoryStore<Author>) {
	// Arrange
	let only = vec![Author::new(2, "Paul Verlaine")];
	let config = ModelFormSetBuilder::<Author>::new()
		.with_fields(&["name"])
		.build()
		.unwrap();

	// Act
	let formset =
		ModelFormSet::new(config, &poets, FormSetOptions::new().with_queryset(only)).unwrap();

	// Assert
	assert_eq!(formset.initial_form_count(), 1);
	assert_eq!(
		formset.forms()[0].form().initial_for("name"),
		Some(&json!("Paul Verlaine"))
	);
	assert_eq!(formset.total_form_count(), 2);
}

#[rstest]
fn test_unknown_key_is_rejected(poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("form", 1, 1);
	with_slot(&mut data, "form", 0, &[("id", "99"), ("name", "Gérard de Nerval")]);
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]),
		&poets,
		data,
	);

	// Act
	let valid = formset.is_valid(&poets).unwrap();

	// Assert
	assert!(!valid);
	assert!(formset.forms()[0].instance().is_none());
	assert!(formset.errors()[0].contains_key("id"));
}

#[rstest]
fn test_prefix_is_respected(mut poets: MemoryStore<Author>) {
	// Arrange
	let mut data = management_data("authors", 1, 0);
	with_slot(&mut data, "authors", 0, &[("name", "Walt Whitman")]);
	let config = ModelFormSetBuilder::<Author>::new()
		.with_fields(&["name"])
		.build()
		.unwrap();
	let mut formset = ModelFormSet::new(
		config,
		&poets,
		FormSetOptions::new().with_data(data).with_prefix("authors"),
	)
	.unwrap();

	// Act
	let saved = formset.save(&mut poets, true).unwrap();

	// Assert
	assert_eq!(saved[0].name, "Walt Whitman");
	assert_eq!(formset.forms()[0].form().prefix(), "authors-0");
}

#[rstest]
fn test_clean_hook_adds_non_form_error() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 3, 0);
	with_slot(&mut data, "form", 0, &[("name", "Charles Baudelaire")]);
	with_slot(&mut data, "form", 1, &[("name", "Paul Verlaine")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_clean(|rows| {
				if rows.len() > 1 {
					return Err(FormError::Validation("One author per request.".to_string()));
				}
				Ok(())
			}),
		&store,
		data,
	);

	// Act & Assert
	assert!(!formset.is_valid(&store).unwrap());
	assert_eq!(formset.non_form_errors(), &["One author per request.".to_string()]);
}

#[rstest]
fn test_clean_form_hook_runs_per_slot() {
	// Arrange
	let store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 1, 0);
	with_slot(&mut data, "form", 0, &[("name", "anonymous")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_clean_form(|cleaned| {
				if cleaned.get("name") == Some(&json!("anonymous")) {
					return Err(FormError::Validation("Name the author.".to_string()));
				}
				Ok(())
			}),
		&store,
		data,
	);

	// Act & Assert
	assert!(!formset.is_valid(&store).unwrap());
	assert_eq!(formset.forms()[0].non_field_errors(), &["Name the author.".to_string()]);
}

#[rstest]
fn test_pre_save_hook_sees_every_record() {
	// Arrange
	let mut store = MemoryStore::<Author>::new();
	let mut data = management_data("form", 1, 0);
	with_slot(&mut data, "form", 0, &[("name", "walt whitman")]);
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name"])
			.with_pre_save(|author: &mut Author| author.name = author.name.to_uppercase()),
		&store,
		data,
	);

	// Act
	let saved = formset.save(&mut store, true).unwrap();

	// Assert
	assert_eq!(saved[0].name, "WALT WHITMAN");
	assert_eq!(names(&store), vec!["WALT WHITMAN"]);
}

#[rstest]
fn test_invalid_formset_refuses_to_save() {
	// Arrange
	let mut store = MemoryStore::<Author>::new();
	let data = payload! { "form-0-name" => "Walt Whitman" };
	let mut formset = bound(
		ModelFormSetBuilder::new().with_fields(&["name"]),
		&store,
		data,
	);

	// Act
	let err = formset.save(&mut store, true).unwrap_err();

	// Assert
	assert!(matches!(err, FormSetError::InvalidData { .. }));
	assert_eq!(
		err.to_string(),
		"The Author could not be changed because the data didn't validate."
	);
	assert!(store.is_empty());
}

#[rstest]
fn test_commit_false_then_save_related() {
	// Arrange
	let authors = vec![
		Author::new(1, "Charles Baudelaire"),
		Author::new(2, "Paul Verlaine"),
	];
	let mut store = MemoryStore::<AuthorMeeting>::new();
	let mut data = management_data("form", 1, 0);
	with_slot(&mut data, "form", 0, &[("name", "Poetry circle")]);
	data.insert("form-0-authors".to_string(), json!(["1", "2"]));
	let mut formset = bound(
		ModelFormSetBuilder::new()
			.with_fields(&["name", "authors"])
			.with_related_choices("authors", &authors),
		&store,
		data,
	);

	// Act
	let mut saved = formset.save(&mut store, false).unwrap();
	assert!(store.is_empty());
	for meeting in &mut saved {
		store.insert(meeting).unwrap();
	}
	let mismatch = formset.save_related(&mut store, &[]).unwrap_err();
	formset.save_related(&mut store, &saved).unwrap();

	// Assert
	assert!(matches!(
		mismatch,
		FormSetError::RelatedMismatch { expected: 1, actual: 0 }
	));
	let pk = saved[0].primary_key().unwrap();
	assert_eq!(
		store.related(&pk, "authors").unwrap(),
		vec![json!(1), json!(2)]
	);
}

#[rstest]
fn test_settings_configure_the_builder(mut poets: MemoryStore<Author>) {
	// Arrange
	let settings = FormSetSettings::from_toml_str(
		r#"
		fields = ["name"]
		extra = 0
		can_delete = true
		prefix = "poets"
		"#,
	)
	.unwrap();
	let config = ModelFormSetBuilder::<Author>::new()
		.with_settings(&settings)
		.build()
		.unwrap();
	let mut data = management_data("poets", 2, 2);
	with_slot(&mut data, "poets", 0, &[("id", "1"), ("name", "Charles Baudelaire")]);
	with_slot(&mut data, "poets", 1, &[("id", "2"), ("name", "Paul Verlaine"), ("DELETE", "on")]);

	// Act
	let unbound = ModelFormSet::new(config.clone(), &poets, FormSetOptions::new()).unwrap();
	let mut formset =
		ModelFormSet::new(config, &poets, FormSetOptions::new().with_data(data)).unwrap();
	formset.save(&mut poets, true).unwrap();

	// Assert
	assert_eq!(unbound.total_form_count(), 2);
	assert_eq!(unbound.prefix(), "poets");
	assert_eq!(names(&poets), vec!["Charles Baudelaire"]);
}
