//! Declarative record metadata
//!
//! A record type describes its fields once through [`ModelMetadata`]. Form
//! construction, uniqueness checks and the in-memory store all read from it.

use crate::constraints::{DateScope, DateUniqueCheck, UniqueConstraint};
use crate::model::capfirst;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage kind of a record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
	Char {
		max_length: Option<usize>,
	},
	Integer,
	Decimal {
		max_digits: Option<usize>,
		decimal_places: Option<usize>,
	},
	Boolean,
	Date,
	/// Reference to a record of the model named `to`
	ForeignKey {
		to: String,
		unique: bool,
	},
	/// Set of references to records of the model named `to`, kept by the store
	ManyToMany {
		to: String,
	},
}

impl FieldKind {
	pub fn char(max_length: usize) -> Self {
		FieldKind::Char {
			max_length: Some(max_length),
		}
	}

	pub fn decimal(max_digits: usize, decimal_places: usize) -> Self {
		FieldKind::Decimal {
			max_digits: Some(max_digits),
			decimal_places: Some(decimal_places),
		}
	}

	pub fn foreign_key(to: impl Into<String>) -> Self {
		FieldKind::ForeignKey {
			to: to.into(),
			unique: false,
		}
	}

	/// A foreign key that may be referenced by one record at most
	pub fn one_to_one(to: impl Into<String>) -> Self {
		FieldKind::ForeignKey {
			to: to.into(),
			unique: true,
		}
	}

	pub fn many_to_many(to: impl Into<String>) -> Self {
		FieldKind::ManyToMany { to: to.into() }
	}

	pub fn is_relation(&self) -> bool {
		matches!(
			self,
			FieldKind::ForeignKey { .. } | FieldKind::ManyToMany { .. }
		)
	}
}

/// Metadata about a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
	pub name: String,
	pub kind: FieldKind,
	pub primary_key: bool,
	/// Key generated by the store on insert
	pub auto: bool,
	pub unique: bool,
	pub blank: bool,
	pub null: bool,
	pub editable: bool,
	pub default: Option<Value>,
	pub verbose_name: Option<String>,
	pub unique_for_date: Option<String>,
	pub unique_for_year: Option<String>,
	pub unique_for_month: Option<String>,
}

impl FieldMetadata {
	/// Creates a new FieldMetadata
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::{FieldKind, FieldMetadata};
	///
	/// let field = FieldMetadata::new("slug", FieldKind::char(50));
	/// assert_eq!(field.name, "slug");
	/// assert!(!field.primary_key);
	/// assert!(field.editable);
	/// ```
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			primary_key: false,
			auto: false,
			unique: false,
			blank: false,
			null: false,
			editable: true,
			default: None,
			verbose_name: None,
			unique_for_date: None,
			unique_for_year: None,
			unique_for_month: None,
		}
	}

	/// Creates an auto-incrementing integer primary key
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::FieldMetadata;
	///
	/// let field = FieldMetadata::auto_key("id");
	/// assert!(field.primary_key);
	/// assert!(field.auto);
	/// assert!(field.unique);
	/// ```
	pub fn auto_key(name: impl Into<String>) -> Self {
		let mut field = Self::new(name, FieldKind::Integer);
		field.primary_key = true;
		field.auto = true;
		field.unique = true;
		field.blank = true;
		field
	}

	/// Sets the primary_key flag; a primary key is always unique
	pub fn primary_key(mut self, primary_key: bool) -> Self {
		self.primary_key = primary_key;
		if primary_key {
			self.unique = true;
		}
		self
	}

	/// Sets the unique flag
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::{FieldKind, FieldMetadata};
	///
	/// let field = FieldMetadata::new("slug", FieldKind::char(50)).unique(true);
	/// assert!(field.unique);
	/// ```
	pub fn unique(mut self, unique: bool) -> Self {
		self.unique = unique;
		self
	}

	pub fn blank(mut self, blank: bool) -> Self {
		self.blank = blank;
		self
	}

	pub fn null(mut self, null: bool) -> Self {
		self.null = null;
		self
	}

	pub fn editable(mut self, editable: bool) -> Self {
		self.editable = editable;
		self
	}

	pub fn default_value(mut self, default: Value) -> Self {
		self.default = Some(default);
		self
	}

	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	/// Require this field to be unique per calendar day of `date_field`
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::{FieldKind, FieldMetadata};
	///
	/// let field = FieldMetadata::new("title", FieldKind::char(50)).unique_for_date("posted");
	/// assert_eq!(field.unique_for_date.as_deref(), Some("posted"));
	/// ```
	pub fn unique_for_date(mut self, date_field: impl Into<String>) -> Self {
		self.unique_for_date = Some(date_field.into());
		self
	}

	pub fn unique_for_year(mut self, date_field: impl Into<String>) -> Self {
		self.unique_for_year = Some(date_field.into());
		self
	}

	pub fn unique_for_month(mut self, date_field: impl Into<String>) -> Self {
		self.unique_for_month = Some(date_field.into());
		self
	}

	/// Human readable label, e.g. `"Birth date"` for `birth_date`
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::{FieldKind, FieldMetadata};
	///
	/// assert_eq!(FieldMetadata::new("birth_date", FieldKind::Date).label(), "Birth date");
	/// assert_eq!(
	///     FieldMetadata::new("qty", FieldKind::Integer).verbose_name("quantity").label(),
	///     "Quantity"
	/// );
	/// ```
	pub fn label(&self) -> String {
		match &self.verbose_name {
			Some(verbose) => capfirst(verbose),
			None => capfirst(&self.name.replace('_', " ")),
		}
	}

	pub fn is_many_to_many(&self) -> bool {
		matches!(self.kind, FieldKind::ManyToMany { .. })
	}

	/// Name of the model this field references, if it is a relation
	pub fn related_model(&self) -> Option<&str> {
		match &self.kind {
			FieldKind::ForeignKey { to, .. } | FieldKind::ManyToMany { to } => Some(to),
			_ => None,
		}
	}

	/// Date-scoped uniqueness rules declared on this field
	pub fn date_checks(&self) -> Vec<DateUniqueCheck> {
		let scoped = [
			(DateScope::Date, &self.unique_for_date),
			(DateScope::Year, &self.unique_for_year),
			(DateScope::Month, &self.unique_for_month),
		];
		scoped
			.into_iter()
			.filter_map(|(scope, date_field)| {
				date_field
					.as_ref()
					.map(|date_field| DateUniqueCheck::new(&self.name, scope, date_field))
			})
			.collect()
	}
}

/// Metadata for a record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
	pub name: String,
	pub verbose_name: Option<String>,
	pub fields: Vec<FieldMetadata>,
	pub unique_together: Vec<UniqueConstraint>,
	pub ordering: Vec<String>,
}

impl ModelMetadata {
	/// Creates metadata for the model `name`
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::metadata::{FieldKind, FieldMetadata, ModelMetadata};
	///
	/// let meta = ModelMetadata::new("Book")
	///     .with_field(FieldMetadata::auto_key("id"))
	///     .with_field(FieldMetadata::new("author", FieldKind::foreign_key("Author")))
	///     .with_field(FieldMetadata::new("title", FieldKind::char(100)));
	///
	/// assert_eq!(meta.pk_name(), "id");
	/// assert_eq!(meta.field_names(), vec!["id", "author", "title"]);
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			verbose_name: None,
			fields: Vec::new(),
			unique_together: Vec::new(),
			ordering: Vec::new(),
		}
	}

	pub fn with_field(mut self, field: FieldMetadata) -> Self {
		self.fields.push(field);
		self
	}

	pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	pub fn with_unique_together(mut self, constraint: UniqueConstraint) -> Self {
		self.unique_together.push(constraint);
		self
	}

	pub fn with_ordering(mut self, ordering: &[&str]) -> Self {
		self.ordering = ordering.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn field_names(&self) -> Vec<&str> {
		self.fields.iter().map(|f| f.name.as_str()).collect()
	}

	pub fn primary_key(&self) -> Option<&FieldMetadata> {
		self.fields.iter().find(|f| f.primary_key)
	}

	/// Name of the primary key field, `"id"` when none is declared
	pub fn pk_name(&self) -> &str {
		self.primary_key().map(|f| f.name.as_str()).unwrap_or("id")
	}

	/// Display name used in messages, e.g. `"Product"`
	pub fn display_name(&self) -> String {
		capfirst(self.verbose_name.as_deref().unwrap_or(&self.name))
	}

	/// Foreign keys of this model pointing at the model named `model`
	pub fn foreign_keys_to(&self, model: &str) -> Vec<&FieldMetadata> {
		self.fields
			.iter()
			.filter(|f| matches!(&f.kind, FieldKind::ForeignKey { to, .. } if to == model))
			.collect()
	}

	/// Field tuples that must be unique, excluding any that touch `exclude`
	///
	/// Unique-together tuples come first, then single unique fields in
	/// declaration order.
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::constraints::UniqueConstraint;
	/// use formset_db::metadata::{FieldKind, FieldMetadata, ModelMetadata};
	///
	/// let meta = ModelMetadata::new("Price")
	///     .with_field(FieldMetadata::auto_key("id"))
	///     .with_field(FieldMetadata::new("price", FieldKind::decimal(10, 2)))
	///     .with_field(FieldMetadata::new("quantity", FieldKind::Integer))
	///     .with_unique_together(UniqueConstraint::together(&["price", "quantity"]));
	///
	/// let checks = meta.unique_checks(&["id"]);
	/// assert_eq!(checks, vec![vec!["price".to_string(), "quantity".to_string()]]);
	/// ```
	pub fn unique_checks(&self, exclude: &[&str]) -> Vec<Vec<String>> {
		let excluded = |name: &String| exclude.contains(&name.as_str());
		let mut checks: Vec<Vec<String>> = self
			.unique_together
			.iter()
			.filter(|c| !c.fields.iter().any(excluded))
			.map(|c| c.fields.clone())
			.collect();
		checks.extend(
			self.fields
				.iter()
				.filter(|f| f.unique && !excluded(&f.name))
				.map(|f| vec![f.name.clone()]),
		);
		checks
	}

	/// Date-scoped uniqueness rules whose fields are not in `exclude`
	pub fn date_checks(&self, exclude: &[&str]) -> Vec<DateUniqueCheck> {
		self.fields
			.iter()
			.filter(|f| !exclude.contains(&f.name.as_str()))
			.flat_map(|f| f.date_checks())
			.filter(|check| !exclude.contains(&check.date_field.as_str()))
			.collect()
	}
}
