//! Record types used across formset tests
//!
//! | Type | Exercises |
//! |------|-----------|
//! | [`Author`] | plain records |
//! | [`Book`] | foreign key, unique-together with the key |
//! | [`Translation`] | two foreign keys to the same parent |
//! | [`Product`] | single unique field |
//! | [`Price`] | unique-together without a key, decimals |
//! | [`Post`] | date-scoped uniqueness |
//! | [`Poet`] / [`Poem`] | inline children |
//! | [`Owner`] / [`OwnerProfile`] | one-to-one inline child |
//! | [`AuthorMeeting`] | many-to-many |

use formset_db::{FieldKind, FieldMetadata, Model, ModelError, ModelMetadata, UniqueConstraint};
use serde_json::{Value, json};

fn key(id: Option<i64>) -> Value {
	id.map(Value::from).unwrap_or(Value::Null)
}

fn text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

fn integer(field: &str, value: &Value) -> Result<Option<i64>, ModelError> {
	match value {
		Value::Null => Ok(None),
		Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| ModelError::InvalidValue {
			field: field.to_string(),
			reason: format!("{} is not an integer", n),
		}),
		Value::String(s) => s.parse().map(Some).map_err(|_| ModelError::InvalidValue {
			field: field.to_string(),
			reason: format!("'{}' is not an integer", s),
		}),
		other => Err(ModelError::InvalidValue {
			field: field.to_string(),
			reason: format!("{} is not an integer", other),
		}),
	}
}

fn unknown(name: &str) -> Result<(), ModelError> {
	Err(ModelError::UnknownField(name.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
	pub id: Option<i64>,
	pub name: String,
}

impl Author {
	pub fn new(id: i64, name: &str) -> Self {
		Self {
			id: Some(id),
			name: name.to_string(),
		}
	}
}

impl Model for Author {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Author")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("name", FieldKind::char(100)))
			.with_ordering(&["name"])
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"name" => Some(json!(self.name)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"name" => self.name = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}

	fn to_choice_label(&self) -> String {
		self.name.clone()
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
	pub id: Option<i64>,
	pub author: Option<i64>,
	pub title: String,
}

impl Book {
	pub fn new(id: i64, author: i64, title: &str) -> Self {
		Self {
			id: Some(id),
			author: Some(author),
			title: title.to_string(),
		}
	}
}

impl Model for Book {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Book")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("author", FieldKind::foreign_key("Author")))
			.with_field(FieldMetadata::new("title", FieldKind::char(100)))
			.with_unique_together(UniqueConstraint::together(&["author", "title"]))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"author" => Some(key(self.author)),
			"title" => Some(json!(self.title)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"author" => self.author = integer(name, &value)?,
			"title" => self.title = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// A book with both an author and a translator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
	pub id: Option<i64>,
	pub author: Option<i64>,
	pub translator: Option<i64>,
	pub title: String,
}

impl Model for Translation {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Translation")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("author", FieldKind::foreign_key("Author")))
			.with_field(FieldMetadata::new("translator", FieldKind::foreign_key("Author")))
			.with_field(FieldMetadata::new("title", FieldKind::char(100)))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"author" => Some(key(self.author)),
			"translator" => Some(key(self.translator)),
			"title" => Some(json!(self.title)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"author" => self.author = integer(name, &value)?,
			"translator" => self.translator = integer(name, &value)?,
			"title" => self.title = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
	pub id: Option<i64>,
	pub slug: String,
}

impl Product {
	pub fn new(id: i64, slug: &str) -> Self {
		Self {
			id: Some(id),
			slug: slug.to_string(),
		}
	}
}

impl Model for Product {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Product")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("slug", FieldKind::char(50)).unique(true))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"slug" => Some(json!(self.slug)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"slug" => self.slug = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// Price and quantity pairs; decimals are kept as canonical strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Price {
	pub id: Option<i64>,
	pub price: String,
	pub quantity: i64,
}

impl Price {
	pub fn new(id: i64, price: &str, quantity: i64) -> Self {
		Self {
			id: Some(id),
			price: price.to_string(),
			quantity,
		}
	}
}

impl Model for Price {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Price")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("price", FieldKind::decimal(10, 2)))
			.with_field(FieldMetadata::new("quantity", FieldKind::Integer))
			.with_unique_together(UniqueConstraint::together(&["price", "quantity"]))
			.with_ordering(&["price", "quantity"])
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"price" => Some(json!(self.price)),
			"quantity" => Some(json!(self.quantity)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"price" => self.price = text(&value),
			"quantity" => self.quantity = integer(name, &value)?.unwrap_or_default(),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// Titles unique per day, slugs per year and subtitles per month of `posted`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
	pub id: Option<i64>,
	pub title: String,
	pub slug: String,
	pub subtitle: String,
	pub posted: String,
}

impl Post {
	pub fn new(id: i64, title: &str, slug: &str, subtitle: &str, posted: &str) -> Self {
		Self {
			id: Some(id),
			title: title.to_string(),
			slug: slug.to_string(),
			subtitle: subtitle.to_string(),
			posted: posted.to_string(),
		}
	}
}

impl Model for Post {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Post")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("title", FieldKind::char(50)).unique_for_date("posted"))
			.with_field(FieldMetadata::new("slug", FieldKind::char(50)).unique_for_year("posted"))
			.with_field(
				FieldMetadata::new("subtitle", FieldKind::char(50)).unique_for_month("posted"),
			)
			.with_field(FieldMetadata::new("posted", FieldKind::Date))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"title" => Some(json!(self.title)),
			"slug" => Some(json!(self.slug)),
			"subtitle" => Some(json!(self.subtitle)),
			"posted" if self.posted.is_empty() => Some(Value::Null),
			"posted" => Some(json!(self.posted)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"title" => self.title = text(&value),
			"slug" => self.slug = text(&value),
			"subtitle" => self.subtitle = text(&value),
			"posted" => self.posted = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poet {
	pub id: Option<i64>,
	pub name: String,
}

impl Poet {
	pub fn new(id: i64, name: &str) -> Self {
		Self {
			id: Some(id),
			name: name.to_string(),
		}
	}
}

impl Model for Poet {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Poet")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("name", FieldKind::char(100)))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"name" => Some(json!(self.name)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"name" => self.name = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// A poem; names are unique per poet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poem {
	pub id: Option<i64>,
	pub poet: Option<i64>,
	pub name: String,
}

impl Poem {
	pub fn new(id: i64, poet: i64, name: &str) -> Self {
		Self {
			id: Some(id),
			poet: Some(poet),
			name: name.to_string(),
		}
	}
}

impl Model for Poem {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Poem")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("poet", FieldKind::foreign_key("Poet")))
			.with_field(FieldMetadata::new("name", FieldKind::char(100)))
			.with_unique_together(UniqueConstraint::together(&["poet", "name"]))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"poet" => Some(key(self.poet)),
			"name" => Some(json!(self.name)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"poet" => self.poet = integer(name, &value)?,
			"name" => self.name = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Owner {
	pub id: Option<i64>,
	pub name: String,
}

impl Owner {
	pub fn new(id: i64, name: &str) -> Self {
		Self {
			id: Some(id),
			name: name.to_string(),
		}
	}
}

impl Model for Owner {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("Owner")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("name", FieldKind::char(100)))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"name" => Some(json!(self.name)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"name" => self.name = text(&value),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// At most one profile per owner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerProfile {
	pub id: Option<i64>,
	pub owner: Option<i64>,
	pub age: i64,
}

impl OwnerProfile {
	pub fn new(id: i64, owner: i64, age: i64) -> Self {
		Self {
			id: Some(id),
			owner: Some(owner),
			age,
		}
	}
}

impl Model for OwnerProfile {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("OwnerProfile")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("owner", FieldKind::one_to_one("Owner")))
			.with_field(FieldMetadata::new("age", FieldKind::Integer))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"owner" => Some(key(self.owner)),
			"age" => Some(json!(self.age)),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"owner" => self.owner = integer(name, &value)?,
			"age" => self.age = integer(name, &value)?.unwrap_or_default(),
			_ => return unknown(name),
		}
		Ok(())
	}
}

/// A meeting with a many-to-many set of authors kept by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorMeeting {
	pub id: Option<i64>,
	pub name: String,
}

impl AuthorMeeting {
	pub fn new(id: i64, name: &str) -> Self {
		Self {
			id: Some(id),
			name: name.to_string(),
		}
	}
}

impl Model for AuthorMeeting {
	fn metadata() -> ModelMetadata {
		ModelMetadata::new("AuthorMeeting")
			.with_field(FieldMetadata::auto_key("id"))
			.with_field(FieldMetadata::new("name", FieldKind::char(100)))
			.with_field(FieldMetadata::new("authors", FieldKind::many_to_many("Author")))
	}

	fn get_field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(key(self.id)),
			"name" => Some(json!(self.name)),
			"authors" => Some(Value::Null),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
		match name {
			"id" => self.id = integer(name, &value)?,
			"name" => self.name = text(&value),
			"authors" => {}
			_ => return unknown(name),
		}
		Ok(())
	}
}
