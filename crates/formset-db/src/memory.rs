//! In-memory record store

use crate::metadata::ModelMetadata;
use crate::model::{Model, value_key, values_equal};
use crate::query::Query;
use crate::store::{RecordStore, StoreError, StoreResult};
use serde_json::Value;
use std::collections::HashMap;

/// A [`RecordStore`] keeping records in insertion order
///
/// Generated keys are sequential integers starting at 1. Unique fields and
/// unique-together constraints from the model metadata are enforced on insert
/// and update, the way a database would.
///
/// # Examples
///
/// ```
/// use formset_db::{MemoryStore, Query, RecordStore};
/// # use formset_db::{FieldKind, FieldMetadata, Model, ModelError, ModelMetadata};
/// # use serde_json::{Value, json};
/// # #[derive(Debug, Clone, Default)]
/// # struct Product { id: Option<i64>, slug: String }
/// # impl Model for Product {
/// #     fn metadata() -> ModelMetadata {
/// #         ModelMetadata::new("Product")
/// #             .with_field(FieldMetadata::auto_key("id"))
/// #             .with_field(FieldMetadata::new("slug", FieldKind::char(50)).unique(true))
/// #     }
/// #     fn get_field(&self, name: &str) -> Option<Value> {
/// #         match name {
/// #             "id" => Some(self.id.map(Value::from).unwrap_or(Value::Null)),
/// #             "slug" => Some(json!(self.slug)),
/// #             _ => None,
/// #         }
/// #     }
/// #     fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
/// #         match name {
/// #             "id" => self.id = value.as_i64(),
/// #             "slug" => self.slug = value.as_str().unwrap_or_default().to_string(),
/// #             _ => return Err(ModelError::UnknownField(name.to_string())),
/// #         }
/// #         Ok(())
/// #     }
/// # }
///
/// let mut store = MemoryStore::new();
/// let mut red = Product { id: None, slug: "car-red".to_string() };
/// store.insert(&mut red).unwrap();
///
/// let mut duplicate = Product { id: None, slug: "car-red".to_string() };
/// assert!(store.insert(&mut duplicate).is_err());
/// assert!(store.exists(&Query::new().filter("slug", json!("car-red"))).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore<M: Model> {
	records: Vec<M>,
	related: HashMap<(String, String), Vec<Value>>,
	next_id: i64,
	metadata: ModelMetadata,
}

impl<M: Model> MemoryStore<M> {
	pub fn new() -> Self {
		Self {
			records: Vec::new(),
			related: HashMap::new(),
			next_id: 1,
			metadata: M::metadata(),
		}
	}

	/// Create a store and insert `records` in order
	pub fn with_records(records: impl IntoIterator<Item = M>) -> StoreResult<Self> {
		let mut store = Self::new();
		for mut record in records {
			store.insert(&mut record)?;
		}
		Ok(store)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// All records in insertion order
	pub fn all(&self) -> &[M] {
		&self.records
	}

	fn position(&self, pk: &Value) -> Option<usize> {
		self.records
			.iter()
			.position(|r| r.primary_key().is_some_and(|key| values_equal(&key, pk)))
	}

	fn check_unique(&self, record: &M, own_pk: Option<&Value>) -> StoreResult<()> {
		let pk_name = self.metadata.pk_name();
		for fields in self.metadata.unique_checks(&[pk_name]) {
			let mut query = Query::new();
			let mut complete = true;
			for field in &fields {
				match record.get_field(field) {
					Some(value) if value_key(&value).is_some() => {
						query = query.filter(field.as_str(), value);
					}
					_ => complete = false,
				}
			}
			if !complete {
				continue;
			}
			if let Some(pk) = own_pk {
				query = query.exclude_pk(pk.clone());
			}
			if self.records.iter().any(|r| query.matches(r)) {
				return Err(StoreError::Integrity(format!(
					"UNIQUE constraint failed: {}.{}",
					self.metadata.name,
					fields.join(", ")
				)));
			}
		}
		Ok(())
	}

	fn related_key(pk: &Value, field: &str) -> (String, String) {
		(value_key(pk).unwrap_or_default(), field.to_string())
	}
}

impl<M: Model> Default for MemoryStore<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: Model> RecordStore<M> for MemoryStore<M> {
	fn fetch(&self, query: &Query) -> StoreResult<Vec<M>> {
		let mut records: Vec<M> = self
			.records
			.iter()
			.filter(|r| query.matches(*r))
			.cloned()
			.collect();
		query.sort(&mut records, &self.metadata.ordering);
		Ok(records)
	}

	fn get(&self, pk: &Value) -> StoreResult<Option<M>> {
		Ok(self.position(pk).map(|i| self.records[i].clone()))
	}

	fn insert(&mut self, record: &mut M) -> StoreResult<()> {
		let auto = self.metadata.primary_key().is_some_and(|f| f.auto);
		let pk = match record.primary_key() {
			Some(pk) => pk,
			None if auto => {
				let pk = Value::from(self.next_id);
				record.set_primary_key(pk.clone())?;
				pk
			}
			None => {
				return Err(StoreError::Integrity(format!(
					"NOT NULL constraint failed: {}.{}",
					self.metadata.name,
					self.metadata.pk_name()
				)));
			}
		};
		if self.position(&pk).is_some() {
			return Err(StoreError::Integrity(format!(
				"UNIQUE constraint failed: {}.{}",
				self.metadata.name,
				self.metadata.pk_name()
			)));
		}
		self.check_unique(record, None)?;
		if let Some(id) = pk.as_i64() {
			self.next_id = self.next_id.max(id + 1);
		}
		tracing::debug!(model = %self.metadata.name, pk = %pk, "inserted record");
		self.records.push(record.clone());
		Ok(())
	}

	fn update(&mut self, record: &M) -> StoreResult<()> {
		let pk = record.primary_key().ok_or_else(|| StoreError::NotFound {
			model: self.metadata.name.clone(),
			key: "null".to_string(),
		})?;
		let index = self.position(&pk).ok_or_else(|| StoreError::NotFound {
			model: self.metadata.name.clone(),
			key: pk.to_string(),
		})?;
		self.check_unique(record, Some(&pk))?;
		tracing::debug!(model = %self.metadata.name, pk = %pk, "updated record");
		self.records[index] = record.clone();
		Ok(())
	}

	fn delete(&mut self, pk: &Value) -> StoreResult<bool> {
		let Some(index) = self.position(pk) else {
			return Ok(false);
		};
		self.records.remove(index);
		let key = value_key(pk).unwrap_or_default();
		self.related.retain(|(owner, _), _| *owner != key);
		tracing::debug!(model = %self.metadata.name, pk = %pk, "deleted record");
		Ok(true)
	}

	fn related(&self, pk: &Value, field: &str) -> StoreResult<Vec<Value>> {
		Ok(self
			.related
			.get(&Self::related_key(pk, field))
			.cloned()
			.unwrap_or_default())
	}

	fn set_related(&mut self, pk: &Value, field: &str, ids: Vec<Value>) -> StoreResult<()> {
		if self.position(pk).is_none() {
			return Err(StoreError::NotFound {
				model: self.metadata.name.clone(),
				key: pk.to_string(),
			});
		}
		self.related.insert(Self::related_key(pk, field), ids);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constraints::UniqueConstraint;
	use crate::metadata::{FieldKind, FieldMetadata};
	use crate::model::ModelError;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[derive(Debug, Clone, Default, PartialEq)]
	struct Price {
		id: Option<i64>,
		price: String,
		quantity: i64,
	}

	impl Model for Price {
		fn metadata() -> ModelMetadata {
			ModelMetadata::new("Price")
				.with_field(FieldMetadata::auto_key("id"))
				.with_field(FieldMetadata::new("price", FieldKind::decimal(10, 2)))
				.with_field(FieldMetadata::new("quantity", FieldKind::Integer))
				.with_unique_together(UniqueConstraint::together(&["price", "quantity"]))
				.with_ordering(&["price"])
		}

		fn get_field(&self, name: &str) -> Option<Value> {
			match name {
				"id" => Some(self.id.map(Value::from).unwrap_or(Value::Null)),
				"price" => Some(json!(self.price)),
				"quantity" => Some(json!(self.quantity)),
				_ => None,
			}
		}

		fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
			match name {
				"id" => self.id = value.as_i64(),
				"price" => self.price = value.as_str().unwrap_or_default().to_string(),
				"quantity" => self.quantity = value.as_i64().unwrap_or_default(),
				_ => return Err(ModelError::UnknownField(name.to_string())),
			}
			Ok(())
		}
	}

	fn price(price: &str, quantity: i64) -> Price {
		Price {
			id: None,
			price: price.to_string(),
			quantity,
		}
	}

	#[fixture]
	fn store() -> MemoryStore<Price> {
		MemoryStore::with_records(vec![price("2.00", 1), price("1.00", 1)]).unwrap()
	}

	#[rstest]
	fn test_insert_assigns_sequential_keys(store: MemoryStore<Price>) {
		// Assert
		let ids: Vec<Option<i64>> = store.all().iter().map(|p| p.id).collect();
		assert_eq!(ids, vec![Some(1), Some(2)]);
	}

	#[rstest]
	fn test_fetch_uses_default_ordering(store: MemoryStore<Price>) {
		// Act
		let records = store.fetch(&Query::new()).unwrap();

		// Assert
		let prices: Vec<&str> = records.iter().map(|p| p.price.as_str()).collect();
		assert_eq!(prices, vec!["1.00", "2.00"]);
	}

	#[rstest]
	fn test_insert_rejects_unique_together_violation(mut store: MemoryStore<Price>) {
		// Arrange
		let mut duplicate = price("1.00", 1);

		// Act
		let result = store.insert(&mut duplicate);

		// Assert
		assert!(matches!(result, Err(StoreError::Integrity(_))));
		assert_eq!(store.len(), 2);
	}

	#[rstest]
	fn test_update_excludes_own_record_from_unique_check(mut store: MemoryStore<Price>) {
		// Arrange
		let mut record = store.get(&json!(1)).unwrap().unwrap();
		record.quantity = 1;

		// Act & Assert
		assert!(store.update(&record).is_ok());
	}

	#[rstest]
	fn test_update_of_missing_record_fails(mut store: MemoryStore<Price>) {
		// Arrange
		let ghost = Price {
			id: Some(99),
			..price("3.00", 1)
		};

		// Act
		let result = store.update(&ghost);

		// Assert
		assert!(matches!(result, Err(StoreError::NotFound { .. })));
	}

	#[rstest]
	fn test_delete_reports_whether_record_existed(mut store: MemoryStore<Price>) {
		assert!(store.delete(&json!(1)).unwrap());
		assert!(!store.delete(&json!(1)).unwrap());
		assert_eq!(store.len(), 1);
	}

	#[rstest]
	fn test_related_round_trip_and_cleanup(mut store: MemoryStore<Price>) {
		// Arrange
		store
			.set_related(&json!(2), "tags", vec![json!(5), json!(7)])
			.unwrap();

		// Act
		let related = store.related(&json!("2"), "tags").unwrap();
		store.delete(&json!(2)).unwrap();

		// Assert
		assert_eq!(related, vec![json!(5), json!(7)]);
		assert!(store.related(&json!(2), "tags").unwrap().is_empty());
	}

	#[rstest]
	fn test_explicit_key_advances_sequence(mut store: MemoryStore<Price>) {
		// Arrange
		let mut explicit = Price {
			id: Some(10),
			..price("5.00", 1)
		};
		let mut next = price("6.00", 1);

		// Act
		store.insert(&mut explicit).unwrap();
		store.insert(&mut next).unwrap();

		// Assert
		assert_eq!(next.id, Some(11));
	}
}
