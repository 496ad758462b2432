//! The record store seam
//!
//! Formsets read and write records exclusively through [`RecordStore`].
//! Validation only needs `&S`; saving takes `&mut S`.

use crate::model::{Model, ModelError};
use crate::query::Query;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("{model} matching query does not exist: {key}")]
	NotFound { model: String, key: String },
	#[error("Integrity error: {0}")]
	Integrity(String),
	#[error("Store backend error: {0}")]
	Backend(String),
	#[error(transparent)]
	Model(#[from] ModelError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations a formset needs for records of type `M`
pub trait RecordStore<M: Model> {
	/// Records matching `query`, ordered by the query or the model's default ordering
	fn fetch(&self, query: &Query) -> StoreResult<Vec<M>>;

	fn get(&self, pk: &Value) -> StoreResult<Option<M>>;

	fn exists(&self, query: &Query) -> StoreResult<bool> {
		Ok(!self.fetch(query)?.is_empty())
	}

	/// Persist a new record, assigning its key when the key is generated
	fn insert(&mut self, record: &mut M) -> StoreResult<()>;

	fn update(&mut self, record: &M) -> StoreResult<()>;

	/// Remove the record with key `pk`; returns whether a record was removed
	fn delete(&mut self, pk: &Value) -> StoreResult<bool>;

	/// Keys related to record `pk` through the many-to-many field `field`
	fn related(&self, pk: &Value, field: &str) -> StoreResult<Vec<Value>>;

	fn set_related(&mut self, pk: &Value, field: &str, ids: Vec<Value>) -> StoreResult<()>;
}
