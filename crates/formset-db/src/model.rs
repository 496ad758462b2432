//! The record trait and value helpers
//!
//! Record field values travel as [`serde_json::Value`]s. Integers and foreign
//! keys are JSON numbers, decimals and dates are canonical strings
//! (`"1.50"`, `"2008-01-01"`), booleans are JSON booleans and an unset value is
//! `null`.

use crate::metadata::ModelMetadata;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
	#[error("Unknown field: {0}")]
	UnknownField(String),
	#[error("Invalid value for {field}: {reason}")]
	InvalidValue { field: String, reason: String },
}

/// A record type that can be edited through a model formset
///
/// # Examples
///
/// ```
/// use formset_db::{FieldKind, FieldMetadata, Model, ModelError, ModelMetadata};
/// use serde_json::{Value, json};
///
/// #[derive(Debug, Clone, Default)]
/// struct Product {
///     id: Option<i64>,
///     slug: String,
/// }
///
/// impl Model for Product {
///     fn metadata() -> ModelMetadata {
///         ModelMetadata::new("Product")
///             .with_field(FieldMetadata::auto_key("id"))
///             .with_field(FieldMetadata::new("slug", FieldKind::char(50)).unique(true))
///     }
///
///     fn get_field(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(self.id.map(Value::from).unwrap_or(Value::Null)),
///             "slug" => Some(json!(self.slug)),
///             _ => None,
///         }
///     }
///
///     fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
///         match name {
///             "id" => self.id = value.as_i64(),
///             "slug" => self.slug = value.as_str().unwrap_or_default().to_string(),
///             _ => return Err(ModelError::UnknownField(name.to_string())),
///         }
///         Ok(())
///     }
/// }
///
/// let product = Product { id: Some(3), slug: "car-red".to_string() };
/// assert_eq!(product.primary_key(), Some(json!(3)));
/// assert_eq!(product.to_choice_value(), "3");
/// ```
pub trait Model: Clone + Default + Send + Sync + 'static {
	fn metadata() -> ModelMetadata;

	/// Current value of `name`, `None` for unknown fields
	fn get_field(&self, name: &str) -> Option<Value>;

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), ModelError>;

	/// Primary key value, `None` while the record is unsaved
	fn primary_key(&self) -> Option<Value> {
		let meta = Self::metadata();
		self.get_field(meta.pk_name()).filter(|v| !v.is_null())
	}

	fn set_primary_key(&mut self, value: Value) -> Result<(), ModelError> {
		let meta = Self::metadata();
		self.set_field(meta.pk_name(), value)
	}

	/// Value submitted by a select widget for this record
	fn to_choice_value(&self) -> String {
		self.primary_key()
			.and_then(|pk| value_key(&pk))
			.unwrap_or_default()
	}

	/// Text shown by a select widget for this record
	fn to_choice_label(&self) -> String {
		self.to_choice_value()
	}
}

/// Capitalize the first character
///
/// # Examples
///
/// ```
/// use formset_db::capfirst;
///
/// assert_eq!(capfirst("price"), "Price");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Canonical comparison key of a scalar value
///
/// `null` and the empty string have no key. Numbers, strings and booleans are
/// rendered the way they would be submitted by a form.
///
/// # Examples
///
/// ```
/// use formset_db::value_key;
/// use serde_json::json;
///
/// assert_eq!(value_key(&json!(3)), Some("3".to_string()));
/// assert_eq!(value_key(&json!("3")), Some("3".to_string()));
/// assert_eq!(value_key(&json!("")), None);
/// assert_eq!(value_key(&json!(null)), None);
/// ```
pub fn value_key(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Array(items) => {
			let mut keys: Vec<String> = items.iter().filter_map(value_key).collect();
			keys.sort();
			Some(keys.join(","))
		}
		Value::Object(_) => Some(value.to_string()),
	}
}

/// Equality that treats `3` and `"3"` as the same value
pub fn values_equal(a: &Value, b: &Value) -> bool {
	value_key(a) == value_key(b)
}

/// Ordering used when sorting records: numbers numerically, everything else by key
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
	let as_number =
		|v: &Value| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse::<f64>().ok()));
	match (as_number(a), as_number(b)) {
		(Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
		_ => value_key(a).cmp(&value_key(b)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!(1), json!("1"), true)]
	#[case(json!(null), json!(""), true)]
	#[case(json!("a"), json!("b"), false)]
	#[case(json!([2, 1]), json!(["1", "2"]), true)]
	fn test_values_equal(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
		assert_eq!(values_equal(&a, &b), expected);
	}

	#[rstest]
	fn test_compare_values_orders_numbers_numerically() {
		// Arrange
		let mut values = vec![json!(10), json!(2), json!(1)];

		// Act
		values.sort_by(compare_values);

		// Assert
		assert_eq!(values, vec![json!(1), json!(2), json!(10)]);
	}

	#[rstest]
	fn test_null_sorts_first() {
		assert_eq!(compare_values(&json!(null), &json!("a")), Ordering::Less);
	}

	proptest! {
		#[test]
		fn prop_submitted_integers_match_stored_ones(n in any::<i64>()) {
			prop_assert!(values_equal(&json!(n), &json!(n.to_string())));
			prop_assert_eq!(compare_values(&json!(n), &json!(n.to_string())), Ordering::Equal);
		}

		#[test]
		fn prop_integer_ordering_is_numeric(a in any::<i32>(), b in any::<i32>()) {
			prop_assert_eq!(compare_values(&json!(a), &json!(b)), a.cmp(&b));
		}
	}
}
