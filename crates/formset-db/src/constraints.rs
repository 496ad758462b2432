//! Uniqueness descriptors
//!
//! These describe the uniqueness rules a record type declares. Formsets use
//! them twice: once to look for duplicates between submitted slots and once to
//! look for collisions with persisted records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniqueness across a tuple of fields (`unique_together`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
	pub name: String,
	pub fields: Vec<String>,
}

impl UniqueConstraint {
	/// Create a UNIQUE constraint on one or more fields
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::constraints::UniqueConstraint;
	///
	/// let constraint = UniqueConstraint::new("price_quantity_unique", vec!["price".to_string(), "quantity".to_string()]);
	/// assert_eq!(constraint.name, "price_quantity_unique");
	/// assert_eq!(constraint.fields.len(), 2);
	/// ```
	pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
		Self {
			name: name.into(),
			fields,
		}
	}

	/// Build a constraint named after its fields
	///
	/// # Examples
	///
	/// ```
	/// use formset_db::constraints::UniqueConstraint;
	///
	/// let constraint = UniqueConstraint::together(&["author", "title"]);
	/// assert_eq!(constraint.name, "author_title_unique");
	/// ```
	pub fn together(fields: &[&str]) -> Self {
		let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
		Self::new(format!("{}_unique", fields.join("_")), fields)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.iter().any(|f| f == field)
	}
}

/// The date component a date-scoped uniqueness rule compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateScope {
	/// Same calendar day
	Date,
	/// Same year
	Year,
	/// Same month number, regardless of year
	Month,
}

impl fmt::Display for DateScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DateScope::Date => write!(f, "date"),
			DateScope::Year => write!(f, "year"),
			DateScope::Month => write!(f, "month"),
		}
	}
}

/// `field` must be unique among records sharing the same `scope` of `date_field`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateUniqueCheck {
	pub field: String,
	pub scope: DateScope,
	pub date_field: String,
}

impl DateUniqueCheck {
	pub fn new(field: impl Into<String>, scope: DateScope, date_field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			scope,
			date_field: date_field.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_together_names_constraint_after_fields() {
		// Arrange & Act
		let constraint = UniqueConstraint::together(&["price", "quantity"]);

		// Assert
		assert_eq!(constraint.name, "price_quantity_unique");
		assert!(constraint.contains("price"));
		assert!(!constraint.contains("slug"));
	}

	#[rstest]
	#[case(DateScope::Date, "date")]
	#[case(DateScope::Year, "year")]
	#[case(DateScope::Month, "month")]
	fn test_date_scope_display(#[case] scope: DateScope, #[case] expected: &str) {
		assert_eq!(scope.to_string(), expected);
	}
}
