//! Record queries
//!
//! A [`Query`] is a description, not a statement: stores evaluate it however
//! they like. [`Query::matches`] is the reference evaluation used by
//! [`MemoryStore`](crate::memory::MemoryStore).

use crate::model::{Model, compare_values, values_equal};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::cmp::Ordering;

/// How a filter compares a field against its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
	Exact,
	/// Year of a date field
	Year,
	/// Month number of a date field
	Month,
	/// Day of month of a date field
	Day,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
	pub field: String,
	pub lookup: Lookup,
	pub value: Value,
}

impl Filter {
	pub fn matches(&self, candidate: Option<&Value>) -> bool {
		let Some(candidate) = candidate else {
			return false;
		};
		match self.lookup {
			Lookup::Exact => values_equal(candidate, &self.value),
			Lookup::Year | Lookup::Month | Lookup::Day => {
				let Some(date) = candidate.as_str().and_then(parse_date) else {
					return false;
				};
				let part = match self.lookup {
					Lookup::Year => i64::from(date.year()),
					Lookup::Month => i64::from(date.month()),
					_ => i64::from(date.day()),
				};
				values_equal(&Value::from(part), &self.value)
			}
		}
	}
}

fn parse_date(s: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Filters, key exclusion and ordering over records of one type
///
/// # Examples
///
/// ```
/// use formset_db::query::{Lookup, Query};
/// use serde_json::json;
///
/// let query = Query::new()
///     .filter("slug", json!("car-red"))
///     .filter_lookup("posted", Lookup::Year, json!(2008))
///     .exclude_pk(json!(1))
///     .order_by(&["slug"]);
///
/// assert_eq!(query.filters().len(), 2);
/// assert_eq!(query.excluded_pk(), Some(&json!(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
	filters: Vec<Filter>,
	exclude_pk: Option<Value>,
	ordering: Vec<String>,
}

impl Query {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn filter(self, field: impl Into<String>, value: Value) -> Self {
		self.filter_lookup(field, Lookup::Exact, value)
	}

	pub fn filter_lookup(mut self, field: impl Into<String>, lookup: Lookup, value: Value) -> Self {
		self.filters.push(Filter {
			field: field.into(),
			lookup,
			value,
		});
		self
	}

	pub fn exclude_pk(mut self, pk: Value) -> Self {
		self.exclude_pk = Some(pk);
		self
	}

	/// Order by the given fields; a leading `-` sorts descending
	pub fn order_by(mut self, fields: &[&str]) -> Self {
		self.ordering = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn filters(&self) -> &[Filter] {
		&self.filters
	}

	pub fn excluded_pk(&self) -> Option<&Value> {
		self.exclude_pk.as_ref()
	}

	pub fn ordering(&self) -> &[String] {
		&self.ordering
	}

	pub fn matches<M: Model>(&self, record: &M) -> bool {
		if let Some(excluded) = &self.exclude_pk
			&& record
				.primary_key()
				.is_some_and(|pk| values_equal(&pk, excluded))
		{
			return false;
		}
		self.filters
			.iter()
			.all(|f| f.matches(record.get_field(&f.field).as_ref()))
	}

	/// Sort `records` by this query's ordering, falling back to `default`
	pub fn sort<M: Model>(&self, records: &mut [M], default: &[String]) {
		let ordering = if self.ordering.is_empty() {
			default
		} else {
			&self.ordering
		};
		if ordering.is_empty() {
			return;
		}
		records.sort_by(|a, b| {
			for key in ordering {
				let (field, descending) = match key.strip_prefix('-') {
					Some(field) => (field, true),
					None => (key.as_str(), false),
				};
				let left = a.get_field(field).unwrap_or(Value::Null);
				let right = b.get_field(field).unwrap_or(Value::Null);
				let ord = compare_values(&left, &right);
				let ord = if descending { ord.reverse() } else { ord };
				if ord != Ordering::Equal {
					return ord;
				}
			}
			Ordering::Equal
		});
	}
}
