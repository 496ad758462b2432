//! Duplicate detection between the slots of one formset

use crate::messages;
use chrono::{Datelike, NaiveDate};
use formset_db::{DateScope, ModelMetadata, value_key};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Cleaned values of one valid, non-deleted slot
pub(crate) struct SlotRow<'a> {
	pub index: usize,
	pub cleaned: &'a HashMap<String, Value>,
}

/// Outcome of a duplicate pass: one message per violated rule and the slots involved
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DuplicateReport {
	pub errors: Vec<String>,
	pub slots: BTreeSet<usize>,
}

impl DuplicateReport {
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	fn record(&mut self, message: String, groups: HashMap<Vec<String>, Vec<usize>>) {
		let mut found = false;
		for indices in groups.into_values().filter(|indices| indices.len() > 1) {
			found = true;
			self.slots.extend(indices);
		}
		if found {
			self.errors.push(message);
		}
	}
}

/// Find slots sharing values for a unique field, unique-together tuple or
/// date-scoped rule
///
/// Rules touching a field in `exclude` are skipped. Fields listed in
/// `constant` hold the same value in every slot (the parent key of an inline
/// formset) and compare equal even before that value exists.
pub(crate) fn find_duplicates(
	metadata: &ModelMetadata,
	exclude: &[&str],
	constant: &[String],
	rows: &[SlotRow<'_>],
) -> DuplicateReport {
	let mut report = DuplicateReport::default();
	let key_of = |row: &SlotRow<'_>, field: &String| -> Option<String> {
		if constant.contains(field) {
			return Some(field.clone());
		}
		row.cleaned.get(field).and_then(value_key)
	};

	for check in metadata.unique_checks(exclude) {
		let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
		for row in rows {
			let key: Option<Vec<String>> = check.iter().map(|field| key_of(row, field)).collect();
			if let Some(key) = key {
				groups.entry(key).or_default().push(row.index);
			}
		}
		report.record(messages::duplicate_error(&check), groups);
	}

	for check in metadata.date_checks(exclude) {
		let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
		for row in rows {
			let Some(value) = key_of(row, &check.field) else {
				continue;
			};
			let Some(date) = row
				.cleaned
				.get(&check.date_field)
				.and_then(Value::as_str)
				.and_then(|s| s.parse::<NaiveDate>().ok())
			else {
				continue;
			};
			let mut key = vec![value];
			match check.scope {
				DateScope::Date => key.extend([
					date.year().to_string(),
					date.month().to_string(),
					date.day().to_string(),
				]),
				DateScope::Year => key.push(date.year().to_string()),
				DateScope::Month => key.push(date.month().to_string()),
			}
			groups.entry(key).or_default().push(row.index);
		}
		report.record(messages::duplicate_date_error(&check), groups);
	}

	if !report.is_empty() {
		tracing::debug!(
			model = %metadata.name,
			rules = report.errors.len(),
			slots = ?report.slots,
			"duplicate values between slots"
		);
	}
	report
}
