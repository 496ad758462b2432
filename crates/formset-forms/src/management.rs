//! Management data and slot counting
//!
//! A bound formset learns how many slots were rendered from four management
//! keys submitted alongside the slot data. Without a payload the slot count is
//! derived from the existing records and the configured bounds.

use crate::form::FormData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TOTAL_FORM_COUNT: &str = "TOTAL_FORMS";
pub const INITIAL_FORM_COUNT: &str = "INITIAL_FORMS";
pub const MIN_NUM_FORM_COUNT: &str = "MIN_NUM_FORMS";
pub const MAX_NUM_FORM_COUNT: &str = "MAX_NUM_FORMS";

/// `max_num` used when none is configured
pub const DEFAULT_MAX_NUM: usize = 1000;

/// Management form for tracking formset state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementForm {
	/// Total number of forms in formset
	pub total_forms: usize,
	/// Number of initial forms (existing objects)
	pub initial_forms: usize,
	/// Minimum number of required forms
	pub min_num: usize,
	/// Maximum number of allowed forms
	pub max_num: usize,
}

impl Default for ManagementForm {
	fn default() -> Self {
		Self {
			total_forms: 0,
			initial_forms: 0,
			min_num: 0,
			max_num: DEFAULT_MAX_NUM,
		}
	}
}

/// Prefixed management key, e.g. `form-TOTAL_FORMS`
pub fn management_key(prefix: &str, name: &str) -> String {
	format!("{}-{}", prefix, name)
}

fn parse_count(value: Option<&Value>) -> Option<usize> {
	match value? {
		Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

impl ManagementForm {
	/// Read the management keys for `prefix` from a payload
	///
	/// Returns the prefixed names of the keys that are missing or not
	/// non-negative integers. `MIN_NUM_FORMS` and `MAX_NUM_FORMS` are optional.
	///
	/// # Examples
	///
	/// ```
	/// use formset_forms::management::ManagementForm;
	/// use serde_json::json;
	/// use std::collections::HashMap;
	///
	/// let data = HashMap::from([
	///     ("form-TOTAL_FORMS".to_string(), json!("3")),
	///     ("form-INITIAL_FORMS".to_string(), json!(1)),
	/// ]);
	/// let management = ManagementForm::from_data(&data, "form").unwrap();
	/// assert_eq!(management.total_forms, 3);
	/// assert_eq!(management.initial_forms, 1);
	///
	/// let missing = ManagementForm::from_data(&HashMap::new(), "form").unwrap_err();
	/// assert_eq!(missing, vec!["form-TOTAL_FORMS", "form-INITIAL_FORMS"]);
	/// ```
	pub fn from_data(data: &FormData, prefix: &str) -> Result<Self, Vec<String>> {
		let mut invalid = Vec::new();
		let mut required = |name: &str| {
			let key = management_key(prefix, name);
			let count = parse_count(data.get(&key));
			if count.is_none() {
				invalid.push(key);
			}
			count.unwrap_or_default()
		};
		let total_forms = required(TOTAL_FORM_COUNT);
		let initial_forms = required(INITIAL_FORM_COUNT);

		let mut optional = |name: &str, default: usize| {
			let key = management_key(prefix, name);
			match data.get(&key) {
				None | Some(Value::Null) => default,
				Some(Value::String(s)) if s.is_empty() => default,
				value => parse_count(value).unwrap_or_else(|| {
					invalid.push(key);
					default
				}),
			}
		};
		let min_num = optional(MIN_NUM_FORM_COUNT, 0);
		let max_num = optional(MAX_NUM_FORM_COUNT, DEFAULT_MAX_NUM);

		if invalid.is_empty() {
			Ok(Self {
				total_forms,
				initial_forms,
				min_num,
				max_num,
			})
		} else {
			Err(invalid)
		}
	}

	/// Management keys to render back with the slots
	pub fn to_data(&self, prefix: &str) -> FormData {
		[
			(TOTAL_FORM_COUNT, self.total_forms),
			(INITIAL_FORM_COUNT, self.initial_forms),
			(MIN_NUM_FORM_COUNT, self.min_num),
			(MAX_NUM_FORM_COUNT, self.max_num),
		]
		.into_iter()
		.map(|(name, count)| (management_key(prefix, name), Value::String(count.to_string())))
		.collect()
	}
}

/// Number of slots rendered for an unbound formset
///
/// Existing records come first and are never hidden by `max_num`; extra slots
/// fill the remaining room. The result never exceeds `absolute_max`.
///
/// # Examples
///
/// ```
/// use formset_forms::management::unbound_form_count;
///
/// // three existing records, three extra slots, no effective limit
/// assert_eq!(unbound_form_count(3, 0, 3, 1000, 2000), 6);
/// // max_num trims extra slots first
/// assert_eq!(unbound_form_count(3, 0, 3, 4, 1004), 4);
/// // existing records beyond max_num are all shown
/// assert_eq!(unbound_form_count(3, 0, 3, 0, 1000), 3);
/// ```
pub fn unbound_form_count(
	initial: usize,
	min_num: usize,
	extra: usize,
	max_num: usize,
	absolute_max: usize,
) -> usize {
	let mut total = initial.max(min_num).saturating_add(extra);
	if initial > max_num {
		total = initial;
	} else if total > max_num {
		total = max_num;
	}
	total.min(absolute_max)
}

/// Number of slots allocated for a bound formset
pub fn bound_form_count(declared_total: usize, absolute_max: usize) -> usize {
	declared_total.min(absolute_max)
}
