//! Payload construction helpers

use serde_json::Value;
use std::collections::HashMap;

/// Build a submitted payload from `key => value` pairs
///
/// Values go through `serde_json::Value::from`, so string literals stay
/// strings the way a browser would send them.
///
/// # Examples
///
/// ```
/// use formset_test::payload;
/// use serde_json::json;
///
/// let data = payload! {
///     "form-TOTAL_FORMS" => "1",
///     "form-0-name" => "Walt Whitman",
/// };
/// assert_eq!(data.get("form-0-name"), Some(&json!("Walt Whitman")));
/// ```
#[macro_export]
macro_rules! payload {
	($($key:expr => $value:expr),* $(,)?) => {{
		let mut data: ::std::collections::HashMap<String, $crate::serde_json::Value> =
			::std::collections::HashMap::new();
		$(
			data.insert(($key).to_string(), $crate::serde_json::Value::from($value));
		)*
		data
	}};
}

/// Management keys for a payload with `total` slots, `initial` of them existing
///
/// # Examples
///
/// ```
/// use formset_test::management_data;
///
/// let data = management_data("form", 3, 1);
/// assert_eq!(data.get("form-TOTAL_FORMS"), Some(&"3".into()));
/// assert_eq!(data.get("form-MAX_NUM_FORMS"), Some(&"".into()));
/// ```
pub fn management_data(prefix: &str, total: usize, initial: usize) -> HashMap<String, Value> {
	payload! {
		format!("{}-TOTAL_FORMS", prefix) => total.to_string(),
		format!("{}-INITIAL_FORMS", prefix) => initial.to_string(),
		format!("{}-MIN_NUM_FORMS", prefix) => "",
		format!("{}-MAX_NUM_FORMS", prefix) => "",
	}
}

/// Merge slot values into a payload, keyed `{prefix}-{index}-{field}`
///
/// # Examples
///
/// ```
/// use formset_test::{management_data, with_slot};
///
/// let mut data = management_data("form", 1, 0);
/// with_slot(&mut data, "form", 0, &[("name", "Walt Whitman")]);
/// assert_eq!(data.get("form-0-name"), Some(&"Walt Whitman".into()));
/// ```
pub fn with_slot(data: &mut HashMap<String, Value>, prefix: &str, index: usize, values: &[(&str, &str)]) {
	for (field, value) in values {
		data.insert(
			format!("{}-{}-{}", prefix, index, field),
			Value::String(value.to_string()),
		);
	}
}
