//! User-facing validation messages

use formset_db::{DateUniqueCheck, ModelMetadata, capfirst};

/// Join items as prose: `"a, b and c"`
///
/// # Examples
///
/// ```
/// use formset_forms::messages::text_list;
///
/// assert_eq!(text_list(&["price".to_string()], "and"), "price");
/// assert_eq!(text_list(&["a".to_string(), "b".to_string(), "c".to_string()], "and"), "a, b and c");
/// ```
pub fn text_list(items: &[String], last_word: &str) -> String {
	match items {
		[] => String::new(),
		[only] => only.clone(),
		[init @ .., last] => format!("{} {} {}", init.join(", "), last_word, last),
	}
}

/// Persisted-record collision on a unique field or field tuple
pub fn unique_error(metadata: &ModelMetadata, fields: &[String]) -> String {
	let labels: Vec<String> = fields
		.iter()
		.map(|name| {
			metadata
				.field(name)
				.map(|f| f.label())
				.unwrap_or_else(|| capfirst(name))
		})
		.collect();
	format!(
		"{} with this {} already exists.",
		metadata.display_name(),
		text_list(&labels, "and")
	)
}

/// Persisted-record collision on a date-scoped unique field
pub fn date_error(metadata: &ModelMetadata, check: &DateUniqueCheck) -> String {
	let label = |name: &str| {
		metadata
			.field(name)
			.map(|f| f.label())
			.unwrap_or_else(|| capfirst(name))
	};
	format!(
		"{} must be unique for {} {}.",
		label(&check.field),
		label(&check.date_field),
		check.scope
	)
}

/// Duplicate values between slots of one formset
pub fn duplicate_error(fields: &[String]) -> String {
	if fields.len() == 1 {
		format!("Please correct the duplicate data for {}.", fields[0])
	} else {
		format!(
			"Please correct the duplicate data for {}, which must be unique.",
			text_list(fields, "and")
		)
	}
}

/// Duplicate date-scoped values between slots of one formset
pub fn duplicate_date_error(check: &DateUniqueCheck) -> String {
	format!(
		"Please correct the duplicate data for {} which must be unique for the {} in {}.",
		check.field, check.scope, check.date_field
	)
}

/// Form-level error attached to every slot involved in a duplicate
pub const DUPLICATE_VALUES: &str = "Please correct the duplicate values below.";

fn plural_forms(n: usize) -> &'static str {
	if n == 1 { "form" } else { "forms" }
}

pub fn too_many_forms(max_num: usize) -> String {
	format!("Please submit at most {} {}.", max_num, plural_forms(max_num))
}

pub fn too_few_forms(min_num: usize) -> String {
	format!("Please submit at least {} {}.", min_num, plural_forms(min_num))
}

pub fn missing_management_form(fields: &[String]) -> String {
	format!(
		"ManagementForm data is missing or has been tampered with. Missing fields: {}.",
		fields.join(", ")
	)
}
