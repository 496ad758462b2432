//! Formset settings loaded from configuration files

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Formset bounds and field selection, as read from TOML
///
/// Every key is optional; only the keys present override a builder's values.
///
/// # Examples
///
/// ```
/// use formset_forms::settings::FormSetSettings;
///
/// let settings = FormSetSettings::from_toml_str(r#"
///     extra = 2
///     max_num = 5
///     validate_max = true
///     fields = ["name"]
/// "#).unwrap();
///
/// assert_eq!(settings.extra, Some(2));
/// assert_eq!(settings.max_num, Some(5));
/// assert_eq!(settings.fields, Some(vec!["name".to_string()]));
/// assert_eq!(settings.prefix, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormSetSettings {
	pub extra: Option<usize>,
	pub min_num: Option<usize>,
	pub max_num: Option<usize>,
	pub absolute_max: Option<usize>,
	pub validate_min: Option<bool>,
	pub validate_max: Option<bool>,
	pub can_delete: Option<bool>,
	pub can_delete_extra: Option<bool>,
	pub edit_only: Option<bool>,
	pub prefix: Option<String>,
	pub fields: Option<Vec<String>>,
	pub exclude: Option<Vec<String>>,
}

impl FormSetSettings {
	pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(contents)?)
	}

	/// Load settings from a TOML file
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFile {
			path: path.display().to_string(),
			reason: e.to_string(),
		})?;
		let settings = Self::from_toml_str(&contents)?;
		tracing::debug!(path = %path.display(), "loaded formset settings");
		Ok(settings)
	}
}
