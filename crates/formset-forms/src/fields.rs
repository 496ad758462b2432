// Basic fields
pub mod boolean_field;
pub mod char_field;
pub mod date_field;
pub mod decimal_field;
pub mod integer_field;

// Relation fields
pub mod inline_foreign_key_field;
pub mod model_choice_field;

// Re-exports for basic fields
pub use boolean_field::BooleanField;
pub use char_field::CharField;
pub use date_field::DateField;
pub use decimal_field::DecimalField;
pub use integer_field::IntegerField;

// Re-exports for relation fields
pub use inline_foreign_key_field::InlineForeignKeyField;
pub use model_choice_field::{Choice, Choices, ModelChoiceField, ModelMultipleChoiceField};
