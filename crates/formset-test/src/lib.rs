//! # Formset Test
//!
//! Testing utilities for the formset crates.
//!
//! - [`fixtures`]: record types covering unique, unique-together, date-scoped,
//!   foreign key and many-to-many fields
//! - [`payload!`]: builds submitted payloads; [`management_data`] and
//!   [`with_slot`] fill in management keys and slot values
//! - [`logging`]: one-time `env_logger` setup for tests

pub mod fixtures;
pub mod logging;
pub mod macros;

pub use logging::init_test_logging;
pub use macros::{management_data, with_slot};

#[doc(hidden)]
pub use serde_json;
