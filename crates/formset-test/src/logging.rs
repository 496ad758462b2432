//! Test logging utilities
//!
//! Formset crates log through `tracing`, whose `log` feature forwards events
//! to the `log` facade when no subscriber is installed. `env_logger` picks
//! them up; set `RUST_LOG=formset_forms=debug` to see slot construction and
//! save summaries.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
///
/// # Examples
///
/// ```
/// use formset_test::logging::init_test_logging;
///
/// init_test_logging();
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = env_logger::builder().is_test(true).try_init();
	});
}
