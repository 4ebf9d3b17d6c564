//! # Simple logging hook for debugging and demos.
//!
//! [`LogHook`] prints errors to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [effect_failed] error: connection refused
//! [effect_panicked] panic: index out of bounds
//! ```

use crate::error::EffectError;
use crate::hooks::ErrorHook;

/// Simple stdout logging hook.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// implement a custom [`ErrorHook`] for structured logging or metrics
/// collection.
pub struct LogHook;

impl ErrorHook for LogHook {
    fn on_error(&self, err: &EffectError) {
        println!("[{}] {}", err.as_label(), err.as_message());
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
