// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Typed validation outcomes.
//!
//! Verification never panics or returns an error for a bad input. It fills
//! a state object with one result kind plus a short reason.

use core::fmt;

/// A result enumeration whose `Default` is the valid outcome.
pub trait ValidationResult: Copy + Default + PartialEq + fmt::Debug {}

impl<T: Copy + Default + PartialEq + fmt::Debug> ValidationResult for T {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationState<R: ValidationResult> {
    result: R,
    reject_reason: String,
    debug_message: String,
}

impl<R: ValidationResult> ValidationState<R> {
    /// Records a failure. Always returns false so callers can `return state.invalid(..)`.
    pub fn invalid(&mut self, result: R, reason: &str, debug: impl Into<String>) -> bool {
        self.result = result;
        self.reject_reason = reason.to_string();
        self.debug_message = debug.into();
        false
    }

    pub fn is_valid(&self) -> bool {
        self.result == R::default()
    }

    pub fn result(&self) -> R {
        self.result
    }

    pub fn reject_reason(&self) -> &str {
        &self.reject_reason
    }

    pub fn debug_message(&self) -> &str {
        &self.debug_message
    }
}

impl<R: ValidationResult> fmt::Display for ValidationState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("Valid");
        }
        if self.debug_message.is_empty() {
            write!(f, "{}", self.reject_reason)
        } else {
            write!(f, "{}, {}", self.reject_reason, self.debug_message)
        }
    }
}
