//! Core types for pagewright
//!
//! This module holds the error type and the user-facing error reporting shared by
//! every other module. Everything fallible in the crate returns `anyhow::Result`
//! and wraps a [`PagewrightError`] where the failure has a well-defined category,
//! so callers can still recover the typed error with `downcast_ref`.
//!
//! ```rust,no_run
//! use pagewright::core::PagewrightError;
//!
//! fn classify(error: &anyhow::Error) -> &'static str {
//!     match error.downcast_ref::<PagewrightError>() {
//!         Some(PagewrightError::CommandFailed { .. }) => "compilation",
//!         Some(PagewrightError::UnknownProviderKind { .. }) => "configuration",
//!         Some(_) => "other",
//!         None => "untyped",
//!     }
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, PagewrightError, user_friendly_error};
