//! Shared utilities for feature modules
//!
//! - **form**: normalizing HTML form fields
//! - **validation**: field rules shared across forms
//! - **error_helpers**: database error handling

pub mod error_helpers;
pub mod form;
pub mod validation;

pub use validation::{
    validate_http_url, validate_iconify_id, validate_slug, IconifyIdError, SlugValidationError,
    UrlValidationError,
};
