//! Shared validation utilities
//!
//! Field rules used by more than one admin form.
//!
//! # Examples
//!
//! ```rust,ignore
//! use orgsite_server::features::shared::validation::{validate_slug, validate_http_url};
//!
//! validate_slug("club-discord")?;
//! validate_http_url("https://discord.gg/abc")?;
//! ```

use thiserror::Error;

/// Errors that can occur during slug validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlugValidationError {
    #[error("Slug is required")]
    Required,

    #[error("Slug may only contain letters, numbers, dashes, and underscores")]
    InvalidFormat,
}

/// Errors that can occur during URL validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Target URL must be a valid http(s) URL")]
    InvalidFormat,
}

/// Errors that can occur during iconify id validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid iconify ID format. Expected format: collection:icon")]
pub struct IconifyIdError;

/// Validate a redirect slug
///
/// # Rules
/// - Must not be empty
/// - ASCII letters, digits, `-` and `_` only
pub fn validate_slug(slug: &str) -> Result<(), SlugValidationError> {
    if slug.is_empty() {
        return Err(SlugValidationError::Required);
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SlugValidationError::InvalidFormat);
    }

    Ok(())
}

/// Validate an absolute http or https URL
///
/// Parsed with the `url` crate, so `https://` alone or `http//x` are rejected.
pub fn validate_http_url(value: &str) -> Result<(), UrlValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(UrlValidationError::InvalidFormat),
    }
}

/// Validate an iconify icon id (`collection:icon`)
pub fn validate_iconify_id(value: &str) -> Result<(), IconifyIdError> {
    match value.split_once(':') {
        Some((collection, icon))
            if !collection.is_empty() && !icon.is_empty() && !icon.contains(':') =>
        {
            Ok(())
        },
        _ => Err(IconifyIdError),
    }
}
