//! Redirect commands
//!
//! Create and update share [`RedirectForm`] and its validation.

pub mod create;
pub mod delete;
pub mod update;

use serde::Deserialize;
use thiserror::Error;

use crate::features::shared::form;
use crate::features::shared::validation::{
    validate_http_url, validate_slug, SlugValidationError, UrlValidationError,
};

pub use create::CreateRedirectError;
pub use delete::DeleteRedirectError;
pub use update::UpdateRedirectError;

/// Fields posted by the redirect form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectForm {
    pub slug: Option<String>,
    pub target_url: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<String>,
}

/// Validated redirect fields
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectFields {
    pub slug: String,
    pub target_url: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Field-level problems with a redirect form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectFormError {
    #[error("Slug and target URL are required")]
    MissingFields,

    #[error(transparent)]
    Slug(#[from] SlugValidationError),

    #[error(transparent)]
    TargetUrl(#[from] UrlValidationError),
}

impl RedirectForm {
    #[tracing::instrument(skip(self), fields(slug = ?self.slug))]
    pub fn validate(&self) -> Result<RedirectFields, RedirectFormError> {
        let (Some(slug), Some(target_url)) =
            (form::text(&self.slug), form::text(&self.target_url))
        else {
            return Err(RedirectFormError::MissingFields);
        };

        validate_slug(&slug)?;
        validate_http_url(&target_url)?;

        Ok(RedirectFields {
            slug,
            target_url,
            description: form::text(&self.description),
            enabled: form::checkbox(&self.enabled),
        })
    }
}
