//! Maps admin mutation paths to the resource they act on

use regex::Regex;
use std::borrow::Cow;

use crate::resources::{Location, ResourceType};

/// Where a mapping finds the resource id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Collection route; the id does not exist yet
    None,
    /// First capture group of the pattern
    Capture,
    /// Singleton resource with a constant id
    Fixed(&'static str),
}

/// One entry of the static mapping table
#[derive(Debug, Clone)]
pub struct ResourceMapping {
    pattern: Regex,
    resource_type: ResourceType,
    id_source: IdSource,
}

impl ResourceMapping {
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn id_source(&self) -> IdSource {
        self.id_source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Extract the resource id from a path this mapping matched
    ///
    /// Captures are percent-decoded, as the handler's `Path` extractor sees
    /// them, and normalized to the stored key form.
    pub fn resource_id(&self, path: &str) -> Option<String> {
        match self.id_source {
            IdSource::None => None,
            IdSource::Fixed(id) => Some(id.to_string()),
            IdSource::Capture => {
                let raw = self.pattern.captures(path)?.get(1)?.as_str();
                let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
                Some(self.resource_type.canonical_key(&decoded))
            },
        }
    }
}

/// Ordered mapping table, first match wins
///
/// Create routes (`.../new`) are declared ahead of the id-bearing routes of
/// the same family, so `new` is never read as an id.
#[derive(Debug, Clone)]
pub struct ResourceRouter {
    prefix: String,
    mappings: Vec<ResourceMapping>,
}

impl ResourceRouter {
    /// Build the table for an admin prefix such as `/admin`
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let prefix = prefix.trim_end_matches('/').to_string();
        let base = regex::escape(&prefix);

        let crud = [
            ResourceType::Information,
            ResourceType::Leadership,
            ResourceType::Meetings,
            ResourceType::Notes,
            ResourceType::Redirects,
        ];

        let mut mappings = Vec::with_capacity(19);
        for resource_type in crud {
            let family = format!("{}/{}", base, regex::escape(resource_type.as_str()));
            mappings.push(mapping(&format!("^{family}/new$"), resource_type, IdSource::None)?);
            mappings.push(mapping(
                &format!("^{family}/([^/]+)/delete$"),
                resource_type,
                IdSource::Capture,
            )?);
            mappings.push(mapping(&format!("^{family}/([^/]+)$"), resource_type, IdSource::Capture)?);
        }

        mappings.push(mapping(
            &format!("^{base}/location$"),
            ResourceType::Location,
            IdSource::Fixed(Location::CURRENT_ID),
        )?);

        let icons = format!("{base}/lesson-icons");
        mappings.push(mapping(&format!("^{icons}/api$"), ResourceType::LessonIcons, IdSource::None)?);
        mappings.push(mapping(
            &format!("^{icons}/api/([^/]+)$"),
            ResourceType::LessonIcons,
            IdSource::Capture,
        )?);
        mappings.push(mapping(
            &format!("^{icons}/([^/]+)/delete$"),
            ResourceType::LessonIcons,
            IdSource::Capture,
        )?);

        Ok(Self { prefix, mappings })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `path` is the prefix itself or lies below it
    pub fn is_admin_path(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Return the first mapping whose pattern matches `path`
    pub fn resolve(&self, path: &str) -> Option<&ResourceMapping> {
        self.mappings.iter().find(|mapping| mapping.matches(path))
    }

    pub fn mappings(&self) -> &[ResourceMapping] {
        &self.mappings
    }
}

fn mapping(
    pattern: &str,
    resource_type: ResourceType,
    id_source: IdSource,
) -> Result<ResourceMapping, regex::Error> {
    Ok(ResourceMapping { pattern: Regex::new(pattern)?, resource_type, id_source })
}
