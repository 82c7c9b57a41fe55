//! Admin-managed content resources
//!
//! The site has a fixed set of resource tables. [`ResourceType`] is the closed
//! enumeration of them and is what the audit layer dispatches on; the typed
//! row models live in [`models`] and the Postgres lookups in [`store`].

pub mod models;
pub mod store;

use serde::{Deserialize, Serialize};

pub use models::{Information, Leader, LessonIcon, Location, Meeting, Note, Redirect};
pub use store::{find_row, PgResourceStore, ResourceRow};

/// Resource types managed through the admin console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Information,
    Leadership,
    Meetings,
    Notes,
    Redirects,
    Location,
    LessonIcons,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Information,
        ResourceType::Leadership,
        ResourceType::Meetings,
        ResourceType::Notes,
        ResourceType::Redirects,
        ResourceType::Location,
        ResourceType::LessonIcons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Leadership => "leadership",
            Self::Meetings => "meetings",
            Self::Notes => "notes",
            Self::Redirects => "redirects",
            Self::Location => "location",
            Self::LessonIcons => "lesson-icons",
        }
    }

    /// Key as stored. Lesson icon categories are kept lower-cased.
    pub fn canonical_key(&self, key: &str) -> String {
        match self {
            Self::LessonIcons => key.to_lowercase(),
            _ => key.to_string(),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = UnknownResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == s)
            .ok_or_else(|| UnknownResourceType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource type: {0}")]
pub struct UnknownResourceType(pub String);
