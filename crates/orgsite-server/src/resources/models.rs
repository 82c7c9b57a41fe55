//! Row models for the resource tables
//!
//! Field names serialize in camelCase and every timestamp goes through
//! [`orgsite_common::datetime::iso8601`], so a serialized row is already a
//! date-normalized snapshot.

use chrono::{DateTime, Utc};
use orgsite_common::datetime::iso8601;
use serde::Serialize;

/// Information block shown on the public info page
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Information {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub description: String,
    pub photo: Option<String>,
    pub enabled: bool,
    pub sort_index: i32,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

/// Leadership team member
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Leader {
    pub id: String,
    pub name: String,
    pub grad_year: i32,
    /// `Spring` or `Fall`
    pub grad_term: String,
    pub github: Option<String>,
    pub photo: Option<String>,
    pub titles: Vec<String>,
    pub link: Option<String>,
    pub sort_order: i32,
    pub is_current: bool,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

/// Meeting / event
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(with = "iso8601")]
    pub date: DateTime<Utc>,
    pub presenter: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "descriptionMD")]
    pub description_md: Option<String>,
    pub photo: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

/// Meeting notes
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(with = "iso8601")]
    pub date: DateTime<Utc>,
    pub notes: String,
    pub tags: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

/// Short link served from `/redir/:slug`
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub slug: String,
    pub target_url: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub clicks: i32,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

/// Meeting location. There is a single row with id [`Location::CURRENT_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub time: String,
    pub building_room: String,
    /// `msb` or `bowman`
    pub building_selector: String,
    pub building_url: String,
    pub body: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub const CURRENT_ID: &'static str = "current";
}

/// Icon mapping for a lesson category
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonIcon {
    pub category_name: String,
    pub iconify_id: String,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeting_serializes_camel_case_with_iso_dates() {
        let at = Utc.with_ymd_and_hms(2024, 9, 12, 23, 0, 0).unwrap();
        let meeting = Meeting {
            id: "42".to_string(),
            title: "Intro to Rust".to_string(),
            date: at,
            presenter: Some("Sam".to_string()),
            link: None,
            description_md: Some("**bring a laptop**".to_string()),
            photo: Some("/uploads/meetings/x.jpg".to_string()),
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(&meeting).unwrap();
        assert_eq!(json["date"], "2024-09-12T23:00:00.000Z");
        assert_eq!(json["descriptionMD"], "**bring a laptop**");
        assert_eq!(json["createdAt"], "2024-09-12T23:00:00.000Z");
        assert!(json["link"].is_null());
    }

    #[test]
    fn test_redirect_serializes_target_url() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let redirect = Redirect {
            slug: "abc".to_string(),
            target_url: "https://x.com".to_string(),
            description: None,
            enabled: true,
            clicks: 0,
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(json["slug"], "abc");
        assert_eq!(json["targetUrl"], "https://x.com");
    }
}
