//! Create, update and delete leaders

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::form;
use crate::resources::Leader;

const MIN_GRAD_YEAR: i32 = 1900;
const MAX_GRAD_YEAR: i32 = 2100;
const DEFAULT_SORT_ORDER: i32 = 1;

/// Graduation term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradTerm {
    Spring,
    Fall,
}

impl GradTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Fall => "Fall",
        }
    }
}

impl std::str::FromStr for GradTerm {
    type Err = LeadershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Spring" => Ok(Self::Spring),
            "Fall" => Ok(Self::Fall),
            _ => Err(LeadershipError::InvalidGradTerm),
        }
    }
}

/// Fields posted by the leader form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderForm {
    pub name: Option<String>,
    pub grad_year: Option<String>,
    pub grad_term: Option<String>,
    pub github: Option<String>,
    pub photo: Option<String>,
    /// Comma separated
    pub titles: Option<String>,
    pub link: Option<String>,
    pub sort_order: Option<String>,
    pub is_current: Option<String>,
}

/// Validated leader fields
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderFields {
    pub name: String,
    pub grad_year: i32,
    pub grad_term: GradTerm,
    pub github: Option<String>,
    pub photo: Option<String>,
    pub titles: Vec<String>,
    pub link: Option<String>,
    pub sort_order: i32,
    pub is_current: bool,
}

/// Errors that can occur when changing leaders
#[derive(Debug, thiserror::Error)]
pub enum LeadershipError {
    #[error("Name, graduation year, term, and titles are required")]
    MissingFields,

    #[error("Invalid graduation year")]
    InvalidGradYear,

    #[error("Graduation term must be either \"Spring\" or \"Fall\"")]
    InvalidGradTerm,

    #[error("At least one title is required")]
    NoTitles,

    #[error("Invalid sort order")]
    InvalidSortOrder,

    #[error("Leader '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LeaderForm {
    /// Validates the form
    ///
    /// # Errors
    ///
    /// - Name, graduation year, term and titles must be present
    /// - Graduation year must be within 1900..=2100
    /// - Term must be exactly `Spring` or `Fall`
    /// - Titles must contain at least one non-blank entry
    /// - Sort order must be an integer when given (blank means 1)
    pub fn validate(&self) -> Result<LeaderFields, LeadershipError> {
        let (Some(name), Some(grad_year), Some(grad_term), Some(titles)) = (
            form::text(&self.name),
            form::text(&self.grad_year),
            form::text(&self.grad_term),
            form::text(&self.titles),
        ) else {
            return Err(LeadershipError::MissingFields);
        };

        let grad_year: i32 = grad_year
            .parse()
            .ok()
            .filter(|year| (MIN_GRAD_YEAR..=MAX_GRAD_YEAR).contains(year))
            .ok_or(LeadershipError::InvalidGradYear)?;
        let grad_term: GradTerm = grad_term.parse()?;

        let titles = split_titles(&titles);
        if titles.is_empty() {
            return Err(LeadershipError::NoTitles);
        }

        let sort_order = form::integer(&self.sort_order, DEFAULT_SORT_ORDER)
            .map_err(|_| LeadershipError::InvalidSortOrder)?;

        Ok(LeaderFields {
            name,
            grad_year,
            grad_term,
            github: form::text(&self.github),
            photo: form::text(&self.photo),
            titles,
            link: form::text(&self.link),
            sort_order,
            is_current: form::checkbox(&self.is_current),
        })
    }
}

fn split_titles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect()
}

#[tracing::instrument(skip(pool, form))]
pub async fn create(pool: &PgPool, form: &LeaderForm) -> Result<Leader, LeadershipError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Leader>(
        r#"
        INSERT INTO leadership (
            id, name, grad_year, grad_term, github, photo, titles, link, sort_order, is_current
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&fields.name)
    .bind(fields.grad_year)
    .bind(fields.grad_term.as_str())
    .bind(&fields.github)
    .bind(&fields.photo)
    .bind(&fields.titles)
    .bind(&fields.link)
    .bind(fields.sort_order)
    .bind(fields.is_current)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %row.id, name = %row.name, "Leader created");
    Ok(row)
}

#[tracing::instrument(skip(pool, form))]
pub async fn update(pool: &PgPool, id: &str, form: &LeaderForm) -> Result<Leader, LeadershipError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Leader>(
        r#"
        UPDATE leadership
        SET name = $2, grad_year = $3, grad_term = $4, github = $5,
            photo = COALESCE($6, photo), titles = $7, link = $8, sort_order = $9,
            is_current = $10, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.name)
    .bind(fields.grad_year)
    .bind(fields.grad_term.as_str())
    .bind(&fields.github)
    .bind(&fields.photo)
    .bind(&fields.titles)
    .bind(&fields.link)
    .bind(fields.sort_order)
    .bind(fields.is_current)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LeadershipError::NotFound(id.to_string()))?;

    tracing::info!(id = %row.id, "Leader updated");
    Ok(row)
}

#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, LeadershipError> {
    let result = sqlx::query("DELETE FROM leadership WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
