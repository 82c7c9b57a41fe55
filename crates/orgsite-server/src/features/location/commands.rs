//! Save the meeting location

use serde::Deserialize;
use sqlx::PgPool;

use crate::features::shared::form;
use crate::resources::Location;

/// Buildings the site has a map for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Building {
    Msb,
    Bowman,
}

impl Building {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Msb => "msb",
            Self::Bowman => "bowman",
        }
    }
}

impl std::str::FromStr for Building {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msb" => Ok(Self::Msb),
            "bowman" => Ok(Self::Bowman),
            _ => Err(LocationError::InvalidBuilding),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationForm {
    pub time: Option<String>,
    pub building_room: Option<String>,
    pub building_selector: Option<String>,
    pub building_url: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationFields {
    pub time: String,
    pub building_room: String,
    pub building_selector: Building,
    pub building_url: String,
    pub body: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("All required fields must be filled")]
    MissingFields,

    #[error("Building selector must be either \"msb\" or \"bowman\"")]
    InvalidBuilding,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LocationForm {
    pub fn validate(&self) -> Result<LocationFields, LocationError> {
        let (Some(time), Some(building_room), Some(building_selector), Some(building_url)) = (
            form::text(&self.time),
            form::text(&self.building_room),
            form::text(&self.building_selector),
            form::text(&self.building_url),
        ) else {
            return Err(LocationError::MissingFields);
        };

        Ok(LocationFields {
            time,
            building_room,
            building_selector: building_selector.parse()?,
            building_url,
            body: form::text(&self.body),
        })
    }
}

/// Insert or replace the `current` location row
#[tracing::instrument(skip(pool, form))]
pub async fn save(pool: &PgPool, form: &LocationForm) -> Result<Location, LocationError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO location (id, time, building_room, building_selector, building_url, body)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET time = EXCLUDED.time,
            building_room = EXCLUDED.building_room,
            building_selector = EXCLUDED.building_selector,
            building_url = EXCLUDED.building_url,
            body = EXCLUDED.body,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Location::CURRENT_ID)
    .bind(&fields.time)
    .bind(&fields.building_room)
    .bind(fields.building_selector.as_str())
    .bind(&fields.building_url)
    .bind(&fields.body)
    .fetch_one(pool)
    .await?;

    tracing::info!(building = %row.building_selector, room = %row.building_room, "Location saved");
    Ok(row)
}

pub async fn current(pool: &PgPool) -> Result<Option<Location>, sqlx::Error> {
    crate::resources::find_row::<Location>(pool, Location::CURRENT_ID).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> LocationForm {
        LocationForm {
            time: Some("Thursdays 6pm".to_string()),
            building_room: Some("MSB 110".to_string()),
            building_selector: Some("msb".to_string()),
            building_url: Some("https://maps.example.com/msb".to_string()),
            body: None,
        }
    }

    #[test]
    fn test_validation_success() {
        let fields = valid_form().validate().unwrap();
        assert_eq!(fields.building_selector, Building::Msb);
        assert_eq!(fields.body, None);
    }

    #[test]
    fn test_validation_unknown_building() {
        let form = LocationForm {
            building_selector: Some("library".to_string()),
            ..valid_form()
        };
        assert!(matches!(form.validate(), Err(LocationError::InvalidBuilding)));
    }

    #[test]
    fn test_validation_missing_room() {
        let form = LocationForm {
            building_room: Some(" ".to_string()),
            ..valid_form()
        };
        assert!(matches!(form.validate(), Err(LocationError::MissingFields)));
    }
}
