//! Database error handling utilities

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Map a unique constraint violation to `unique_error`, anything else through
/// `default_wrapper`
///
/// # Examples
///
/// ```rust,ignore
/// sqlx::query("INSERT INTO redirects ...")
///     .execute(&pool)
///     .await
///     .map_err(|e| map_unique_violation(e, RedirectError::SlugInUse, RedirectError::Database))?;
/// ```
pub fn map_unique_violation<E, F>(error: SqlxError, unique_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_unique_violation(&error) {
        unique_error
    } else {
        default_wrapper(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Duplicate,
        Database(String),
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&SqlxError::RowNotFound));
    }

    #[test]
    fn test_map_unique_violation_falls_through() {
        let mapped = map_unique_violation(SqlxError::RowNotFound, TestError::Duplicate, |e| {
            TestError::Database(e.to_string())
        });
        assert!(matches!(mapped, TestError::Database(_)));
    }
}
