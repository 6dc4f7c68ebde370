use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use async_trait::async_trait;
use thiserror::Error;

use crate::model::employee::{Employee, EmployeeFilter, NewEmployee};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unreachable: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database connection timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// Insert hit an id that already exists.
    #[error("employee id {id} already exists")]
    Conflict { id: i64 },
    /// The highest stored id is `i64::MAX`, so there is no next id.
    #[error("no employee id left after {max}")]
    IdsExhausted { max: i64 },
    #[error("timed out waiting for the upsert lock on employee {id}")]
    LockTimeout { id: i64 },
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            StoreError::Conflict { id } => format!("Employee id {id} was taken concurrently"),
            _ => "Internal Server Error".to_string(),
        };
        HttpResponse::build(self.status_code()).body(body)
    }
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Store client used by the employee handlers.
///
/// Every call acquires its own connection and releases it before returning,
/// on success and on error alike.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<Option<Employee>, StoreError>;

    /// Rows in datastore order.
    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError>;

    /// Insert `employee`, or overwrite the four data columns if its id exists.
    async fn upsert(&self, employee: &Employee) -> Result<UpsertOutcome, StoreError>;

    /// Returns the number of rows removed, which may be zero.
    async fn delete(&self, id: i64) -> Result<u64, StoreError>;

    /// Insert under `max(id) + 1` (or 1 on an empty table).
    ///
    /// Two concurrent calls can compute the same id; the loser gets
    /// [`StoreError::Conflict`].
    async fn create(&self, employee: &NewEmployee) -> Result<Employee, StoreError>;
}

pub fn next_id(max_id: Option<i64>) -> Result<i64, StoreError> {
    match max_id {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted { max }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_starts_at_one_on_empty_table() {
        assert_eq!(next_id(None).unwrap(), 1);
        assert_eq!(next_id(Some(41)).unwrap(), 42);
    }

    #[test]
    fn next_id_after_max_i64_is_an_error_not_a_wrap() {
        let err = next_id(Some(i64::MAX)).unwrap_err();

        assert!(matches!(err, StoreError::IdsExhausted { max: i64::MAX }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_maps_to_409_and_others_to_500() {
        assert_eq!(
            StoreError::Conflict { id: 3 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StoreError::Query(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StoreError::ConnectTimeout(Duration::from_secs(1)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
