use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{Connection, Executor, MySqlConnection, mysql::MySqlConnectOptions};
use tracing::{debug, info, warn};

use crate::{
    config::DbConfig,
    db::{connect_options, open_connection},
    model::employee::{Employee, EmployeeFilter, NewEmployee},
    store::{EmployeeStore, StoreError, UpsertOutcome, next_id},
    utils::db_utils::{EMPLOYEE_COLUMNS, build_list_query, fetch_employees, is_unique_violation},
};

const INSERT_SQL: &str =
    "INSERT INTO persona (id, nome, cognome, posizione, stipendio) VALUES (?, ?, ?, ?, ?)";
const UPDATE_SQL: &str =
    "UPDATE persona SET nome = ?, cognome = ?, posizione = ?, stipendio = ? WHERE id = ?";
const LOCK_ROW_SQL: &str = "SELECT id FROM persona WHERE id = ? FOR UPDATE";
const UPSERT_LOCK_WAIT_SECS: i64 = 10;

/// MySQL-backed store opening one connection per call.
pub struct MySqlStore {
    options: MySqlConnectOptions,
    connect_timeout: Option<Duration>,
}

impl MySqlStore {
    pub fn new(config: &DbConfig) -> Self {
        Self::from_options(connect_options(config), config.connect_timeout)
    }

    pub fn from_options(options: MySqlConnectOptions, connect_timeout: Option<Duration>) -> Self {
        Self {
            options,
            connect_timeout,
        }
    }

    /// Runs `op` on a fresh connection and closes it whatever `op` returned.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut MySqlConnection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        let mut conn = open_connection(&self.options, self.connect_timeout).await?;
        let result = op(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close database connection");
        }

        result
    }
}

async fn insert(conn: &mut MySqlConnection, employee: &Employee) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_SQL)
        .bind(employee.id)
        .bind(&employee.nome)
        .bind(&employee.cognome)
        .bind(&employee.posizione)
        .bind(employee.stipendio)
        .execute(conn)
        .await
        .map(|_| ())
}

/// Serialises upserts of one id, then runs the two-branch transaction.
///
/// Lock order: the `persona:<id>` advisory lock first, then the row's X lock
/// (`FOR UPDATE`), then the insert or update. Without the advisory lock,
/// concurrent first-time PUTs on an id each keep the shared lock of their
/// failed insert and deadlock when upgrading it for the update.
async fn upsert_on(
    conn: &mut MySqlConnection,
    employee: &Employee,
) -> Result<UpsertOutcome, StoreError> {
    let lock_name = format!("persona:{}", employee.id);
    let acquired: Option<i64> = sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
        .bind(&lock_name)
        .bind(UPSERT_LOCK_WAIT_SECS)
        .fetch_one(&mut *conn)
        .await?;
    if acquired != Some(1) {
        return Err(StoreError::LockTimeout { id: employee.id });
    }

    let result = upsert_locked(&mut *conn, employee).await;

    // closing the session would release it too
    if let Err(e) = sqlx::query("SELECT RELEASE_LOCK(?)")
        .bind(&lock_name)
        .execute(&mut *conn)
        .await
    {
        warn!(error = %e, lock = %lock_name, "Failed to release upsert lock");
    }

    result
}

/// Insert inside a savepoint; on a duplicate id roll the savepoint back and
/// update instead. Both branches commit as one transaction.
async fn upsert_locked(
    conn: &mut MySqlConnection,
    employee: &Employee,
) -> Result<UpsertOutcome, StoreError> {
    // applies to the next transaction only; no gap lock when the id is absent
    (&mut *conn)
        .execute("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
        .await?;
    let mut tx = conn.begin().await?;

    let locked = sqlx::query(LOCK_ROW_SQL)
        .bind(employee.id)
        .fetch_optional(&mut *tx)
        .await?;
    debug!(id = employee.id, exists = locked.is_some(), "Row lock taken");

    let mut attempt = Connection::begin(&mut *tx).await?;

    match insert(&mut attempt, employee).await {
        Ok(()) => {
            attempt.commit().await?;
            tx.commit().await?;
            Ok(UpsertOutcome::Created)
        }
        Err(e) if is_unique_violation(&e) => {
            debug!(id = employee.id, "Id already present, falling back to update");
            attempt.rollback().await?;

            sqlx::query(UPDATE_SQL)
                .bind(&employee.nome)
                .bind(&employee.cognome)
                .bind(&employee.posizione)
                .bind(employee.stipendio)
                .bind(employee.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(UpsertOutcome::Updated)
        }
        // dropping tx rolls everything back
        Err(e) => Err(e.into()),
    }
}

async fn read_next_id(conn: &mut MySqlConnection) -> Result<i64, StoreError> {
    let max_id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM persona")
        .fetch_one(conn)
        .await?;

    next_id(max_id)
}

/// Any duplicate here means another writer took the id after it was read.
async fn insert_created(
    conn: &mut MySqlConnection,
    employee: Employee,
) -> Result<Employee, StoreError> {
    match insert(conn, &employee).await {
        Ok(()) => Ok(employee),
        Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict { id: employee.id }),
        Err(e) => Err(e.into()),
    }
}

async fn create_on(
    conn: &mut MySqlConnection,
    employee: NewEmployee,
) -> Result<Employee, StoreError> {
    let id = read_next_id(&mut *conn).await?;
    debug!(id, "Synthesized next employee id");

    insert_created(conn, employee.with_id(id)).await
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn fetch(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        self.with_connection(move |conn| {
            Box::pin(async move {
                let sql = format!("SELECT {} FROM persona WHERE id = ?", EMPLOYEE_COLUMNS);
                let employee = sqlx::query_as::<_, Employee>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await?;
                Ok::<_, StoreError>(employee)
            })
        })
        .await
    }

    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let query = build_list_query(filter);
        debug!(sql = %query.sql, bindings = ?query.values, "Listing employees");

        self.with_connection(move |conn| {
            Box::pin(async move { Ok::<_, StoreError>(fetch_employees(conn, query).await?) })
        })
        .await
    }

    async fn upsert(&self, employee: &Employee) -> Result<UpsertOutcome, StoreError> {
        let employee = employee.clone();
        let outcome = self
            .with_connection(move |conn| Box::pin(async move { upsert_on(conn, &employee).await }))
            .await?;

        info!(?outcome, "Employee upserted");
        Ok(outcome)
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        self.with_connection(move |conn| {
            Box::pin(async move {
                let result = sqlx::query("DELETE FROM persona WHERE id = ?")
                    .bind(id)
                    .execute(conn)
                    .await?;
                Ok::<_, StoreError>(result.rows_affected())
            })
        })
        .await
    }

    async fn create(&self, employee: &NewEmployee) -> Result<Employee, StoreError> {
        let employee = employee.clone();
        let created = self
            .with_connection(move |conn| Box::pin(async move { create_on(conn, employee).await }))
            .await?;

        info!(id = created.id, "Employee created");
        Ok(created)
    }
}
