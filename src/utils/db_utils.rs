use sqlx::{MySqlConnection, mysql::MySqlArguments, query::QueryAs};

use crate::model::employee::{Employee, EmployeeFilter};

/// ===============================
/// SQL statement + ordered binds
/// ===============================
#[derive(Debug, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub values: Vec<String>,
}

pub const EMPLOYEE_COLUMNS: &str = "id, nome, cognome, posizione, stipendio";

/// ===============================
/// Build the filtered SELECT for listing
/// ===============================
pub fn build_list_query(filter: &EmployeeFilter) -> SqlQuery {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(name) = &filter.name {
        conditions.push("nome = ?");
        values.push(name.clone());
    }

    if let Some(surname) = &filter.surname {
        conditions.push("cognome = ?");
        values.push(surname.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    SqlQuery {
        sql: format!("SELECT {} FROM persona{}", EMPLOYEE_COLUMNS, where_clause),
        values,
    }
}

fn bind_all<'q>(
    mut query: QueryAs<'q, sqlx::MySql, Employee, MySqlArguments>,
    values: Vec<String>,
) -> QueryAs<'q, sqlx::MySql, Employee, MySqlArguments> {
    for value in values {
        query = query.bind(value);
    }
    query
}

/// ===============================
/// Run a built SELECT on one connection
/// ===============================
pub async fn fetch_employees(
    conn: &mut MySqlConnection,
    query: SqlQuery,
) -> Result<Vec<Employee>, sqlx::Error> {
    bind_all(sqlx::query_as::<_, Employee>(&query.sql), query.values)
        .fetch_all(conn)
        .await
}

/// True for a duplicate-key failure (MySQL SQLSTATE 23000 / error 1062).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filters_selects_everything() {
        let query = build_list_query(&EmployeeFilter::default());

        assert_eq!(
            query.sql,
            "SELECT id, nome, cognome, posizione, stipendio FROM persona"
        );
        assert!(query.values.is_empty());
    }

    #[test]
    fn both_filters_are_joined_with_and() {
        let query = build_list_query(&EmployeeFilter {
            name: Some("Anna".into()),
            surname: Some("Bianchi".into()),
        });

        assert_eq!(
            query.sql,
            "SELECT id, nome, cognome, posizione, stipendio FROM persona WHERE nome = ? AND cognome = ?"
        );
        assert_eq!(query.values, vec!["Anna".to_string(), "Bianchi".to_string()]);
    }

    #[test]
    fn surname_alone_binds_one_value() {
        let query = build_list_query(&EmployeeFilter {
            name: None,
            surname: Some("Rossi".into()),
        });

        assert!(query.sql.ends_with("WHERE cognome = ?"));
        assert_eq!(query.values, vec!["Rossi".to_string()]);
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
