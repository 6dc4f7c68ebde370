use std::time::Duration;

use actix_web::rt::time::timeout;
use sqlx::{
    ConnectOptions,
    mysql::{MySqlConnectOptions, MySqlConnection},
};
use tracing::debug;

use crate::{config::DbConfig, store::StoreError};

pub fn connect_options(config: &DbConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password)
}

/// Opens a fresh connection; there is no pool, callers close it when done.
pub async fn open_connection(
    options: &MySqlConnectOptions,
    connect_timeout: Option<Duration>,
) -> Result<MySqlConnection, StoreError> {
    debug!("Opening database connection");

    let connect = options.connect();
    let result = match connect_timeout {
        Some(limit) => timeout(limit, connect)
            .await
            .map_err(|_| StoreError::ConnectTimeout(limit))?,
        None => connect.await,
    };

    result.map_err(StoreError::Connect)
}
