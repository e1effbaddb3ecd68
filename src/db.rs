// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Result};
use diesel_async::pooled_connection::deadpool::{Object, Pool, PoolError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::schema::SCHEMA_STATEMENTS;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection = Object<AsyncPgConnection>;

/// PostgreSQL connection pool for the feed
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create the pool, verify connectivity and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .build()?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<()> {
        let mut conn = self
            .get_connection()
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;
        info!("Successfully connected to the database");

        for statement in SCHEMA_STATEMENTS {
            diesel::sql_query(*statement).execute(&mut conn).await?;
        }
        debug!(statements = SCHEMA_STATEMENTS.len(), "Feed schema is up to date");

        Ok(())
    }

    /// Get a database connection from the pool
    pub async fn get_connection(&self) -> Result<DbConnection, PoolError> {
        self.pool.get().await
    }
}
