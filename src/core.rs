//! Core rowmapper functionality
//!
//! `MapperHub` owns the connection pool and hands out mappers and grids that share one
//! executor and the configured defaults.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::RowMapperError;
use config::{AppConfig, DatabaseConfig, GridSettings, MapperSettings};
use data_grid::Grid;
use table_mapper::mapper::DEFAULT_CREATED_AT_COLUMN;
use table_mapper::{debug_log, Executor, MapperConfig, PgExecutor, Select, TableMapper};

/// Central coordinator for mappers and grids over one Postgres pool
pub struct MapperHub {
    pool: PgPool,
    executor: Arc<PgExecutor>,
    mapper_settings: MapperSettings,
    grid_settings: GridSettings,
}

impl MapperHub {
    /// Connect with default mapper and grid settings
    pub async fn new(config: DatabaseConfig) -> Result<Self, RowMapperError> {
        let pool = Self::connect(&config).await?;
        Ok(Self::from_pool(
            pool,
            MapperSettings::default(),
            GridSettings::default(),
        ))
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, RowMapperError> {
        let pool = Self::connect(&config.database).await?;
        Ok(Self::from_pool(
            pool,
            config.mapper.clone(),
            config.grid.clone(),
        ))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, mapper_settings: MapperSettings, grid_settings: GridSettings) -> Self {
        let executor = Arc::new(PgExecutor::new(pool.clone()));
        Self {
            pool,
            executor,
            mapper_settings,
            grid_settings,
        }
    }

    async fn connect(config: &DatabaseConfig) -> Result<PgPool, RowMapperError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        debug_log!("[HUB] connecting to {}:{}/{}", config.host, config.port, config.database);
        let pool = pool_options.connect(&connection_string).await?;
        Ok(pool)
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        self.executor.clone()
    }

    pub fn mapper_settings(&self) -> &MapperSettings {
        &self.mapper_settings
    }

    pub fn grid_settings(&self) -> &GridSettings {
        &self.grid_settings
    }

    /// Mapper over `table`, configured from the hub's mapper settings
    pub fn mapper(&self, table: &str, primary_key: &str) -> TableMapper {
        self.mapper_with(MapperConfig::new(table, primary_key))
    }

    /// Mapper from an explicit configuration; the hub's settings fill in persistence defaults
    pub fn mapper_with(&self, mut config: MapperConfig) -> TableMapper {
        config.secure_persist |= self.mapper_settings.secure_persist;
        if config.created_at_column == DEFAULT_CREATED_AT_COLUMN {
            config.created_at_column = self.mapper_settings.created_at_column.clone();
        }
        TableMapper::new(config).with_executor(self.executor())
    }

    /// Grid over `select`, configured from the hub's grid settings
    pub fn grid(&self, select: Select) -> Grid {
        Grid::with_settings(self.executor(), select, &self.grid_settings)
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), RowMapperError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
