// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::{
    db::{CustomerRepository, CustomerStore, InvoiceRepository, InvoiceStore, UserRepository, UserStore},
    services::{AuthService, CustomerService, InvoiceService},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub store_timeout: Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reads the process environment (after loading an optional `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let parse = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid { name, value }),
            }
        };

        let bcrypt_cost = parse("BCRYPT_COST", u64::from(bcrypt::DEFAULT_COST))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections: parse("DB_MAX_CONNECTIONS", 5)? as u32,
            db_acquire_timeout: Duration::from_secs(parse("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            store_timeout: Duration::from_secs(parse("STORE_TIMEOUT_SECS", 5)?),
            bcrypt_cost: bcrypt_cost as u32,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(self.db_acquire_timeout)
            .connect(&self.database_url)
            .await?;

        tracing::info!("✅ Database connection established");
        Ok(pool)
    }
}

// Shared state handed to every handler; stores are injected, never global.
#[derive(Clone)]
pub struct AppState {
    pub invoice_service: InvoiceService,
    pub customer_service: CustomerService,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(
        invoice_store: Arc<dyn InvoiceStore>,
        customer_store: Arc<dyn CustomerStore>,
        user_store: Arc<dyn UserStore>,
        config: &Config,
    ) -> Self {
        Self {
            invoice_service: InvoiceService::new(invoice_store, config.store_timeout),
            customer_service: CustomerService::new(customer_store, config.store_timeout),
            auth_service: AuthService::new(user_store, config.bcrypt_cost),
        }
    }

    // Wires the PostgreSQL repositories.
    pub fn from_pool(pool: PgPool, config: &Config) -> Self {
        Self::new(
            Arc::new(InvoiceRepository::new(pool.clone())),
            Arc::new(CustomerRepository::new(pool.clone())),
            Arc::new(UserRepository::new(pool)),
            config,
        )
    }
}
