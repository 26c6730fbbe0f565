//! Runtime settings read from environment variables.
//!
//! Every setting has a default, so an empty environment yields a server on
//! port 3000 talking to a local database with the standard withdrawal limits.

use crate::validator::Limits;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub pool_size: u32,
}

impl Database {
    pub fn connection_string(&self) -> String {
        format!(
            "host={} user={} password={} dbname={}",
            self.host, self.user, self.password, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database: Database,
    pub limits: Limits,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            port: parse(&lookup, "PORT", 3000)?,
            database: Database {
                host: string("DB_HOST", "localhost"),
                user: string("DB_USER", "admin"),
                password: string("DB_PASSWORD", "123"),
                name: string("DB_NAME", "bank"),
                pool_size: parse(&lookup, "DB_POOL_SIZE", 40)?,
            },
            limits: Limits {
                max_withdrawal: parse(&lookup, "MAX_WITHDRAWAL", Decimal::from(10000))?,
                minimum_balance: parse(&lookup, "MINIMUM_BALANCE", Decimal::from(100))?,
            },
        };

        if config.database.pool_size == 0 {
            return Err(Error::InvalidValue {
                key: "DB_POOL_SIZE",
                message: "must be at least 1".into(),
            });
        }

        if config.limits.max_withdrawal <= Decimal::ZERO {
            return Err(Error::InvalidValue {
                key: "MAX_WITHDRAWAL",
                message: "must be positive".into(),
            });
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidValue {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
