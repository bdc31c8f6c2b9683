use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::{create_cors_layer, DEFAULT_ALLOWED_ORIGINS};
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/boxoffice";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Deployment posture, read from `RUST_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Unspecified,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            _ => Environment::Unspecified,
        }
    }

    pub fn from_env() -> Self {
        env::var("RUST_ENV")
            .map(|value| Self::parse(&value))
            .unwrap_or(Environment::Unspecified)
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub organiser_password: String,
    pub environment: Environment,
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let organiser_password = env::var("ORGANISER_PASSWORD")
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("ORGANISER_PASSWORD"))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            port: parse_var("PORT", DEFAULT_PORT)?,
            organiser_password,
            environment: Environment::from_env(),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::parse("Production"), Environment::Production);
        assert_eq!(Environment::parse(" development "), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Unspecified);
        assert!(!Environment::Unspecified.is_development());
    }

    #[test]
    fn bind_addr_listens_on_all_interfaces() {
        let config = Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            port: 8080,
            organiser_password: "secret".to_string(),
            environment: Environment::Unspecified,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
        };
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
    }
}
