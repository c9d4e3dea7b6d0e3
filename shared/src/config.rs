use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_TABLE_NAME: &str = "gallery";
const DEFAULT_BUCKET_NAME: &str = "gallery-photos";
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    pub user_pool_id: String,
    pub contact_to_email: Option<String>,
    pub contact_from_email: Option<String>,
    pub allowed_origins: Vec<String>,
    pub signed_url_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let with_default = |key: &str, default: &str| {
            var(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let user_pool_id =
            var("COGNITO_USER_POOL_ID").ok_or(ConfigError::Missing("COGNITO_USER_POOL_ID"))?;

        let signed_url_ttl = match var("SIGNED_URL_TTL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "SIGNED_URL_TTL_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_SIGNED_URL_TTL_SECS,
        };

        let allowed_origins: Vec<String> = with_default("ALLOWED_ORIGINS", DEFAULT_ORIGIN)
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let contact_to_email = var("CONTACT_TO_EMAIL");
        let contact_from_email = var("CONTACT_FROM_EMAIL");
        if contact_to_email.is_none() || contact_from_email.is_none() {
            warn!("CONTACT_TO_EMAIL / CONTACT_FROM_EMAIL not set, contact form disabled");
        }

        Ok(Config {
            table_name: with_default("TABLE_NAME", DEFAULT_TABLE_NAME),
            bucket_name: with_default("BUCKET_NAME", DEFAULT_BUCKET_NAME),
            user_pool_id,
            contact_to_email,
            contact_from_email,
            allowed_origins,
            signed_url_ttl: Duration::from_secs(signed_url_ttl),
        })
    }

    /// Origin to echo in `Access-Control-Allow-Origin`: the request origin when
    /// it is allowed, otherwise the first configured origin.
    pub fn cors_origin(&self, request_origin: Option<&str>) -> String {
        let first = self
            .allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ORIGIN);

        match request_origin.map(|o| o.trim_end_matches('/')) {
            Some(origin) if self.allowed_origins.iter().any(|a| a == origin) => origin.to_string(),
            _ => first.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("COGNITO_USER_POOL_ID", "pool")]).unwrap();
        assert_eq!(config.table_name, "gallery");
        assert_eq!(config.bucket_name, "gallery-photos");
        assert_eq!(config.signed_url_ttl, Duration::from_secs(3600));
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.contact_to_email, None);
    }

    #[test]
    fn user_pool_is_required() {
        assert_eq!(
            load(&[("TABLE_NAME", "t")]).unwrap_err(),
            ConfigError::Missing("COGNITO_USER_POOL_ID")
        );
    }

    #[test]
    fn bad_ttl_is_rejected() {
        let err =
            load(&[("COGNITO_USER_POOL_ID", "pool"), ("SIGNED_URL_TTL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SIGNED_URL_TTL_SECS", .. }));
    }

    #[test]
    fn cors_echoes_allowed_origin_only() {
        let config = load(&[
            ("COGNITO_USER_POOL_ID", "pool"),
            ("ALLOWED_ORIGINS", "https://gallery.example.com, https://admin.example.com/"),
        ])
        .unwrap();

        assert_eq!(
            config.cors_origin(Some("https://admin.example.com")),
            "https://admin.example.com"
        );
        assert_eq!(
            config.cors_origin(Some("https://evil.example.net")),
            "https://gallery.example.com"
        );
        assert_eq!(config.cors_origin(None), "https://gallery.example.com");
    }
}
