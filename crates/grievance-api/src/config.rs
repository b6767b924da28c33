//! Process configuration, read once from the environment at startup.
//!
//! Environment variables (defaults in parentheses):
//!   HOST (0.0.0.0), PORT (8000)
//!   STORAGE_BACKEND     - "postgres" or "memory" (postgres)
//!   DATABASE_URL        - required for postgres storage
//!   DB_MAX_CONNECTIONS  - pool size (10)
//!   GRIEVANCE_ID_PREFIX - id prefix (GRV-)
//!   SYNC_TOKEN          - bearer secret for /sync (alias ODOO_TOKEN)
//!   SYNC_ALLOWED_IPS    - comma-separated CIDRs (alias ODOO_ALLOWED_IPS)
//!   UPLOAD_MAX_BYTES, UPLOAD_ALLOWED_TYPES
//!   OBJECT_STORE        - "http", "filesystem" or "none" (http)
//!   OBJECT_STORE_ENDPOINT, OBJECT_STORE_BUCKET, OBJECT_STORE_PATH, OBJECT_STORE_PUBLIC_URL
//!   OPENAI_API_KEY      - enables the categorization advisor
//!   OPENAI_BASE_URL, OPENAI_MODEL, CATEGORIZER_TIMEOUT_SECS
//!   NOTIFY_ENDPOINT     - mail relay URL; unset logs confirmations instead
//!   NOTIFY_FROM, NOTIFY_API_KEY
//!   HOUSEHOLD_DIRECTORY_PATH, TAXONOMY_PATH
//!   ALLOWED_ORIGINS     - comma-separated CORS origins
//!   RATE_LIMIT_ENABLED, RATE_LIMIT_REQUESTS, RATE_LIMIT_PERIOD_SECS

use std::path::PathBuf;
use std::str::FromStr;

use grievance_core::defaults::{
    CATEGORIZER_MODEL, CATEGORIZER_TIMEOUT_SECS, DB_MAX_CONNECTIONS, ID_PREFIX, NOTIFY_FROM,
    OBJECT_STORE_BUCKET, OBJECT_STORE_ENDPOINT, OPENAI_BASE_URL, RATE_LIMIT_PERIOD_SECS,
    RATE_LIMIT_REQUESTS, SERVER_HOST, SERVER_PORT, UPLOAD_ALLOWED_TYPES, UPLOAD_MAX_BYTES,
};
use grievance_core::{Error, Result};

use crate::middleware::AllowedNetwork;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    Http {
        endpoint: String,
        bucket: String,
        public_url: Option<String>,
    },
    Filesystem {
        path: PathBuf,
        public_url: String,
    },
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub endpoint: Option<String>,
    pub from: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests: u64,
    pub period_secs: u64,
}

/// Immutable service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub id_prefix: String,
    pub sync_token: Option<String>,
    pub sync_allowed_ips: Vec<AllowedNetwork>,
    pub upload_max_bytes: u64,
    pub upload_allowed_types: Vec<String>,
    pub object_store: ObjectStoreConfig,
    /// `None` when no API key is configured.
    pub advisor: Option<AdvisorConfig>,
    pub categorizer_timeout_secs: u64,
    pub notify: NotifyConfig,
    pub household_directory_path: Option<PathBuf>,
    pub taxonomy_path: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
    /// `None` when rate limiting is disabled.
    pub rate_limit: Option<RateLimitConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_any = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(Error::Config(format!("unknown STORAGE_BACKEND '{}'", other)))
            }
        };
        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required when STORAGE_BACKEND=postgres".into(),
            ));
        }

        let sync_allowed_ips = match get_any(&["SYNC_ALLOWED_IPS", "ODOO_ALLOWED_IPS"]) {
            Some(raw) => AllowedNetwork::parse_list(&raw).map_err(Error::Config)?,
            None => Vec::new(),
        };

        let upload_allowed_types = match get("UPLOAD_ALLOWED_TYPES") {
            Some(raw) => split_list(&raw),
            None => UPLOAD_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        };

        let object_store = match get("OBJECT_STORE").as_deref() {
            None | Some("http") => ObjectStoreConfig::Http {
                endpoint: get("OBJECT_STORE_ENDPOINT")
                    .unwrap_or_else(|| OBJECT_STORE_ENDPOINT.to_string()),
                bucket: get("OBJECT_STORE_BUCKET")
                    .unwrap_or_else(|| OBJECT_STORE_BUCKET.to_string()),
                public_url: get("OBJECT_STORE_PUBLIC_URL"),
            },
            Some("filesystem") => ObjectStoreConfig::Filesystem {
                path: get("OBJECT_STORE_PATH").map(PathBuf::from).ok_or_else(|| {
                    Error::Config("OBJECT_STORE_PATH is required for filesystem storage".into())
                })?,
                public_url: get("OBJECT_STORE_PUBLIC_URL").unwrap_or_else(|| "/files".into()),
            },
            Some("none") => ObjectStoreConfig::Disabled,
            Some(other) => return Err(Error::Config(format!("unknown OBJECT_STORE '{}'", other))),
        };

        let categorizer_timeout_secs = parse_or(
            get("CATEGORIZER_TIMEOUT_SECS"),
            "CATEGORIZER_TIMEOUT_SECS",
            CATEGORIZER_TIMEOUT_SECS,
        )?;
        let advisor = get("OPENAI_API_KEY").map(|api_key| AdvisorConfig {
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| CATEGORIZER_MODEL.to_string()),
            timeout_secs: categorizer_timeout_secs,
        });

        let rate_limit_enabled = get("RATE_LIMIT_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let rate_limit = if rate_limit_enabled {
            let requests = parse_or(
                get("RATE_LIMIT_REQUESTS"),
                "RATE_LIMIT_REQUESTS",
                RATE_LIMIT_REQUESTS,
            )?;
            let period_secs = parse_or(
                get("RATE_LIMIT_PERIOD_SECS"),
                "RATE_LIMIT_PERIOD_SECS",
                RATE_LIMIT_PERIOD_SECS,
            )?;
            if requests == 0 || period_secs == 0 {
                return Err(Error::Config("rate limit values must be non-zero".into()));
            }
            Some(RateLimitConfig {
                requests,
                period_secs,
            })
        } else {
            None
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| SERVER_HOST.to_string()),
            port: parse_or(get("PORT"), "PORT", SERVER_PORT)?,
            storage,
            database_url,
            db_max_connections: parse_or(
                get("DB_MAX_CONNECTIONS"),
                "DB_MAX_CONNECTIONS",
                DB_MAX_CONNECTIONS,
            )?,
            id_prefix: get("GRIEVANCE_ID_PREFIX").unwrap_or_else(|| ID_PREFIX.to_string()),
            sync_token: get_any(&["SYNC_TOKEN", "ODOO_TOKEN"]),
            sync_allowed_ips,
            upload_max_bytes: parse_or(
                get("UPLOAD_MAX_BYTES"),
                "UPLOAD_MAX_BYTES",
                UPLOAD_MAX_BYTES,
            )?,
            upload_allowed_types,
            object_store,
            advisor,
            categorizer_timeout_secs,
            notify: NotifyConfig {
                endpoint: get("NOTIFY_ENDPOINT"),
                from: get("NOTIFY_FROM").unwrap_or_else(|| NOTIFY_FROM.to_string()),
                api_key: get("NOTIFY_API_KEY"),
            },
            household_directory_path: get("HOUSEHOLD_DIRECTORY_PATH").map(PathBuf::from),
            taxonomy_path: get("TAXONOMY_PATH").map(PathBuf::from),
            allowed_origins: split_list(
                &get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            rate_limit,
        })
    }

    /// Configuration for tests and local runs: memory storage, no upstreams.
    pub fn for_memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            storage: StorageBackend::Memory,
            database_url: None,
            db_max_connections: DB_MAX_CONNECTIONS,
            id_prefix: ID_PREFIX.to_string(),
            sync_token: None,
            sync_allowed_ips: Vec::new(),
            upload_max_bytes: UPLOAD_MAX_BYTES,
            upload_allowed_types: UPLOAD_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            object_store: ObjectStoreConfig::Disabled,
            advisor: None,
            categorizer_timeout_secs: CATEGORIZER_TIMEOUT_SECS,
            notify: NotifyConfig {
                endpoint: None,
                from: NOTIFY_FROM.to_string(),
                api_key: None,
            },
            household_directory_path: None,
            taxonomy_path: None,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGINS.to_string()],
            rate_limit: None,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| Error::Config(format!("invalid value for {}: '{}'", key, v))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_storage() {
        let cfg = config(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.id_prefix, "GRV-");
        assert_eq!(cfg.upload_max_bytes, 10 * 1024 * 1024);
        assert!(cfg.upload_allowed_types.contains(&"application/pdf".to_string()));
        assert!(cfg.advisor.is_none());
        assert!(cfg.sync_token.is_none());
        assert!(cfg.rate_limit.is_none());
        assert_eq!(
            cfg.object_store,
            ObjectStoreConfig::Http {
                endpoint: "http://minio:9000".into(),
                bucket: "grievance-bucket".into(),
                public_url: None,
            }
        );
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(matches!(config(&[]), Err(Error::Config(_))));
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/g")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Postgres);
    }

    #[test]
    fn test_sync_aliases() {
        let cfg = config(&[
            ("STORAGE_BACKEND", "memory"),
            ("ODOO_TOKEN", "abc"),
            ("ODOO_ALLOWED_IPS", "10.0.0.0/8, 192.168.1.5"),
        ])
        .unwrap();
        assert_eq!(cfg.sync_token.as_deref(), Some("abc"));
        assert_eq!(cfg.sync_allowed_ips.len(), 2);

        let cfg = config(&[
            ("STORAGE_BACKEND", "memory"),
            ("SYNC_TOKEN", "primary"),
            ("ODOO_TOKEN", "legacy"),
        ])
        .unwrap();
        assert_eq!(cfg.sync_token.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_cidr_fails_startup() {
        let err = config(&[("STORAGE_BACKEND", "memory"), ("SYNC_ALLOWED_IPS", "10.0.0.0/40")]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_advisor_enabled_by_api_key() {
        let cfg = config(&[
            ("STORAGE_BACKEND", "memory"),
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENAI_MODEL", "gpt-test"),
            ("CATEGORIZER_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        let advisor = cfg.advisor.unwrap();
        assert_eq!(advisor.model, "gpt-test");
        assert_eq!(advisor.timeout_secs, 5);
        assert_eq!(advisor.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_rate_limit_and_bad_numbers() {
        let cfg = config(&[
            ("STORAGE_BACKEND", "memory"),
            ("RATE_LIMIT_ENABLED", "true"),
            ("RATE_LIMIT_REQUESTS", "5"),
        ])
        .unwrap();
        assert_eq!(
            cfg.rate_limit,
            Some(RateLimitConfig {
                requests: 5,
                period_secs: 60
            })
        );
        assert!(config(&[("STORAGE_BACKEND", "memory"), ("PORT", "eighty")]).is_err());
    }

    #[test]
    fn test_filesystem_store_requires_path() {
        assert!(config(&[("STORAGE_BACKEND", "memory"), ("OBJECT_STORE", "filesystem")]).is_err());
        let cfg = config(&[
            ("STORAGE_BACKEND", "memory"),
            ("OBJECT_STORE", "filesystem"),
            ("OBJECT_STORE_PATH", "/var/lib/grievance"),
        ])
        .unwrap();
        assert_eq!(
            cfg.object_store,
            ObjectStoreConfig::Filesystem {
                path: PathBuf::from("/var/lib/grievance"),
                public_url: "/files".into(),
            }
        );
    }
}
