//! Runtime settings read from the environment (`.env` is honoured by the server binary via dotenvy).

use crate::error::ConfigError;
use crate::store::DeletePolicy;
use std::net::SocketAddr;
use std::str::FromStr;

/// `DATABASE_URL` value that selects the in-process store instead of PostgreSQL.
pub const MEMORY_DATABASE_URL: &str = "memory";

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ecommerce";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub delete_policy: DeletePolicy,
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_url: DEFAULT_DATABASE_URL.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            delete_policy: DeletePolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (process env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS", &DEFAULT_MAX_CONNECTIONS.to_string())?;
        let delete_policy = parse_var(&lookup, "CUSTOMER_DELETE_POLICY", "restrict")?;
        let max_body_bytes = parse_var(&lookup, "MAX_BODY_BYTES", &DEFAULT_MAX_BODY_BYTES.to_string())?;
        Ok(ServiceConfig {
            database_url,
            bind_addr,
            max_connections,
            delete_policy,
            max_body_bytes,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.eq_ignore_ascii_case(MEMORY_DATABASE_URL)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.database_url, "postgres://localhost/ecommerce");
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.delete_policy, DeletePolicy::Restrict);
        assert!(!cfg.uses_memory_store());
    }

    #[test]
    fn reads_overrides() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "memory"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("CUSTOMER_DELETE_POLICY", "Cascade"),
            ("MAX_BODY_BYTES", "1024"),
        ]))
        .unwrap();
        assert!(cfg.uses_memory_store());
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.delete_policy, DeletePolicy::Cascade);
        assert_eq!(cfg.max_body_bytes, 1024);
    }

    #[test]
    fn nullify_policy_is_accepted() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[("CUSTOMER_DELETE_POLICY", "nullify")])).unwrap();
        assert_eq!(cfg.delete_policy, DeletePolicy::Nullify);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("CUSTOMER_DELETE_POLICY", "orphan")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CUSTOMER_DELETE_POLICY", .. }));

        let err = ServiceConfig::from_lookup(lookup_from(&[("DB_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. }));
    }
}
