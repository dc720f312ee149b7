use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: Store,
    pub tokens: Tokens,
    pub hashing: Hashing,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "mysql", "redis" or "memory"
    #[serde(default)]
    pub mysql_dsn: Option<String>,
    #[serde(default)]
    pub redis_dsn: Option<String>,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub ensure_schema: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Tokens {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_signing_key_env")]
    pub signing_key_env: String,
    /// Fallback used only when the environment variable is unset.
    #[serde(default)]
    pub dev_signing_key: Option<String>,
    #[serde(default)]
    pub verify_on_refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct Hashing {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

fn default_redis_prefix() -> String {
    "pairauth".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    20
}

fn default_operation_timeout_secs() -> u64 {
    5
}

fn default_algorithm() -> String {
    "HS512".to_string()
}

fn default_signing_key_env() -> String {
    "PAIRAUTH_SIGNING_KEY".to_string()
}

impl Tokens {
    pub fn signing_key(&self) -> Result<Vec<u8>> {
        match std::env::var(&self.signing_key_env) {
            Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
            _ => self
                .dev_signing_key
                .clone()
                .map(String::into_bytes)
                .ok_or_else(|| anyhow!("signing key not set, export {}", self.signing_key_env)),
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_parse() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();

        assert_eq!(settings.store.backend, "memory");
        assert_eq!(settings.store.connect_timeout_secs, 20);
        assert_eq!(settings.tokens.algorithm, "HS512");
        assert!(!settings.tokens.verify_on_refresh);
    }

    #[test]
    fn release_settings_parse() {
        let settings = parse_settings(Some("settings/release.toml")).unwrap();

        assert_eq!(settings.store.backend, "mysql");
        assert!(settings.store.mysql_dsn.is_some());
        assert!(settings.tokens.dev_signing_key.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }

    #[test]
    fn dev_key_is_a_fallback() {
        let tokens = Tokens {
            algorithm: default_algorithm(),
            signing_key_env: "PAIRAUTH_TEST_UNSET_SIGNING_KEY".to_string(),
            dev_signing_key: Some("dev-key".to_string()),
            verify_on_refresh: false,
        };
        assert_eq!(tokens.signing_key().unwrap(), b"dev-key".to_vec());

        let tokens = Tokens {
            dev_signing_key: None,
            ..tokens
        };
        assert!(tokens.signing_key().is_err());
    }
}
