use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub legacy: LegacySettings,
    pub account: AccountSettings,
    pub log: LogSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    // 只在 HTTPS 部署时打开
    pub secure_cookies: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    pub base_path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LegacySettings {
    /// Serve the catalogue from the legacy API instead of the local tables.
    pub enabled: bool,
    pub base_address: String,
    pub enable_periodic_mod_fetch: bool,
    pub hydration_interval_secs: u64,
    pub hydration_concurrency: usize,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AccountSettings {
    pub link_token_expiration_minutes: i64,
    pub link_token_mod_post_url: String,
    pub session_lifetime_days: i64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogSettings {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::build(&run_mode, collect_env_vars(std::env::vars()))
    }

    fn build(run_mode: &str, env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let env_json =
            serde_json::to_string(&env_map).map_err(|e| ConfigError::Message(e.to_string()))?;

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origins", "*")?
            .set_default("server.secure_cookies", false)?
            .set_default("database.url", "sqlite://data/moddb.db")?
            .set_default("storage.base_path", "data/storage")?
            .set_default("legacy.enabled", true)?
            .set_default("legacy.base_address", "https://mods.vintagestory.at/")?
            .set_default("legacy.enable_periodic_mod_fetch", true)?
            .set_default("legacy.hydration_interval_secs", 30 * 60)?
            .set_default("legacy.hydration_concurrency", 8)?
            .set_default("legacy.timeout_secs", 30)?
            .set_default("account.link_token_expiration_minutes", 10)?
            .set_default(
                "account.link_token_mod_post_url",
                "https://mods.vintagestory.at/show/mod/1",
            )?
            .set_default("account.session_lifetime_days", 14)?
            .set_default("log.level", "info")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(&env_json, config::FileFormat::Json))
            .build()?;

        s.try_deserialize()
    }
}

/// `MODDB_LEGACY__BASE_ADDRESS` -> `legacy.base_address`
fn collect_env_vars(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, _)| k.starts_with("MODDB_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("MODDB_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_map_to_sections() {
        let vars = vec![
            ("MODDB_LEGACY__ENABLED".to_string(), "false".to_string()),
            ("MODDB_SERVER__PORT".to_string(), "8080".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];
        let map = collect_env_vars(vars.into_iter());

        assert_eq!(map.len(), 2);
        assert_eq!(map["legacy.enabled"], "false");
        assert_eq!(map["server.port"], "8080");
    }

    #[test]
    fn defaults_then_overrides() {
        let defaults = Settings::build("test-none", HashMap::new()).unwrap();
        assert!(defaults.legacy.enabled);
        assert_eq!(defaults.account.link_token_expiration_minutes, 10);
        assert_eq!(defaults.legacy.hydration_concurrency, 8);

        let env = collect_env_vars(
            vec![
                ("MODDB_LEGACY__ENABLED".to_string(), "false".to_string()),
                ("MODDB_ACCOUNT__LINK_TOKEN_EXPIRATION_MINUTES".to_string(), "3".to_string()),
            ]
            .into_iter(),
        );
        let overridden = Settings::build("test-none", env).unwrap();
        assert!(!overridden.legacy.enabled);
        assert_eq!(overridden.account.link_token_expiration_minutes, 3);
    }
}
