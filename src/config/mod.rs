//! Configuration management for php-web

pub mod schema;

pub use schema::{BuildpackYaml, PhpConfig};

use crate::error::{PhpWebError, PhpWebResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Name of the user configuration file in the app root
pub const BUILDPACK_YML: &str = "buildpack.yml";

/// Environment variables that override `buildpack.yml` values
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("BP_PHP_SERVER", "php.webserver"),
    ("BP_PHP_WEB_DIR", "php.webdirectory"),
    ("BP_PHP_LIB_DIR", "php.libdirectory"),
    ("BP_PHP_SERVER_ADMIN", "php.serveradmin"),
];

/// Loads user configuration for one application
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Config manager for the `buildpack.yml` in `app_root`
    pub fn new(app_root: &Path) -> Self {
        Self {
            config_path: app_root.join(BUILDPACK_YML),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// True if the user supplied a config file
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Load the file (or defaults) and apply environment overrides
    pub async fn load(&self) -> PhpWebResult<BuildpackYaml> {
        let mut config = self.load_file().await?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the file only, using defaults if it doesn't exist
    pub async fn load_file(&self) -> PhpWebResult<BuildpackYaml> {
        if !self.exists() {
            debug!("{} not found, using defaults", self.config_path.display());
            return Ok(BuildpackYaml::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            PhpWebError::io(format!("reading {}", self.config_path.display()), e)
        })?;

        Self::parse(&content, &self.config_path)
    }

    /// Parse `buildpack.yml` content
    pub fn parse(content: &str, path: &Path) -> PhpWebResult<BuildpackYaml> {
        // An empty document is null in YAML, which serde won't default
        if content.trim().is_empty() {
            return Ok(BuildpackYaml::default());
        }

        serde_yaml::from_str(content).map_err(|e| PhpWebError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Warn that `buildpack.yml` settings are going away.
    ///
    /// Lists each field the user actually set next to its replacement.
    /// Does nothing when there is no config file.
    pub async fn warn_deprecated(&self, buildpack_version: &str) -> PhpWebResult<()> {
        if !self.exists() {
            return Ok(());
        }

        let config = self.load_file().await?;
        let next = next_major_version(buildpack_version)?;

        warn!(
            "Setting PHP configurations through buildpack.yml will be deprecated soon in buildpack v{}.",
            next
        );
        warn!("Buildpack.yml values will be replaced by environment variables in the next major version:");
        for (field, replacement) in deprecated_fields(&config.php) {
            warn!("  {} -> {}", field, replacement);
        }

        Ok(())
    }
}

/// Apply `BP_PHP_*` overrides using `lookup` to read variables
pub fn apply_env_overrides(config: &mut BuildpackYaml, lookup: impl Fn(&str) -> Option<String>) {
    for (var, field) in ENV_OVERRIDES {
        let Some(value) = lookup(*var).filter(|v| !v.is_empty()) else {
            continue;
        };
        debug!("{} overrides {}", var, field);
        match *var {
            "BP_PHP_SERVER" => config.php.webserver = value,
            "BP_PHP_WEB_DIR" => config.php.webdirectory = value,
            "BP_PHP_LIB_DIR" => config.php.libdirectory = value,
            "BP_PHP_SERVER_ADMIN" => config.php.serveradmin = value,
            _ => {}
        }
    }
}

/// Fields set away from their defaults, mapped to what replaces them
pub fn deprecated_fields(php: &PhpConfig) -> BTreeMap<&'static str, &'static str> {
    let defaults = PhpConfig::default();
    let mut fields = BTreeMap::new();

    if !php.version.is_empty() {
        fields.insert("php.version", "BP_PHP_VERSION");
    }
    if php.libdirectory != defaults.libdirectory {
        fields.insert("php.libdirectory", "BP_PHP_LIB_DIR");
    }
    if php.webdirectory != defaults.webdirectory {
        fields.insert("php.webdirectory", "BP_PHP_WEB_DIR");
    }
    if php.webserver != defaults.webserver {
        fields.insert("php.webserver", "BP_PHP_SERVER");
    }
    if php.serveradmin != defaults.serveradmin {
        fields.insert("php.serveradmin", "BP_PHP_SERVER_ADMIN");
    }
    if php.redis != defaults.redis {
        fields.insert("php.redis.session_store_service_name", "use a service binding");
    }
    if php.memcached != defaults.memcached {
        fields.insert(
            "php.memcached.session_store_service_name",
            "use a service binding",
        );
    }
    if !php.script.is_empty() {
        fields.insert("php.script", "use a Procfile");
    }
    if !php.enable_https_redirect {
        fields.insert("php.enable_https_redirect", "BP_PHP_ENABLE_HTTPS_REDIRECT");
    }

    fields
}

fn next_major_version(version: &str) -> PhpWebResult<semver::Version> {
    let current = semver::Version::parse(version).map_err(|e| PhpWebError::VersionInvalid {
        version: version.to_string(),
        reason: e.to_string(),
    })?;
    Ok(semver::Version::new(current.major + 1, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(temp.path());

        let config = manager.load_file().await.unwrap();
        assert_eq!(config, BuildpackYaml::default());
    }

    #[tokio::test]
    async fn load_empty_file_is_default() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(BUILDPACK_YML), "\n").unwrap();

        let config = ConfigManager::new(temp.path()).load_file().await.unwrap();
        assert_eq!(config.php.webserver, schema::PHP_WEB_SERVER);
    }

    #[tokio::test]
    async fn load_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(BUILDPACK_YML), "php: [oops").unwrap();

        let err = ConfigManager::new(temp.path()).load_file().await.unwrap_err();
        assert!(matches!(err, PhpWebError::ConfigInvalid { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("BP_PHP_SERVER", "nginx"), ("BP_PHP_WEB_DIR", "")]);
        let mut config = BuildpackYaml::default();

        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.php.webserver, "nginx");
        // empty values are ignored
        assert_eq!(config.php.webdirectory, "htdocs");
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_process_env() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(BUILDPACK_YML),
            "php:\n  webserver: httpd\n",
        )
        .unwrap();

        std::env::set_var("BP_PHP_SERVER_ADMIN", "ops@example.com");
        let config = ConfigManager::new(temp.path()).load().await.unwrap();
        std::env::remove_var("BP_PHP_SERVER_ADMIN");

        assert_eq!(config.php.webserver, "httpd");
        assert_eq!(config.php.serveradmin, "ops@example.com");
    }

    #[test]
    fn deprecated_fields_lists_only_changed_values() {
        let mut php = PhpConfig::default();
        php.webserver = "nginx".to_string();
        php.script = "worker.php".to_string();

        let fields = deprecated_fields(&php);
        assert_eq!(fields.get("php.webserver"), Some(&"BP_PHP_SERVER"));
        assert_eq!(fields.get("php.script"), Some(&"use a Procfile"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn next_major_bumps_major() {
        assert_eq!(next_major_version("0.4.2").unwrap().to_string(), "1.0.0");
        assert!(next_major_version("not-a-version").is_err());
    }
}
