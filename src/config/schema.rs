//! Configuration schema for php-web
//!
//! User configuration lives in `buildpack.yml` at the application root,
//! under the top-level `php` key. Every field has a default so an empty or
//! absent file is valid.

use serde::{Deserialize, Serialize};

/// Web server identifier for Apache httpd
pub const APACHE_HTTPD: &str = "httpd";

/// Web server identifier for nginx
pub const NGINX: &str = "nginx";

/// Web server identifier for PHP's built-in server
pub const PHP_WEB_SERVER: &str = "php-server";

/// Scripts tried, in order, when no script is configured
pub const DEFAULT_CLI_SCRIPTS: &[&str] = &["app.php", "main.php", "run.php", "start.php"];

/// Root of `buildpack.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackYaml {
    /// PHP settings
    pub php: PhpConfig,
}

/// The `php` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhpConfig {
    /// Requested PHP version constraint
    pub version: String,

    /// Requested web server: `php-server`, `httpd` or `nginx`
    pub webserver: String,

    /// Document root, relative to the app root
    pub webdirectory: String,

    /// Library directory added to the include path
    pub libdirectory: String,

    /// Script to run for non-web apps
    pub script: String,

    /// ServerAdmin for httpd
    pub serveradmin: String,

    /// Redirect plain HTTP to HTTPS
    pub enable_https_redirect: bool,

    /// Redis session store settings
    pub redis: SessionStoreConfig,

    /// Memcached session store settings
    pub memcached: SessionStoreConfig,
}

impl Default for PhpConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            webserver: PHP_WEB_SERVER.to_string(),
            webdirectory: "htdocs".to_string(),
            libdirectory: "lib".to_string(),
            script: String::new(),
            serveradmin: "admin@localhost".to_string(),
            enable_https_redirect: true,
            redis: SessionStoreConfig::named("redis-sessions"),
            memcached: SessionStoreConfig::named("memcached-sessions"),
        }
    }
}

impl PhpConfig {
    /// Requested web server, lower-cased
    pub fn web_server(&self) -> String {
        self.webserver.to_lowercase()
    }

    /// True if the requested server is fronted by php-fpm
    pub fn uses_fpm(&self) -> bool {
        matches!(self.web_server().as_str(), APACHE_HTTPD | NGINX)
    }

    /// True if the requested server is one we know how to configure
    pub fn web_server_supported(&self) -> bool {
        matches!(
            self.web_server().as_str(),
            APACHE_HTTPD | NGINX | PHP_WEB_SERVER
        )
    }
}

/// Session store binding settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    /// Name of the service binding to use for sessions
    pub session_store_service_name: String,
}

impl SessionStoreConfig {
    fn named(name: &str) -> Self {
        Self {
            session_store_service_name: name.to_string(),
        }
    }
}
