//! Build features
//!
//! A feature is one capability the build can add to the app: the PHP runtime
//! config, a web server, php-fpm, a session store, a script launcher or the
//! process manager. Features run in a fixed order against the same layer;
//! later features rely on process table entries written by earlier ones.

mod httpd;
mod memcached;
mod nginx;
mod php;
mod php_fpm;
mod php_web_server;
mod procmgr;
mod redis;
mod scripts;

pub use httpd::Httpd;
pub use memcached::MemcachedSessions;
pub use nginx::Nginx;
pub use php::Php;
pub use php_fpm::{has_custom_fpm_config, PhpFpm, FPM_CONFIG_DIR, FPM_SOCKET_FILE, HTTPD_FPM_LISTEN};
pub use php_web_server::PhpWebServer;
pub use procmgr::{ProcMgr, PROCMGR_BINARY};
pub use redis::RedisSessions;
pub use scripts::{resolve_script, Scripts};

use crate::config::BuildpackYaml;
use crate::detect::{pick_web_dir, AppShape};
use crate::error::PhpWebResult;
use crate::layer::{Layer, Layers};
use crate::services::Services;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Directory under the app root scanned for extra ini files
pub const PHP_INI_SCAN_DIR: &str = ".php.ini.d";

/// What part of the app a feature provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    RuntimeInit,
    WebServer,
    ProcessManager,
    SessionStore,
    ScriptRunner,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuntimeInit => "runtime-init",
            Self::WebServer => "web-server",
            Self::ProcessManager => "process-manager",
            Self::SessionStore => "session-store",
            Self::ScriptRunner => "script-runner",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build capability
///
/// `is_needed` must be pure: it only looks at facts captured when the
/// feature was built. All side effects happen in `enable_feature`.
#[async_trait]
pub trait Feature: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    fn kind(&self) -> FeatureKind;

    /// True if this feature applies to the app
    fn is_needed(&self) -> bool;

    /// Write this feature's files, env and processes
    async fn enable_feature(&self, layers: &Layers, layer: &Layer) -> PhpWebResult<()>;
}

/// Everything features know about the app being built
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Parsed `buildpack.yml` with env overrides applied
    pub config: BuildpackYaml,

    pub app_root: PathBuf,

    pub shape: AppShape,

    /// Services bound to the app
    pub services: Services,

    /// PHP install prefix, from `PHP_HOME`
    pub php_home: String,

    /// PHP extension API version, from `PHP_API`
    pub php_api: String,

    /// The `procmgr` executable installed into the layer
    pub procmgr_binary: PathBuf,
}

impl FeatureConfig {
    pub fn is_web_app(&self) -> bool {
        self.shape.is_web_app
    }

    /// Requested web server, lower-cased
    pub fn web_server(&self) -> String {
        self.config.php.web_server()
    }

    /// Requested web server when it's a web app and no feature serves it
    pub fn unsupported_web_server(&self) -> Option<String> {
        (self.is_web_app() && !self.config.php.web_server_supported()).then(|| self.web_server())
    }

    /// Web directory relative to the app root
    pub fn web_directory(&self) -> &str {
        pick_web_dir(&self.config)
    }

    /// Absolute document root
    pub fn web_root(&self) -> PathBuf {
        self.app_root.join(self.web_directory())
    }

    /// Web app served through php-fpm (httpd or nginx)
    pub fn is_fpm_web_app(&self) -> bool {
        self.is_web_app() && self.config.php.uses_fpm()
    }
}

/// All features in the order they must run
pub fn default_features(cfg: &FeatureConfig) -> Vec<Box<dyn Feature>> {
    vec![
        Box::new(Php::new(cfg)),
        Box::new(PhpWebServer::new(cfg)),
        Box::new(Httpd::new(cfg)),
        Box::new(Nginx::new(cfg)),
        Box::new(PhpFpm::new(cfg)),
        Box::new(RedisSessions::new(cfg)),
        Box::new(MemcachedSessions::new(cfg)),
        Box::new(Scripts::new(cfg)),
        Box::new(ProcMgr::new(cfg)),
    ]
}
