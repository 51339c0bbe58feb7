use super::{Feature, FeatureConfig, FeatureKind};
use crate::config::schema::APACHE_HTTPD;
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::procs::{append_or_update, ProcessEntry, ProcessTable, PHP_FPM_PROCESS};
use crate::templates::{self, PhpFpmConfig};
use async_trait::async_trait;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the app root holding user pool configs
pub const FPM_CONFIG_DIR: &str = ".php.fpm.d";

/// Unix socket php-fpm listens on for nginx, relative to the layer
pub const FPM_SOCKET_FILE: &str = "php-fpm.socket";

/// TCP address php-fpm listens on for httpd
pub const HTTPD_FPM_LISTEN: &str = "127.0.0.1:9000";

fn custom_config_glob(app_root: &Path) -> String {
    format!(
        "{}/*.conf",
        Pattern::escape(&app_root.join(FPM_CONFIG_DIR).to_string_lossy())
    )
}

/// True if the app ships its own `.php.fpm.d/*.conf`
pub fn has_custom_fpm_config(app_root: &Path) -> PhpWebResult<bool> {
    Ok(glob::glob(&custom_config_glob(app_root))?
        .filter_map(|entry| entry.ok())
        .any(|path| path.is_file()))
}

/// php-fpm worker pool serving httpd or nginx
pub struct PhpFpm {
    needed: bool,
    for_httpd: bool,
    app_root: PathBuf,
}

impl PhpFpm {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: cfg.is_fpm_web_app(),
            for_httpd: cfg.web_server() == APACHE_HTTPD,
            app_root: cfg.app_root.clone(),
        }
    }

    fn listen(&self, layer: &Layer) -> String {
        if self.for_httpd {
            HTTPD_FPM_LISTEN.to_string()
        } else {
            layer.root().join(FPM_SOCKET_FILE).to_string_lossy().into_owned()
        }
    }
}

#[async_trait]
impl Feature for PhpFpm {
    fn name(&self) -> &'static str {
        "php-fpm"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::WebServer
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, _layers: &Layers, layer: &Layer) -> PhpWebResult<()> {
        let include = if has_custom_fpm_config(&self.app_root)? {
            let pools = self.app_root.join(FPM_CONFIG_DIR).join("*.conf");
            Some(pools.to_string_lossy().into_owned())
        } else {
            debug!("No custom pools in {}", self.app_root.join(FPM_CONFIG_DIR).display());
            None
        };

        let conf = PhpFpmConfig {
            php_home: layer.root().to_path_buf(),
            listen: self.listen(layer),
            include,
        };
        let etc = layer.etc_dir();
        let conf_path = etc.join("php-fpm.conf");
        write_file(&conf_path, &templates::php_fpm_conf(&conf)).await?;

        let prefix = layer.root().to_string_lossy().into_owned();
        let conf_path = conf_path.to_string_lossy().into_owned();
        let etc = etc.to_string_lossy().into_owned();
        let entry = ProcessEntry::new(
            PHP_FPM_PROCESS,
            [
                "-p",
                prefix.as_str(),
                "-y",
                conf_path.as_str(),
                "-c",
                etc.as_str(),
            ],
        );
        append_or_update(
            &layer.procs_path(),
            ProcessTable::from_entries([(PHP_FPM_PROCESS, entry)]),
        )
        .await
    }
}
