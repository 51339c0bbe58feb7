use super::{Feature, FeatureConfig, FeatureKind, HTTPD_FPM_LISTEN};
use crate::config::schema::APACHE_HTTPD;
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::procs::{append_or_update, ProcessEntry, ProcessTable};
use crate::templates::{self, HttpdConfig};
use async_trait::async_trait;
use std::path::PathBuf;

/// Apache httpd in front of php-fpm
pub struct Httpd {
    needed: bool,
    conf: HttpdConfig,
}

impl Httpd {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: cfg.is_web_app() && cfg.web_server() == APACHE_HTTPD,
            conf: HttpdConfig {
                server_admin: cfg.config.php.serveradmin.clone(),
                app_root: cfg.app_root.clone(),
                web_directory: cfg.web_directory().to_string(),
                fpm_socket: HTTPD_FPM_LISTEN.to_string(),
                https_redirect: cfg.config.php.enable_https_redirect,
            },
        }
    }

    fn conf_path(&self) -> PathBuf {
        self.conf.app_root.join("httpd.conf")
    }
}

#[async_trait]
impl Feature for Httpd {
    fn name(&self) -> &'static str {
        "httpd"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::WebServer
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, _layers: &Layers, layer: &Layer) -> PhpWebResult<()> {
        let conf_path = self.conf_path();
        write_file(&conf_path, &templates::httpd_conf(&self.conf)).await?;

        let conf_path = conf_path.to_string_lossy().into_owned();
        let entry = ProcessEntry::new(
            APACHE_HTTPD,
            ["-f", conf_path.as_str(), "-k", "start", "-DFOREGROUND"],
        );
        append_or_update(
            &layer.procs_path(),
            ProcessTable::from_entries([(APACHE_HTTPD, entry)]),
        )
        .await
    }
}
