use super::{Feature, FeatureConfig, FeatureKind, FPM_SOCKET_FILE};
use crate::config::schema::NGINX;
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::procs::{append_or_update, ProcessEntry, ProcessTable};
use crate::templates::{self, NginxConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Launch script that fills in the platform port
const PORT_PROFILE: &str = "nginx-port.sh";

/// Nginx in front of php-fpm
pub struct Nginx {
    needed: bool,
    app_root: PathBuf,
    web_directory: String,
    https_redirect: bool,
}

impl Nginx {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: cfg.is_web_app() && cfg.web_server() == NGINX,
            app_root: cfg.app_root.clone(),
            web_directory: cfg.web_directory().to_string(),
            https_redirect: cfg.config.php.enable_https_redirect,
        }
    }

    fn conf_path(&self) -> PathBuf {
        self.app_root.join("nginx.conf")
    }
}

/// nginx has no env expansion in its config, so `${PORT}` is substituted
/// when the container starts.
fn port_profile(conf_path: &Path) -> String {
    format!(
        "sed -i \"s/\\${{PORT}}/${{PORT:-8080}}/\" '{}'\n",
        conf_path.display()
    )
}

#[async_trait]
impl Feature for Nginx {
    fn name(&self) -> &'static str {
        "nginx"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::WebServer
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, _layers: &Layers, layer: &Layer) -> PhpWebResult<()> {
        let conf = NginxConfig {
            app_root: self.app_root.clone(),
            web_directory: self.web_directory.clone(),
            fpm_socket: layer.root().join(FPM_SOCKET_FILE),
            https_redirect: self.https_redirect,
        };
        let conf_path = self.conf_path();
        write_file(&conf_path, &templates::nginx_conf(&conf)).await?;
        layer
            .write_profile(PORT_PROFILE, &port_profile(&conf_path))
            .await?;

        let prefix = self.app_root.to_string_lossy().into_owned();
        let conf_path = conf_path.to_string_lossy().into_owned();
        let entry = ProcessEntry::new(NGINX, ["-p", prefix.as_str(), "-c", conf_path.as_str()]);
        append_or_update(
            &layer.procs_path(),
            ProcessTable::from_entries([(NGINX, entry)]),
        )
        .await
    }
}
