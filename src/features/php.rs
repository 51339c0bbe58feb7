use super::{Feature, FeatureConfig, FeatureKind, PHP_INI_SCAN_DIR};
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::templates::{self, PhpIniConfig};
use async_trait::async_trait;
use std::path::PathBuf;

/// Base PHP runtime configuration. Always enabled.
pub struct Php {
    ini: PhpIniConfig,
}

impl Php {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            ini: PhpIniConfig {
                app_root: cfg.app_root.clone(),
                lib_directory: cfg.config.php.libdirectory.clone(),
                php_home: cfg.php_home.clone(),
                php_api: cfg.php_api.clone(),
            },
        }
    }

    fn scan_dir(&self) -> PathBuf {
        self.ini.app_root.join(PHP_INI_SCAN_DIR)
    }
}

#[async_trait]
impl Feature for Php {
    fn name(&self) -> &'static str {
        "php"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::RuntimeInit
    }

    fn is_needed(&self) -> bool {
        true
    }

    async fn enable_feature(&self, _layers: &Layers, layer: &Layer) -> PhpWebResult<()> {
        let etc = layer.etc_dir();
        write_file(&etc.join("php.ini"), &templates::php_ini(&self.ini)).await?;

        layer
            .override_shared_env("PHPRC", &etc.to_string_lossy())
            .await?;
        layer
            .override_shared_env("PHP_INI_SCAN_DIR", &self.scan_dir().to_string_lossy())
            .await
    }
}
