use super::{Feature, FeatureConfig, FeatureKind};
use crate::config::schema::DEFAULT_CLI_SCRIPTS;
use crate::error::PhpWebResult;
use crate::layer::{Layer, LaunchMetadata, Layers};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Script to run for a non-web app.
///
/// The configured script wins; otherwise the first well-known script that
/// exists, falling back to `app.php`.
pub fn resolve_script(app_root: &Path, configured: &str) -> String {
    if !configured.is_empty() {
        return configured.to_string();
    }

    if let Some(found) = DEFAULT_CLI_SCRIPTS
        .iter()
        .find(|name| app_root.join(name).is_file())
    {
        return found.to_string();
    }

    let fallback = DEFAULT_CLI_SCRIPTS[0];
    warn!(
        "No script found, tried {}. Defaulting to {}; set php.script in buildpack.yml to pick another",
        DEFAULT_CLI_SCRIPTS.join(", "),
        fallback
    );
    fallback.to_string()
}

/// Runs a PHP script as the app's process
pub struct Scripts {
    needed: bool,
    app_root: PathBuf,
    configured: String,
}

impl Scripts {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: !cfg.is_web_app(),
            app_root: cfg.app_root.clone(),
            configured: cfg.config.php.script.clone(),
        }
    }
}

#[async_trait]
impl Feature for Scripts {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::ScriptRunner
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, layers: &Layers, _layer: &Layer) -> PhpWebResult<()> {
        let script = resolve_script(&self.app_root, &self.configured);
        let command = format!("php {}", self.app_root.join(script).display());
        layers
            .write_application_metadata(&LaunchMetadata::web_and_task(command))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::Fixture;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn configured_script_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.php"), "").unwrap();
        assert_eq!(resolve_script(dir.path(), "bin/worker.php"), "bin/worker.php");
    }

    #[test]
    fn first_existing_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("run.php"), "").unwrap();
        fs::write(dir.path().join("start.php"), "").unwrap();
        assert_eq!(resolve_script(dir.path(), ""), "run.php");
    }

    #[test]
    fn falls_back_to_app_php() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_script(dir.path(), ""), "app.php");
    }

    #[tokio::test]
    async fn launches_script() {
        let fixture = Fixture::new();
        fs::write(fixture.app.path().join("main.php"), "<?php").unwrap();
        let feature = Scripts::new(&fixture.config("php-server", false));
        assert!(feature.is_needed());

        let layers = fixture.layers();
        feature
            .enable_feature(&layers, &fixture.layer())
            .await
            .unwrap();

        let launch = layers.read_application_metadata().await.unwrap().unwrap();
        let expected = format!("php {}", fixture.app.path().join("main.php").display());
        assert_eq!(launch.command("web"), Some(expected.as_str()));
        assert_eq!(launch.command("task"), Some(expected.as_str()));
    }
}
