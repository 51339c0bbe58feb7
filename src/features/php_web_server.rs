use super::{Feature, FeatureConfig, FeatureKind};
use crate::config::schema::PHP_WEB_SERVER;
use crate::error::PhpWebResult;
use crate::layer::{Layer, LaunchMetadata, Layers};
use async_trait::async_trait;
use std::path::PathBuf;

/// PHP's built-in web server, launched directly
pub struct PhpWebServer {
    needed: bool,
    web_root: PathBuf,
}

impl PhpWebServer {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: cfg.is_web_app() && cfg.web_server() == PHP_WEB_SERVER,
            web_root: cfg.web_root(),
        }
    }

    fn command(&self) -> String {
        format!("php -S 0.0.0.0:$PORT -t {}", self.web_root.display())
    }
}

#[async_trait]
impl Feature for PhpWebServer {
    fn name(&self) -> &'static str {
        "php-web-server"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::WebServer
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, layers: &Layers, _layer: &Layer) -> PhpWebResult<()> {
        layers
            .write_application_metadata(&LaunchMetadata::web_and_task(self.command()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::Fixture;

    #[tokio::test]
    async fn launches_built_in_server() {
        let fixture = Fixture::new();
        let mut cfg = fixture.config("php-server", true);
        cfg.config.php.webdirectory = "public".to_string();
        let feature = PhpWebServer::new(&cfg);
        assert!(feature.is_needed());

        let layers = fixture.layers();
        feature
            .enable_feature(&layers, &fixture.layer())
            .await
            .unwrap();

        let launch = layers.read_application_metadata().await.unwrap().unwrap();
        let expected = format!(
            "php -S 0.0.0.0:$PORT -t {}",
            fixture.app.path().join("public").display()
        );
        assert_eq!(launch.command("web"), Some(expected.as_str()));
        assert_eq!(launch.command("task"), Some(expected.as_str()));
    }

    #[test]
    fn not_needed_for_scripts() {
        let fixture = Fixture::new();
        assert!(!PhpWebServer::new(&fixture.config("php-server", false)).is_needed());
    }
}
