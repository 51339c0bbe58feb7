use super::{Feature, FeatureConfig, FeatureKind, PHP_INI_SCAN_DIR};
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::services::{credential_str, Credentials};
use crate::templates;
use async_trait::async_trait;
use std::path::PathBuf;

const DEFAULT_SERVERS: &str = "127.0.0.1";

/// PHP sessions stored in a bound Memcached service
pub struct MemcachedSessions {
    credentials: Option<Credentials>,
    app_root: PathBuf,
}

impl MemcachedSessions {
    pub fn new(cfg: &FeatureConfig) -> Self {
        let binding = &cfg.config.php.memcached.session_store_service_name;
        Self {
            credentials: cfg.services.find(binding, "memcached").cloned(),
            app_root: cfg.app_root.clone(),
        }
    }

    fn ini(&self) -> String {
        let field = |key| {
            self.credentials
                .as_ref()
                .and_then(|c| credential_str(c, key))
        };
        templates::memcached_session_ini(
            field("servers").unwrap_or(DEFAULT_SERVERS),
            field("username").unwrap_or_default(),
            field("password").unwrap_or_default(),
        )
    }
}

#[async_trait]
impl Feature for MemcachedSessions {
    fn name(&self) -> &'static str {
        "memcached-sessions"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::SessionStore
    }

    fn is_needed(&self) -> bool {
        self.credentials.is_some()
    }

    async fn enable_feature(&self, _layers: &Layers, _layer: &Layer) -> PhpWebResult<()> {
        let path = self
            .app_root
            .join(PHP_INI_SCAN_DIR)
            .join("memcached-sessions.ini");
        write_file(&path, &self.ini()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::Fixture;
    use crate::services::{ServiceBinding, Services};
    use serde_json::json;

    #[tokio::test]
    async fn writes_sasl_credentials() {
        let fixture = Fixture::new();
        let mut cfg = fixture.config("httpd", true);
        cfg.services = Services::new(vec![ServiceBinding {
            binding_name: "memcached-sessions".to_string(),
            credentials: json!({"servers": "m1:11211", "username": "u", "password": "p"})
                .as_object()
                .cloned()
                .unwrap(),
            ..Default::default()
        }]);
        let feature = MemcachedSessions::new(&cfg);
        assert!(feature.is_needed());

        feature
            .enable_feature(&fixture.layers(), &fixture.layer())
            .await
            .unwrap();

        let ini = std::fs::read_to_string(
            fixture
                .app
                .path()
                .join(".php.ini.d")
                .join("memcached-sessions.ini"),
        )
        .unwrap();
        assert!(ini.contains("session.save_path=\"m1:11211\""));
        assert!(ini.contains("memcached.sess_sasl_username=\"u\""));
        assert!(ini.contains("memcached.sess_sasl_password=\"p\""));
    }

    #[test]
    fn found_by_label() {
        let fixture = Fixture::new();
        let mut cfg = fixture.config("httpd", true);
        cfg.services = Services::new(vec![ServiceBinding {
            binding_name: "cache".to_string(),
            label: "memcached".to_string(),
            ..Default::default()
        }]);
        let feature = MemcachedSessions::new(&cfg);
        assert!(feature.is_needed());
        assert!(feature.ini().contains("session.save_path=\"127.0.0.1\""));
    }
}
