use super::{Feature, FeatureConfig, FeatureKind, PHP_INI_SCAN_DIR};
use crate::error::PhpWebResult;
use crate::layer::{write_file, Layer, Layers};
use crate::services::{credential_port, credential_str, Credentials};
use crate::templates;
use async_trait::async_trait;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;

/// PHP sessions stored in a bound Redis service
pub struct RedisSessions {
    credentials: Option<Credentials>,
    app_root: PathBuf,
}

impl RedisSessions {
    pub fn new(cfg: &FeatureConfig) -> Self {
        let binding = &cfg.config.php.redis.session_store_service_name;
        Self {
            credentials: cfg.services.find(binding, "redis").cloned(),
            app_root: cfg.app_root.clone(),
        }
    }

    fn ini(&self) -> String {
        let creds = self.credentials.as_ref();
        let host = creds
            .and_then(|c| credential_str(c, "host").or_else(|| credential_str(c, "hostname")))
            .unwrap_or(DEFAULT_HOST);
        let port = creds
            .and_then(|c| credential_port(c, "port"))
            .unwrap_or(DEFAULT_PORT);
        let password = creds.and_then(|c| credential_str(c, "password"));
        templates::redis_session_ini(host, port, password)
    }
}

#[async_trait]
impl Feature for RedisSessions {
    fn name(&self) -> &'static str {
        "redis-sessions"
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
            .join("redis-sessions.ini");
        write_file(&path, &self.ini()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::Fixture;
    use crate::services::{ServiceBinding, Services};
    use serde_json::{json, Value};

    fn bound(fixture: &Fixture, name: &str, label: &str, creds: Value) -> FeatureConfig {
        let mut cfg = fixture.config("nginx", true);
        cfg.services = Services::new(vec![ServiceBinding {
            binding_name: name.to_string(),
            label: label.to_string(),
            tags: vec![],
            credentials: creds.as_object().cloned().unwrap_or_default(),
        }]);
        cfg
    }

    #[test]
    fn not_needed_without_binding() {
        let fixture = Fixture::new();
        assert!(!RedisSessions::new(&fixture.config("nginx", true)).is_needed());
    }

    #[tokio::test]
    async fn writes_session_ini_with_auth() {
        let fixture = Fixture::new();
        let cfg = bound(
            &fixture,
            "redis-sessions",
            "user-provided",
            json!({"hostname": "redis.internal", "port": "6380", "password": "a b&c"}),
        );
        let feature = RedisSessions::new(&cfg);
        assert!(feature.is_needed());

        feature
            .enable_feature(&fixture.layers(), &fixture.layer())
            .await
            .unwrap();

        let ini = std::fs::read_to_string(
            fixture.app.path().join(".php.ini.d").join("redis-sessions.ini"),
        )
        .unwrap();
        assert!(ini.contains("session.save_path=tcp://redis.internal:6380?auth=a%20b%26c"));
        assert!(ini.contains("extension=igbinary.so"));
    }

    #[test]
    fn defaults_when_credentials_are_sparse() {
        let fixture = Fixture::new();
        let cfg = bound(&fixture, "cache", "redis", json!({}));
        let ini = RedisSessions::new(&cfg).ini();
        assert!(ini.contains("session.save_path=tcp://127.0.0.1:6379\n"));
    }
}
