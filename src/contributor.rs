//! Runs features against the app's layer

use crate::error::{PhpWebError, PhpWebResult};
use crate::features::{default_features, has_custom_fpm_config, Feature, FeatureConfig};
use crate::layer::{Layer, LayerFingerprint, LayerMetadata, Layers};
use tracing::{debug, info, warn};

/// Name of the layer features write into
pub const PHP_WEB_LAYER: &str = "php-web";

/// Applies an ordered list of features to one layer
pub struct Contributor {
    layers: Layers,
    layer: Layer,
    fingerprint: LayerFingerprint,
    features: Vec<Box<dyn Feature>>,
    unsupported_web_server: Option<String>,
}

impl Contributor {
    /// Contributor running every feature in its fixed order
    pub fn new(layers: Layers, cfg: &FeatureConfig, buildpack_version: &str) -> PhpWebResult<Self> {
        let fingerprint = LayerFingerprint::compute(
            buildpack_version,
            &cfg.config,
            has_custom_fpm_config(&cfg.app_root)?,
        )?;
        let mut contributor = Self::with_features(layers, fingerprint, default_features(cfg))?;
        contributor.unsupported_web_server = cfg.unsupported_web_server();
        Ok(contributor)
    }

    /// Contributor running `features` in the given order
    pub fn with_features(
        layers: Layers,
        fingerprint: LayerFingerprint,
        features: Vec<Box<dyn Feature>>,
    ) -> PhpWebResult<Self> {
        let layer = layers.layer(PHP_WEB_LAYER)?;
        Ok(Self {
            layers,
            layer,
            fingerprint,
            features,
            unsupported_web_server: None,
        })
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn fingerprint(&self) -> &LayerFingerprint {
        &self.fingerprint
    }

    /// Enable every needed feature, stopping at the first failure.
    ///
    /// Nothing done by earlier features is undone on failure.
    pub async fn contribute(&self) -> PhpWebResult<()> {
        if self.layer.is_current(&self.fingerprint).await? {
            debug!("Layer {} is current, reusing it", self.layer.name());
        } else {
            debug!("Layer {} changed, starting clean", self.layer.name());
            self.layer.reset().await?;
        }
        self.layer.ensure_root().await?;
        self.layers.clear_application_metadata().await?;

        for feature in &self.features {
            if !feature.is_needed() {
                debug!("Skipping feature -- {}", feature.name());
                continue;
            }

            info!("Using feature -- {}", feature.name());
            feature
                .enable_feature(&self.layers, &self.layer)
                .await
                .map_err(|e| PhpWebError::feature(feature.name(), e))?;
        }

        if self.layers.read_application_metadata().await?.is_none() {
            match &self.unsupported_web_server {
                Some(server) => warn!(
                    "Unsupported web server '{}', expected php-server, httpd or nginx; no launch command was configured",
                    server
                ),
                None => warn!("No launch command was configured; the app has nothing to start"),
            }
        }

        self.layer
            .write_metadata(&LayerMetadata::launch(self.fingerprint.clone()))
            .await
    }
}
