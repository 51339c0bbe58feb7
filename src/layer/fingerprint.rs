//! Layer content fingerprint
//!
//! The fingerprint is a SHA256 over everything that decides what the layer
//! contains: the buildpack version, the user's configuration and whether a
//! custom FPM config is present. Identical inputs give identical hashes, so
//! an unchanged app can keep its layer between builds.

use crate::config::BuildpackYaml;
use crate::error::PhpWebResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Logical name recorded with every fingerprint
pub const LAYER_LOGICAL_NAME: &str = "PHP Web";

/// Caching identity of a contributed layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFingerprint {
    pub name: String,
    pub hash: String,
}

impl LayerFingerprint {
    /// Compute the fingerprint for one build
    pub fn compute(
        buildpack_version: &str,
        config: &BuildpackYaml,
        has_custom_fpm_config: bool,
    ) -> PhpWebResult<Self> {
        let serialized = serde_yaml::to_string(config)?;

        let mut hasher = Sha256::new();
        hasher.update(buildpack_version.as_bytes());
        // Separators keep adjacent fields from running together
        hasher.update([0u8]);
        hasher.update(serialized.as_bytes());
        hasher.update([0u8]);
        hasher.update([u8::from(has_custom_fpm_config)]);

        Ok(Self {
            name: LAYER_LOGICAL_NAME.to_string(),
            hash: hex::encode(hasher.finalize()),
        })
    }
}
