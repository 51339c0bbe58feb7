use super::{Feature, FeatureConfig, FeatureKind};
use crate::error::{PhpWebError, PhpWebResult};
use crate::layer::{Layer, LaunchMetadata, Layers};
use crate::procs::ProcessTable;
use async_trait::async_trait;
use std::path::PathBuf;

/// Name of the supervisor binary inside the layer
pub const PROCMGR_BINARY: &str = "procmgr";

/// Launches every registered process under `procmgr`
pub struct ProcMgr {
    needed: bool,
    binary: PathBuf,
}

impl ProcMgr {
    pub fn new(cfg: &FeatureConfig) -> Self {
        Self {
            needed: cfg.is_fpm_web_app(),
            binary: cfg.procmgr_binary.clone(),
        }
    }
}

#[async_trait]
impl Feature for ProcMgr {
    fn name(&self) -> &'static str {
        "procmgr"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::ProcessManager
    }

    fn is_needed(&self) -> bool {
        self.needed
    }

    async fn enable_feature(&self, layers: &Layers, layer: &Layer) -> PhpWebResult<()> {
        let procs_path = layer.procs_path();
        if ProcessTable::read(&procs_path).await?.is_empty() {
            return Err(PhpWebError::NoProcesses);
        }

        layer.install_binary(&self.binary, PROCMGR_BINARY).await?;

        let command = format!("{} {}", PROCMGR_BINARY, procs_path.display());
        layers
            .write_application_metadata(&LaunchMetadata::web(command))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::Fixture;
    use crate::procs::{append_or_update, ProcessEntry};

    #[tokio::test]
    async fn empty_table_is_an_error() {
        let fixture = Fixture::new();
        let feature = ProcMgr::new(&fixture.config("nginx", true));

        let result = feature
            .enable_feature(&fixture.layers(), &fixture.layer())
            .await;
        assert!(matches!(result, Err(PhpWebError::NoProcesses)));
    }

    #[tokio::test]
    async fn installs_binary_and_launch_command() {
        let fixture = Fixture::new();
        let mut cfg = fixture.config("nginx", true);
        cfg.procmgr_binary = fixture.app.path().join("procmgr-build");
        std::fs::write(&cfg.procmgr_binary, "#!/bin/sh\n").unwrap();

        let layer = fixture.layer();
        append_or_update(
            &layer.procs_path(),
            ProcessTable::from_entries([("nginx", ProcessEntry::new("nginx", ["-p", "/app"]))]),
        )
        .await
        .unwrap();

        let layers = fixture.layers();
        ProcMgr::new(&cfg)
            .enable_feature(&layers, &layer)
            .await
            .unwrap();

        assert!(layer.root().join("bin").join("procmgr").is_file());
        let launch = layers.read_application_metadata().await.unwrap().unwrap();
        let expected = format!("procmgr {}", layer.procs_path().display());
        assert_eq!(launch.command("web"), Some(expected.as_str()));
        assert_eq!(launch.command("task"), None);
    }
}
