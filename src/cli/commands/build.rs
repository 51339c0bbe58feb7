//! Build command - contribute the php-web layer

use crate::cli::args::BuildArgs;
use crate::config::ConfigManager;
use crate::contributor::Contributor;
use crate::detect::app_shape;
use crate::error::{PhpWebError, PhpWebResult};
use crate::features::{FeatureConfig, PROCMGR_BINARY};
use crate::layer::Layers;
use crate::services::Services;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Execute the build command
pub async fn execute(args: BuildArgs) -> PhpWebResult<ExitCode> {
    let config_manager = ConfigManager::new(&args.app);
    let config = config_manager.load().await?;
    config_manager.warn_deprecated(&args.buildpack_version).await?;

    let shape = app_shape(&args.app, &config)?;

    let services = match &args.bindings {
        Some(path) => Services::from_file(path).await?,
        None => Services::default(),
    };

    let procmgr_binary = match args.procmgr_bin {
        Some(path) => path,
        None => default_procmgr_binary()?,
    };

    let feature_config = FeatureConfig {
        config,
        app_root: args.app.clone(),
        shape,
        services,
        php_home: args.php_home,
        php_api: args.php_api,
        procmgr_binary,
    };

    let contributor = Contributor::new(
        Layers::new(&args.layers),
        &feature_config,
        &args.buildpack_version,
    )?;
    info!("Layer fingerprint {}", contributor.fingerprint().hash);
    contributor.contribute().await?;

    println!(
        "{} Contributed {}",
        style("✓").green(),
        style(contributor.layer().root().display()).bold()
    );
    Ok(ExitCode::SUCCESS)
}

/// `procmgr` shipped next to the running executable
fn default_procmgr_binary() -> PhpWebResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| PhpWebError::io("locating the php-web executable", e))?;
    let dir = exe
        .parent()
        .ok_or_else(|| PhpWebError::Internal(format!("{} has no parent", exe.display())))?;
    Ok(dir.join(PROCMGR_BINARY))
}
