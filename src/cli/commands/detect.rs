//! Detect command - decide whether this is a PHP app

use crate::cli::args::DetectArgs;
use crate::config::ConfigManager;
use crate::detect::{detect, DetectResult};
use crate::error::PhpWebResult;
use std::process::ExitCode;
use tracing::info;

/// Exit code telling the platform this buildpack does not apply
pub const DETECT_FAIL: u8 = 100;

/// Execute the detect command
pub async fn execute(args: DetectArgs) -> PhpWebResult<ExitCode> {
    let config = ConfigManager::new(&args.app).load().await?;

    let version = args
        .php_version
        .or_else(|| Some(config.php.version.clone()).filter(|v| !v.is_empty()));

    match detect(&args.app, &config, version.as_deref())? {
        DetectResult::Pass(plan) => {
            print!("{}", toml::to_string_pretty(&plan)?);
            Ok(ExitCode::SUCCESS)
        }
        DetectResult::Fail => {
            info!("No PHP files found in {}", args.app.display());
            Ok(ExitCode::from(DETECT_FAIL))
        }
    }
}
