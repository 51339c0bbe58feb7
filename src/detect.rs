//! Application shape detection
//!
//! Decides whether an app is a PHP web app (PHP files directly in the web
//! directory) or a PHP script, and produces the build plan entries the
//! surrounding build system needs.

use crate::config::schema::{BuildpackYaml, PHP_WEB_SERVER};
use crate::error::PhpWebResult;
use glob::Pattern;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Build plan dependency provided and required by this buildpack
pub const PHP_WEB_DEPENDENCY: &str = "php-web";

/// Build plan dependency for the PHP runtime
pub const PHP_DEPENDENCY: &str = "php";

/// Facts about the application consumed by features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppShape {
    /// PHP files were found directly in the web directory
    pub is_web_app: bool,
}

/// Web directory to scan, falling back to `htdocs`
pub fn pick_web_dir(config: &BuildpackYaml) -> &str {
    if config.php.webdirectory.is_empty() {
        "htdocs"
    } else {
        &config.php.webdirectory
    }
}

/// True if `<app_root>/<web_dir>/*.php` matches anything
pub fn search_for_web_app(app_root: &Path, web_dir: &str) -> PhpWebResult<bool> {
    let dir = app_root.join(web_dir);
    any_match(&format!(
        "{}/*.php",
        Pattern::escape(&dir.to_string_lossy())
    ))
}

/// True if any `.php` file exists anywhere under `app_root`
pub fn search_for_any_php_files(app_root: &Path) -> PhpWebResult<bool> {
    any_match(&format!(
        "{}/**/*.php",
        Pattern::escape(&app_root.to_string_lossy())
    ))
}

fn any_match(pattern: &str) -> PhpWebResult<bool> {
    // Unreadable entries are skipped rather than failing detection
    let found = glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .any(|path| path.is_file());
    debug!("{} -> {}", pattern, found);
    Ok(found)
}

/// Inspect the app and return its shape
pub fn app_shape(app_root: &Path, config: &BuildpackYaml) -> PhpWebResult<AppShape> {
    let is_web_app = search_for_web_app(app_root, pick_web_dir(config))?;
    Ok(AppShape { is_web_app })
}

/// One required dependency in the build plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub launch: bool,
    pub build: bool,
}

impl Requirement {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            launch: false,
            build: false,
        }
    }
}

/// Dependencies this app provides and requires
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub provides: Vec<String>,
    pub requires: Vec<Requirement>,
}

/// Outcome of detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectResult {
    /// This buildpack applies
    Pass(BuildPlan),
    /// No PHP found
    Fail,
}

/// Run detection for `app_root`
pub fn detect(
    app_root: &Path,
    config: &BuildpackYaml,
    php_version: Option<&str>,
) -> PhpWebResult<DetectResult> {
    let shape = app_shape(app_root, config)?;
    let any_php = search_for_any_php_files(app_root)?;

    if !(shape.is_web_app || any_php) {
        return Ok(DetectResult::Fail);
    }

    let mut plan = BuildPlan {
        provides: vec![PHP_WEB_DEPENDENCY.to_string()],
        requires: vec![
            Requirement {
                version: php_version.map(str::to_string),
                launch: true,
                build: true,
                ..Requirement::named(PHP_DEPENDENCY)
            },
            Requirement::named(PHP_WEB_DEPENDENCY),
        ],
    };

    if shape.is_web_app {
        let web_server = pick_web_server(config);
        plan.requires.push(Requirement {
            launch: true,
            ..Requirement::named(&web_server)
        });

        // The built-in server ships with PHP itself
        if web_server == PHP_WEB_SERVER {
            plan.provides.push(PHP_WEB_SERVER.to_string());
        }
    }

    Ok(DetectResult::Pass(plan))
}

fn pick_web_server(config: &BuildpackYaml) -> String {
    if config.php.webserver.is_empty() {
        PHP_WEB_SERVER.to_string()
    } else {
        config.php.web_server()
    }
}
