//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// php-web - configure and launch PHP web apps
///
/// Detects whether an app is a PHP web app or a script, then writes the
/// runtime config, web server config and launch processes for it.
#[derive(Parser, Debug)]
#[command(name = "php-web")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether this app is a PHP app and print its build plan
    Detect(DetectArgs),

    /// Contribute the php-web layer and launch processes
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application root
    #[arg(short, long, default_value = ".", env = "CNB_APP_DIR")]
    pub app: PathBuf,

    /// PHP version constraint to request
    #[arg(long, env = "BP_PHP_VERSION")]
    pub php_version: Option<String>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application root
    #[arg(short, long, default_value = ".", env = "CNB_APP_DIR")]
    pub app: PathBuf,

    /// Layers root to contribute into
    #[arg(short, long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,

    /// Version recorded in the layer fingerprint
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub buildpack_version: String,

    /// JSON file of bound services
    #[arg(long, env = "PHP_WEB_BINDINGS")]
    pub bindings: Option<PathBuf>,

    /// procmgr executable to install (defaults to the one next to php-web)
    #[arg(long)]
    pub procmgr_bin: Option<PathBuf>,

    /// PHP install prefix
    #[arg(long, default_value = "", env = "PHP_HOME")]
    pub php_home: String,

    /// PHP extension API version
    #[arg(long, default_value = "", env = "PHP_API")]
    pub php_api: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_args() {
        let cli = Cli::parse_from([
            "php-web",
            "-vv",
            "build",
            "--app",
            "/workspace",
            "--layers",
            "/layers",
            "--procmgr-bin",
            "/bin/procmgr",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.app, PathBuf::from("/workspace"));
        assert_eq!(args.layers, PathBuf::from("/layers"));
        assert_eq!(args.procmgr_bin, Some(PathBuf::from("/bin/procmgr")));
        assert_eq!(args.buildpack_version, env!("CARGO_PKG_VERSION"));
    }
}
