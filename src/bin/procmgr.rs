//! procmgr - run every process in a process table, exit when one does
//!
//! Exit codes: 1 for bad usage or a process that could not be started,
//! 2 when the process table can't be loaded, otherwise the exit code of
//! the first process to terminate (128+N if it was killed by signal N).

use console::style;
use php_web::error::PhpWebError;
use php_web::supervisor::ProcessSupervisor;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:\n    procmgr <path-to-procs.yml>";

const EXIT_USAGE: u8 = 1;
const EXIT_LOAD: u8 = 2;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [path] = args.as_slice() else {
        eprintln!();
        eprintln!("{}", USAGE);
        eprintln!();
        return ExitCode::from(EXIT_USAGE);
    };
    let path = PathBuf::from(path);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("php_web=warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report(&PhpWebError::io("starting async runtime", e));
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(supervise(path));

    // Dropping the runtime drops the remaining waiters, which kills their children
    drop(runtime);
    code
}

async fn supervise(path: PathBuf) -> ExitCode {
    let supervisor = match ProcessSupervisor::load(&path).await {
        Ok(supervisor) => supervisor,
        Err(e) => {
            eprintln!(
                "{} error loading/parsing procs file: {}",
                style("Error:").red().bold(),
                e
            );
            return ExitCode::from(EXIT_LOAD);
        }
    };

    let outcome = match supervisor.run_until_first_exit().await {
        Ok(outcome) => outcome,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    match &outcome.result {
        Ok(status) => eprintln!("process {} exited, status: {}", outcome.name, status),
        Err(e) => eprintln!("process {} failed to run: {}", outcome.name, e),
    }

    match outcome.into_result() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(exit_byte(e.exit_code())),
    }
}

fn report(e: &PhpWebError) {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    if let Some(hint) = e.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
}

/// Exit codes outside 1..=255 can't be expressed; report them as 1
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}
