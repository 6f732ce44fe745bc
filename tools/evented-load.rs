//! Load modules through the evented loader and print the results
//!
//! Every lifecycle signal is reported on stderr; the name -> value mapping is
//! printed to stdout as JSON, with `null` for modules that failed to load.
//!
//! Usage:
//!   evented-load [--base-dir <dir>] [--config <file>] [--all] [--fail-fast] <name>...

use anyhow::Context;
use clap::Parser;
use evented_loader::module::registry::FsResolver;
use evented_loader::utils::init_logging_from_config;
use evented_loader::{EventedLoader, ListenerError, LoaderConfig, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "evented-load", about = "Load modules and report lifecycle signals")]
struct Args {
    /// Module names to load, in order
    names: Vec<String>,

    /// Directory names are resolved against (overrides config)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Loader configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also load every package discovered in the modules directory
    #[arg(long)]
    all: bool,

    /// Log filter (overrides config; RUST_LOG still wins)
    #[arg(long)]
    log_filter: Option<String>,

    /// Abort on the first module that fails to load
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(base_dir) = &args.base_dir {
        config.base_dir = Some(base_dir.display().to_string());
    }
    if let Some(filter) = &args.log_filter {
        config.logging.get_or_insert_with(LoggingConfig::default).filter = Some(filter.clone());
    }

    init_logging_from_config(config.logging.as_ref())?;
    debug!("Loader config: {:?}", config);

    let mut names = args.names.clone();
    if args.all {
        let resolver = FsResolver::from_config(&config);
        let base_dir = config.base_dir_path();
        for module in resolver.discover(base_dir.as_deref())? {
            if let Some(dir_name) = module.directory.file_name() {
                names.push(dir_name.to_string_lossy().into_owned());
            }
        }
    }

    let loader = EventedLoader::from_config(&config);
    let fail_fast = args.fail_fast;
    loader
        .on_before(|name| {
            eprintln!("before   {}", name);
            Ok(())
        })
        .on_success(|name, _| {
            eprintln!("success  {}", name);
            Ok(())
        })
        .on_exists(|name, location| {
            eprintln!("exists   {} ({})", name, location);
            Ok(())
        })
        .on_failure(move |name, error| {
            eprintln!("failure  {}: {}", name, error);
            if fail_fast {
                anyhow::bail!("stopping after first failure");
            }
            Ok(())
        });

    match loader.load_all(&names) {
        Ok(results) => {
            let output = serde_json::to_string_pretty(&results)
                .context("Failed to serialize results")?;
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(ListenerError { signal, name, source }) => {
            eprintln!("aborted: {} listener for '{}' failed: {}", signal, name, source);
            Ok(ExitCode::FAILURE)
        }
    }
}
