//! Solr installer CLI entrypoint.
//!
//! This binary lists the Solr releases available at a mirror or the archive,
//! and downloads and unpacks a chosen release.

use camino::Utf8Path;
use clap::Parser;
use solr_installer::cli::{Cli, Command, InstallArgs};
use solr_installer::config::{InstallerConfig, load, process_env};
use solr_installer::dirs::SystemBaseDirs;
use solr_installer::download::HttpDownloader;
use solr_installer::error::Result;
use solr_installer::extraction::ZipExtractor;
use solr_installer::list::run_list;
use solr_installer::listing::{HttpFetcher, PageFetcher};
use solr_installer::output::{success_message, write_stderr_line};
use solr_installer::pipeline::{InstallContext, install};
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    init_logging(log_level_filter(cli.verbosity, cli.quiet), &mut stderr);
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = load(
        cli.config.as_deref().map(Utf8Path::as_std_path),
        &SystemBaseDirs,
        process_env,
        &cli.overrides(),
    )?;
    let fetcher = HttpFetcher::new(config.network.timeouts);

    match &cli.command {
        Command::List(args) => run_list(args, &config, &fetcher, &mut std::io::stdout().lock()),
        Command::Install(args) => run_install(cli.quiet, args, &config, &fetcher, stderr),
    }
}

/// Downloads and extracts the requested version, then reports the result.
fn run_install(
    quiet: bool,
    args: &InstallArgs,
    config: &InstallerConfig,
    fetcher: &dyn PageFetcher,
    stderr: &mut dyn Write,
) -> Result<()> {
    let downloader = HttpDownloader::new(config.network.timeouts.connect);
    let context = InstallContext {
        config,
        fetcher,
        downloader: &downloader,
        extractor: &ZipExtractor,
        quiet,
    };

    let report = install(&context, &args.version, stderr)?;

    if !quiet {
        write_stderr_line(
            stderr,
            success_message(&config.product, &report, &config.destination),
        );
    }
    Ok(())
}

/// Map `-v`/`-q` to the default log level. `RUST_LOG` refines it.
fn log_level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install a stderr subscriber. Library `log` records are forwarded through
/// the subscriber's log bridge.
fn init_logging(level: LevelFilter, stderr: &mut dyn Write) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(level >= LevelFilter::DEBUG)
        .without_time()
        .try_init();
    if let Err(err) = installed {
        write_stderr_line(stderr, format!("logging unavailable: {err}"));
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
