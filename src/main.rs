//! depconfuse - Dependency confusion scanner.
//!
//! CLI entry point.

use clap::Parser;
use depconfuse::discovery::{collect_repo_files, read_file_list, read_sources, Manifest, RepoCheckout};
use depconfuse::notify::ConsoleOutput;
use depconfuse::{
    Commands, Config, FindingCategory, ScanFilesConfig, ScanRepoConfig, ScanReport, Scanner, Source,
};
use std::fs;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("depconfuse=debug,info")
    } else {
        EnvFilter::new("depconfuse=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let console = ConsoleOutput::new(config.verbose, config.json);

    let report = match config.command.clone() {
        Commands::ScanRepo(repo_config) => run_scan_repo(repo_config, &config, &console).await,
        Commands::ScanFiles(files_config) => run_scan_files(files_config, &config, &console).await,
    };

    let report = match report {
        Ok(report) => report,
        Err(code) => return code,
    };

    if let Err(code) = write_output(&report, &config, &console) {
        return code;
    }

    if config.fail_on_risk && report.count(FindingCategory::UndeclaredAndPublic) > 0 {
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run_scan_repo(
    repo_config: ScanRepoConfig,
    config: &Config,
    console: &ConsoleOutput,
) -> Result<ScanReport, ExitCode> {
    let target = repo_config.target().map_err(|e| {
        error!("{}", e);
        ExitCode::from(2)
    })?;

    let spinner = console.create_spinner("Preparing scan");
    let checkout = match RepoCheckout::acquire(&target, repo_config.token.as_deref()).await {
        Ok(checkout) => checkout,
        Err(e) => {
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            error!("Failed to acquire repository: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    if let Some(ref pb) = spinner {
        pb.set_message("Searching repository files for package references");
    }
    let manifest = Manifest::load(checkout.root()).await;
    let paths = collect_repo_files(checkout.root());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    console.print_scan_start(&target, paths.len());
    console.print_manifest_hints(&manifest);

    let mut sources = vec![Source::declared_manifest(&manifest.declared)];
    sources.extend(read_sources(&paths, Some(checkout.root())).await);

    scan(sources, &manifest, config, console).await
}

async fn run_scan_files(
    files_config: ScanFilesConfig,
    config: &Config,
    console: &ConsoleOutput,
) -> Result<ScanReport, ExitCode> {
    let paths = match read_file_list(&files_config.list).await {
        Ok(paths) => paths,
        Err(e) => {
            error!("Failed to read file list {:?}: {}", files_config.list, e);
            return Err(ExitCode::FAILURE);
        }
    };

    let manifest = Manifest::load(&files_config.project).await;

    console.print_scan_start(&files_config.list.to_string_lossy(), paths.len());
    console.print_manifest_hints(&manifest);

    let sources = read_sources(&paths, None).await;
    scan(sources, &manifest, config, console).await
}

async fn scan(
    sources: Vec<Source>,
    manifest: &Manifest,
    config: &Config,
    console: &ConsoleOutput,
) -> Result<ScanReport, ExitCode> {
    let scanner = match Scanner::new(config.engine_config()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create scanner: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    console.print_progress(&format!(
        "Checking references from {} sources against {}",
        sources.len(),
        config.registry
    ));

    let report = scanner.scan(sources, &manifest.declared).await;
    console.print_summary(&report);
    Ok(report)
}

fn write_output(report: &ScanReport, config: &Config, console: &ConsoleOutput) -> Result<(), ExitCode> {
    if !config.json && config.output.is_none() {
        return Ok(());
    }

    let json = match serde_json::to_string_pretty(report) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize results: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    match config.output {
        Some(ref output_path) => {
            if let Err(e) = fs::write(output_path, &json) {
                error!("Failed to write output file: {}", e);
                return Err(ExitCode::FAILURE);
            }
            if !config.json {
                info!("Results written to: {:?}", output_path);
            }
            console.print_progress("JSON report written");
        }
        None => println!("{}", json),
    }

    Ok(())
}
