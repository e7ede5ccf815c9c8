//! Configuration handling for the scanner.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default npm registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Dependency confusion scanner for repos and JS files.
#[derive(Parser, Debug, Clone)]
#[command(name = "depconfuse")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum number of in-flight registry queries
    #[arg(long, default_value = "10", global = true)]
    pub concurrency: usize,

    /// Registry query timeout in seconds
    #[arg(long, default_value = "5", global = true)]
    pub timeout: u64,

    /// Registry base URL
    #[arg(long, default_value = DEFAULT_REGISTRY_URL, global = true)]
    pub registry: String,

    /// Optional cap on registry requests per second
    #[arg(long, global = true)]
    pub rate_limit: Option<u32>,

    /// How to treat registry answers other than 200/404
    #[arg(long, value_enum, default_value = "assume-exists", global = true)]
    pub unresolved: UnresolvedPolicy,

    /// Skip Node.js built-in module names (fs, node:path, ...)
    #[arg(long, global = true)]
    pub skip_builtins: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Write JSON results to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Exit with a failure code when a confusion risk is found
    #[arg(long, global = true)]
    pub fail_on_risk: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clone/scan a repository
    ScanRepo(ScanRepoConfig),
    /// Scan a list of files for imports/requires and install commands
    ScanFiles(ScanFilesConfig),
}

/// Configuration for the scan-repo command.
#[derive(Parser, Debug, Clone)]
pub struct ScanRepoConfig {
    /// Git clone URL
    #[arg(long, required_unless_present = "path", conflicts_with = "path")]
    pub repo: Option<String>,

    /// Local repository path
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Token injected into HTTPS clone URLs
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ScanRepoConfig {
    /// The repository argument, URL first.
    pub fn target(&self) -> crate::types::Result<String> {
        match (&self.repo, &self.path) {
            (Some(repo), _) => Ok(repo.clone()),
            (None, Some(path)) => Ok(path.to_string_lossy().into_owned()),
            (None, None) => Err(crate::types::DepconfuseError::ConfigError(
                "provide --repo or --path".to_string(),
            )),
        }
    }
}

/// Configuration for the scan-files command.
#[derive(Parser, Debug, Clone)]
pub struct ScanFilesConfig {
    /// Path to a newline-delimited list of files
    #[arg(long)]
    pub list: PathBuf,

    /// Project root holding package.json
    #[arg(long, default_value = ".")]
    pub project: PathBuf,
}

/// Policy for registry answers that are neither 200 nor 404.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Treat as "package exists" (conservative default).
    #[default]
    AssumeExists,
    /// Report as REGISTRY_UNRESOLVED.
    Report,
}

/// Engine settings derived from the CLI.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub registry_url: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub rate_limit: Option<u32>,
    pub unresolved: UnresolvedPolicy,
    pub skip_builtins: bool,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            concurrency: 10,
            timeout_secs: 5,
            rate_limit: None,
            unresolved: UnresolvedPolicy::AssumeExists,
            skip_builtins: false,
            user_agent: concat!("depconfuse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Get engine configuration from the global options.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            registry_url: self.registry.trim_end_matches('/').to_string(),
            concurrency: self.concurrency.max(1),
            timeout_secs: self.timeout,
            rate_limit: self.rate_limit,
            unresolved: self.unresolved,
            skip_builtins: self.skip_builtins,
            ..EngineConfig::default()
        }
    }
}
