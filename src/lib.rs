//! depconfuse - Dependency confusion scanner.
//!
//! This library detects references to package names that an attacker could
//! register on the public npm registry:
//! - Extracting specifiers from JS/TS syntax trees and from arbitrary text
//!   (docs, CI workflows, Dockerfiles, shell scripts)
//! - Checking each external specifier against the declared dependencies
//! - Resolving existence on the registry with memoization and bounded concurrency
//!
//! # Example
//!
//! ```no_run
//! use depconfuse::{DeclaredSet, EngineConfig, Scanner, Source};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new(EngineConfig::default()).unwrap();
//!     let sources = vec![Source::text("README.md", "npm install left-pad", false)];
//!     let report = scanner.scan(sources, &DeclaredSet::new()).await;
//!     println!("{} findings", report.findings.len());
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod types;

pub use config::{Commands, Config, EngineConfig, ScanFilesConfig, ScanRepoConfig, UnresolvedPolicy};
pub use scanner::Scanner;
pub use types::{
    DeclaredSet, DepconfuseError, ExistenceResult, Finding, FindingCategory, Provenance, Result,
    ScanReport, Source, SourceContent,
};
