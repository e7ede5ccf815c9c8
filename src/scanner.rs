//! Scan engine: extraction, resolution and classification of references.

use crate::config::{EngineConfig, UnresolvedPolicy};
use crate::parser::{is_external, is_node_builtin, Extractor};
use crate::registry::{NpmRegistry, RegistryClient, RegistryResolver};
use crate::types::{
    DeclaredSet, Finding, FindingCategory, Result, ScanReport, Source, SourceContent,
};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Scanner turning sources and a declared set into ordered findings.
pub struct Scanner<C> {
    config: EngineConfig,
    client: C,
    extractor: Extractor,
}

impl Scanner<NpmRegistry> {
    /// Create a scanner querying the configured npm registry.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = NpmRegistry::new(&config)?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: RegistryClient> Scanner<C> {
    /// Create a scanner with a custom registry transport.
    pub fn with_client(config: EngineConfig, client: C) -> Self {
        Self {
            config,
            client,
            extractor: Extractor::default(),
        }
    }

    /// Replace the extractor, e.g. to register extra pattern families.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Scan sources against the declared set.
    ///
    /// Every call starts with an empty registry cache.
    pub async fn scan(&self, sources: Vec<Source>, declared: &DeclaredSet) -> ScanReport {
        let resolver = RegistryResolver::new(&self.client, &self.config);
        let sources_scanned = sources.len();
        let concurrency = self.config.concurrency.max(1);

        // Ordered buffering keeps findings in source order.
        let per_source: Vec<(usize, Vec<Finding>)> = stream::iter(sources)
            .map(|source| self.scan_source(source, declared, &resolver))
            .buffered(concurrency)
            .collect()
            .await;

        let candidates_checked: usize = per_source.iter().map(|(checked, _)| checked).sum();
        let mut findings: Vec<Finding> = per_source
            .into_iter()
            .flat_map(|(_, findings)| findings)
            .collect();

        sort_findings(&mut findings);

        info!(
            "Scanned {} sources, {} references, {} findings",
            sources_scanned,
            candidates_checked,
            findings.len()
        );

        ScanReport {
            findings,
            sources_scanned,
            candidates_checked,
        }
    }

    /// Extract and classify one source; returns the number of external
    /// specifiers checked alongside the findings.
    async fn scan_source<R: RegistryClient>(
        &self,
        source: Source,
        declared: &DeclaredSet,
        resolver: &RegistryResolver<R>,
    ) -> (usize, Vec<Finding>) {
        let specifiers: BTreeSet<String> = match source.content {
            SourceContent::Unreadable(reason) => {
                debug!("Cannot read {}: {}", source.id, reason);
                let finding = Finding {
                    source: source.id,
                    specifier: None,
                    category: FindingCategory::UnreadableSource,
                    note: Some(reason),
                };
                return (0, vec![finding]);
            }
            SourceContent::Specifiers(names) => names.into_iter().collect(),
            SourceContent::Text(ref content) => {
                let structured = source.structured.then_some(source.id.as_str());
                self.extractor.extract(content, structured)
            }
        };

        let external: Vec<String> = specifiers
            .into_iter()
            .filter(|spec| is_external(spec))
            .filter(|spec| !(self.config.skip_builtins && is_node_builtin(spec)))
            .collect();

        debug!("{}: {} external references", source.id, external.len());

        let classified: Vec<Option<Finding>> = stream::iter(external.iter())
            .map(|spec| self.classify(&source.id, spec, declared, resolver))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        (external.len(), classified.into_iter().flatten().collect())
    }

    /// Classify one external specifier found in a source.
    ///
    /// Returns `None` for a declared name that is absent from the registry.
    pub async fn classify<R: RegistryClient>(
        &self,
        source: &str,
        specifier: &str,
        declared: &DeclaredSet,
        resolver: &RegistryResolver<R>,
    ) -> Option<Finding> {
        if !is_external(specifier) {
            return None;
        }

        let existence = resolver.resolve(specifier).await;
        let is_declared = declared.contains(specifier);

        let category = if existence.conservative
            && self.config.unresolved == UnresolvedPolicy::Report
        {
            FindingCategory::RegistryUnresolved
        } else {
            match (is_declared, existence.exists) {
                (false, true) => FindingCategory::UndeclaredAndPublic,
                (false, false) => FindingCategory::UndeclaredPrivate,
                (true, true) => FindingCategory::DeclaredAndPublic,
                (true, false) => return None,
            }
        };

        let note = (category == FindingCategory::RegistryUnresolved)
            .then(|| "registry gave no definite answer".to_string());

        Some(Finding {
            source: source.to_string(),
            specifier: Some(specifier.to_string()),
            category,
            note,
        })
    }
}

/// Stable sort by category severity, then specifier.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| a.specifier.cmp(&b.specifier))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::StubRegistry;
    use crate::parser::{CaptureKind, PatternFamily, PatternSet};
    use crate::registry::Lookup;
    use std::sync::Arc;

    fn declared(names: &[&str]) -> DeclaredSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn stub() -> Arc<StubRegistry> {
        Arc::new(StubRegistry::new(&[
            ("left-pad", Lookup::Status(200)),
            ("express", Lookup::Status(200)),
            ("lodash", Lookup::Status(200)),
            ("@myorg/internal-lib", Lookup::Status(404)),
            ("@myorg/express-fork", Lookup::Status(404)),
            ("flaky", Lookup::Status(502)),
        ]))
    }

    fn scanner(client: Arc<StubRegistry>) -> Scanner<Arc<StubRegistry>> {
        Scanner::with_client(EngineConfig::default(), client)
    }

    fn categories(report: &ScanReport) -> Vec<(Option<&str>, FindingCategory)> {
        report
            .findings
            .iter()
            .map(|f| (f.specifier.as_deref(), f.category))
            .collect()
    }

    #[tokio::test]
    async fn test_classification_table() {
        let scanner = scanner(stub());
        let resolver = RegistryResolver::new(&scanner.client, &scanner.config);
        let declared = declared(&["express", "@myorg/express-fork"]);

        let (scanner, declared, resolver) = (&scanner, &declared, &resolver);
        let classify = move |spec: &'static str| scanner.classify("app.js", spec, declared, resolver);

        assert_eq!(
            classify("left-pad").await.map(|f| f.category),
            Some(FindingCategory::UndeclaredAndPublic)
        );
        assert_eq!(
            classify("@myorg/internal-lib").await.map(|f| f.category),
            Some(FindingCategory::UndeclaredPrivate)
        );
        assert_eq!(
            classify("express").await.map(|f| f.category),
            Some(FindingCategory::DeclaredAndPublic)
        );
        assert_eq!(classify("@myorg/express-fork").await, None);
    }

    #[tokio::test]
    async fn test_local_specifiers_are_never_resolved() {
        let registry = stub();
        let scanner = scanner(registry.clone());

        let sources = vec![Source::text(
            "index.js",
            "import a from './a';\nimport b from '/abs/b';",
            true,
        )];
        let report = scanner.scan(sources, &DeclaredSet::new()).await;

        assert!(report.findings.is_empty());
        assert_eq!(report.candidates_checked, 0);
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_source_short_circuits() {
        let scanner = scanner(stub());
        let sources = vec![Source::unreadable("missing.js", "No such file or directory")];

        let report = scanner.scan(sources, &DeclaredSet::new()).await;

        assert_eq!(report.sources_scanned, 1);
        assert_eq!(
            report.findings,
            vec![Finding {
                source: "missing.js".to_string(),
                specifier: None,
                category: FindingCategory::UnreadableSource,
                note: Some("No such file or directory".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_repeated_references_query_once() {
        let registry = stub();
        let scanner = scanner(registry.clone());
        let sources = (0..20)
            .map(|i| Source::text(format!("docs/{}.md", i), "npm i left-pad", false))
            .collect();

        let report = scanner.scan(sources, &DeclaredSet::new()).await;

        assert_eq!(report.findings.len(), 20);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_findings_sorted_by_severity_then_name() {
        let scanner = scanner(stub());
        let sources = vec![
            Source::text("README.md", "npm install express @myorg/internal-lib", false),
            Source::text("missing.sh", "", false),
            Source::unreadable("gone.yml", "permission denied"),
            Source::text("src/app.js", "const l = require('lodash');\nimport 'left-pad';", true),
        ];

        let report = scanner.scan(sources, &declared(&["express"])).await;

        assert_eq!(
            categories(&report),
            vec![
                (Some("left-pad"), FindingCategory::UndeclaredAndPublic),
                (Some("lodash"), FindingCategory::UndeclaredAndPublic),
                (Some("@myorg/internal-lib"), FindingCategory::UndeclaredPrivate),
                (None, FindingCategory::UnreadableSource),
                (Some("express"), FindingCategory::DeclaredAndPublic),
            ]
        );
    }

    #[tokio::test]
    async fn test_same_specifier_keeps_source_order() {
        let scanner = scanner(stub());
        let sources = vec![
            Source::text("b.md", "`left-pad`", false),
            Source::text("a.md", "`left-pad`", false),
        ];

        let report = scanner.scan(sources, &DeclaredSet::new()).await;
        let order: Vec<&str> = report.findings.iter().map(|f| f.source.as_str()).collect();

        assert_eq!(order, vec!["b.md", "a.md"]);
    }

    #[tokio::test]
    async fn test_declared_manifest_source() {
        let scanner = scanner(stub());
        let declared = declared(&["express", "@myorg/express-fork"]);

        let report = scanner
            .scan(vec![Source::declared_manifest(&declared)], &declared)
            .await;

        assert_eq!(
            categories(&report),
            vec![(Some("express"), FindingCategory::DeclaredAndPublic)]
        );
        assert_eq!(report.findings[0].source, "declared-manifest");
    }

    #[tokio::test]
    async fn test_unresolved_policy() {
        let sources = || vec![Source::text("ci.yml", "run: npm i flaky", false)];

        let default_report = scanner(stub()).scan(sources(), &DeclaredSet::new()).await;
        assert_eq!(
            categories(&default_report),
            vec![(Some("flaky"), FindingCategory::UndeclaredAndPublic)]
        );

        let reporting = Scanner::with_client(
            EngineConfig {
                unresolved: UnresolvedPolicy::Report,
                ..EngineConfig::default()
            },
            stub(),
        );
        let report = reporting.scan(sources(), &DeclaredSet::new()).await;
        assert_eq!(
            categories(&report),
            vec![(Some("flaky"), FindingCategory::RegistryUnresolved)]
        );
    }

    #[tokio::test]
    async fn test_skip_builtins() {
        let text = "const fs = require('fs');\nconst p = require('node:path');\nrequire('left-pad');";

        let report = scanner(stub())
            .scan(vec![Source::text("a.js", text, true)], &DeclaredSet::new())
            .await;
        assert_eq!(report.candidates_checked, 3);

        let skipping = Scanner::with_client(
            EngineConfig {
                skip_builtins: true,
                ..EngineConfig::default()
            },
            stub(),
        );
        let report = skipping
            .scan(vec![Source::text("a.js", text, true)], &DeclaredSet::new())
            .await;
        assert_eq!(
            categories(&report),
            vec![(Some("left-pad"), FindingCategory::UndeclaredAndPublic)]
        );
    }

    #[tokio::test]
    async fn test_custom_pattern_family() {
        let mut patterns = PatternSet::npm();
        patterns.push(
            PatternFamily::new("bun-add", r"\bbun\s+add\b([^\r\n]*)", CaptureKind::InstallArgs)
                .unwrap(),
        );
        let source = || {
            vec![Source::text(
                "setup.sh",
                "bun add left-pad @myorg/internal-lib",
                false,
            )]
        };

        let report = scanner(stub()).scan(source(), &DeclaredSet::new()).await;
        assert!(report.findings.is_empty());

        let report = scanner(stub())
            .with_extractor(Extractor::new(patterns))
            .scan(source(), &DeclaredSet::new())
            .await;
        assert_eq!(
            categories(&report),
            vec![
                (Some("left-pad"), FindingCategory::UndeclaredAndPublic),
                (Some("@myorg/internal-lib"), FindingCategory::UndeclaredPrivate),
            ]
        );
    }

    #[tokio::test]
    async fn test_pipeline_is_idempotent() {
        let sources = || {
            vec![
                Source::text("README.md", "npm install left-pad --save express", false),
                Source::text("broken.js", "require(\"foo-bar\"); function (", true),
                Source::unreadable("gone.md", "permission denied"),
            ]
        };
        let declared = declared(&["express"]);

        let first = scanner(stub()).scan(sources(), &declared).await;
        let second = scanner(stub()).scan(sources(), &declared).await;

        let first_json = serde_json::to_string(&first.findings).unwrap();
        let second_json = serde_json::to_string(&second.findings).unwrap();
        assert_eq!(first_json, second_json);
        assert!(first
            .findings
            .iter()
            .any(|f| f.specifier.as_deref() == Some("foo-bar")
                && f.category == FindingCategory::UndeclaredPrivate));
    }
}
