//! Package reference extraction.
//!
//! This module handles extracting candidate specifiers from:
//! - JavaScript/TypeScript AST (import/require/dynamic import)
//! - Arbitrary text (install commands, import statements, inline code)

pub mod ast_parser;
pub mod patterns;

pub use ast_parser::AstParser;
pub use patterns::{CaptureKind, PatternFamily, PatternSet};

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

/// Extractor combining the structured pass and the text scan.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    ast_parser: AstParser,
    patterns: PatternSet,
}

impl Extractor {
    /// Create an extractor with the given pattern families.
    pub fn new(patterns: PatternSet) -> Self {
        Self {
            ast_parser: AstParser::new(),
            patterns,
        }
    }

    /// Extract candidate specifiers.
    ///
    /// `structured` carries the source id when the content is JS/TS; the id's
    /// extension picks the dialect. A failed parse falls through to the text
    /// scan, which always runs.
    pub fn extract(&self, content: &str, structured: Option<&str>) -> BTreeSet<String> {
        let mut specifiers = BTreeSet::new();

        if let Some(source_id) = structured {
            match self.ast_parser.parse(content, source_id) {
                Ok(found) => specifiers.extend(found),
                Err(e) => debug!("{}, using text scan only", e),
            }
        }

        specifiers.extend(self.patterns.scan(content));
        specifiers
    }
}

/// A specifier is external when it is not a path or URL.
pub fn is_external(spec: &str) -> bool {
    !(spec.is_empty()
        || spec.starts_with('.')
        || spec.starts_with('/')
        || spec.starts_with("http://")
        || spec.starts_with("https://"))
}

/// Whether a text token is shaped like a package specifier.
pub fn is_likely_package(token: &str) -> bool {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    let shape = SHAPE.get_or_init(|| {
        Regex::new(r"^@?[A-Za-z0-9_.\-]+(/[A-Za-z0-9_.\-]+)?$").expect("shape pattern is valid")
    });

    is_external(token) && shape.is_match(token)
}

/// Check if a name is a Node.js built-in module.
pub fn is_node_builtin(name: &str) -> bool {
    const BUILTINS: &[&str] = &[
        "assert",
        "async_hooks",
        "buffer",
        "child_process",
        "cluster",
        "console",
        "constants",
        "crypto",
        "dgram",
        "dns",
        "domain",
        "events",
        "fs",
        "http",
        "http2",
        "https",
        "inspector",
        "module",
        "net",
        "os",
        "path",
        "perf_hooks",
        "process",
        "punycode",
        "querystring",
        "readline",
        "repl",
        "stream",
        "string_decoder",
        "sys",
        "timers",
        "tls",
        "trace_events",
        "tty",
        "url",
        "util",
        "v8",
        "vm",
        "wasi",
        "worker_threads",
        "zlib",
    ];

    if name.starts_with("node:") {
        return true;
    }

    // fs/promises, path/posix, ...
    let base = name.split('/').next().unwrap_or(name);
    BUILTINS.contains(&base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external() {
        assert!(!is_external(".foo"));
        assert!(!is_external("/foo"));
        assert!(!is_external("http://x"));
        assert!(!is_external("https://x"));
        assert!(!is_external(""));
        assert!(is_external("lodash"));
        assert!(is_external("@scope/name"));
    }

    #[test]
    fn test_is_likely_package() {
        assert!(is_likely_package("left-pad"));
        assert!(is_likely_package("@scope/name"));
        assert!(is_likely_package("lodash/fp"));
        assert!(is_likely_package("socket.io"));
        assert!(!is_likely_package("@scope/name/deep"));
        assert!(!is_likely_package("./local"));
        assert!(!is_likely_package("a b"));
        assert!(!is_likely_package("pkg@1.0.0"));
        assert!(!is_likely_package(""));
    }

    #[test]
    fn test_is_node_builtin() {
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("fs/promises"));
        assert!(is_node_builtin("node:test"));
        assert!(!is_node_builtin("lodash"));
        assert!(!is_node_builtin("@types/node"));
    }

    #[test]
    fn test_unparsable_source_falls_back_to_text() {
        let extractor = Extractor::default();
        let broken = r#"const x = require("foo-bar"); function ("#;

        let found = extractor.extract(broken, Some("broken.js"));
        assert!(found.contains("foo-bar"));
    }

    #[test]
    fn test_structured_and_text_passes_combine() {
        let extractor = Extractor::default();
        let js = r#"
            // install with `npm i @acme/plugin`
            import express from 'express';
            const nested = require('lodash/fp/map');
        "#;

        let found: Vec<String> = extractor
            .extract(js, Some("server.js"))
            .into_iter()
            .collect();
        assert_eq!(
            found,
            vec!["@acme/plugin", "express", "lodash/fp/map"]
        );
    }

    #[test]
    fn test_unstructured_skips_ast() {
        let extractor = Extractor::default();
        let found = extractor.extract("RUN npm install left-pad --save express", None);

        let names: Vec<&str> = found.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["express", "left-pad"]);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = Extractor::default();
        let text = "yarn add b a\n`c`\nrequire('d')";

        let first = extractor.extract(text, None);
        let second = extractor.extract(text, None);
        assert_eq!(first, second);
    }
}
