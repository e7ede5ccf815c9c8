//! Heuristic pattern scan over arbitrary text.
//!
//! Pattern families are data: each family is a regex whose first capture group
//! is either a quoted specifier or, for install commands, the rest of the line
//! after the command.

use crate::parser::is_likely_package;
use crate::types::Result;
use regex::Regex;
use std::collections::BTreeSet;

/// How the first capture group of a family is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// The capture is a single candidate token.
    Token,
    /// The capture is the argument list of a package manager install command.
    InstallArgs,
}

/// One named pattern family.
#[derive(Debug, Clone)]
pub struct PatternFamily {
    pub name: &'static str,
    regex: Regex,
    kind: CaptureKind,
}

impl PatternFamily {
    /// Compile a family. The pattern must have one capture group.
    pub fn new(name: &'static str, pattern: &str, kind: CaptureKind) -> Result<Self> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
            kind,
        })
    }

    fn builtin(name: &'static str, pattern: &str, kind: CaptureKind) -> Self {
        Self::new(name, pattern, kind).expect("built-in pattern is valid")
    }

    fn scan_into(&self, content: &str, out: &mut BTreeSet<String>) {
        for cap in self.regex.captures_iter(content) {
            let Some(m) = cap.get(1) else { continue };
            match self.kind {
                CaptureKind::Token => {
                    if is_likely_package(m.as_str()) {
                        out.insert(m.as_str().to_string());
                    }
                }
                CaptureKind::InstallArgs => {
                    out.extend(install_arguments(m.as_str()));
                }
            }
        }
    }
}

/// Ordered set of pattern families.
#[derive(Debug, Clone)]
pub struct PatternSet {
    families: Vec<PatternFamily>,
}

impl PatternSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            families: Vec::new(),
        }
    }

    /// The npm-style families: import forms, install commands, inline code.
    pub fn npm() -> Self {
        let families = vec![
            PatternFamily::builtin(
                "require",
                r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
                CaptureKind::Token,
            ),
            PatternFamily::builtin("from", r#"from\s+['"]([^'"]+)['"]"#, CaptureKind::Token),
            PatternFamily::builtin(
                "dynamic-import",
                r#"import\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
                CaptureKind::Token,
            ),
            PatternFamily::builtin(
                "bare-import",
                r#"import\s+['"]([^'"]+)['"]"#,
                CaptureKind::Token,
            ),
            PatternFamily::builtin(
                "npm-install",
                r"\bnpm\s+(?:install|i)\b([^\r\n]*)",
                CaptureKind::InstallArgs,
            ),
            PatternFamily::builtin(
                "yarn-add",
                r"\byarn\s+add\b([^\r\n]*)",
                CaptureKind::InstallArgs,
            ),
            PatternFamily::builtin(
                "pnpm-add",
                r"\bpnpm\s+add\b([^\r\n]*)",
                CaptureKind::InstallArgs,
            ),
            PatternFamily::builtin(
                "inline-code",
                r"`(@?[A-Za-z0-9_\-./]+)`",
                CaptureKind::Token,
            ),
        ];

        Self { families }
    }

    /// Append a family; it runs after the existing ones.
    pub fn push(&mut self, family: PatternFamily) {
        self.families.push(family);
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Run every family over the content.
    pub fn scan(&self, content: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for family in &self.families {
            family.scan_into(content, &mut out);
        }
        out
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::npm()
    }
}

/// Package tokens in the argument list of an install command.
///
/// Option flags are skipped, scanning ends at a shell control operator or
/// where the enclosing inline-code span closes.
fn install_arguments(args: &str) -> Vec<String> {
    let mut packages = Vec::new();

    for raw in args.split_whitespace() {
        if matches!(raw, "&&" | "||" | ";" | "|") {
            break;
        }

        let quoted = raw.len() > 1 && raw.starts_with('`') && raw.ends_with('`');
        if raw.starts_with('`') && !quoted {
            break;
        }

        let token = raw.trim_matches(|c| matches!(c, '\'' | '"' | '`'));
        let ends_command = token.ends_with(';') || (raw.ends_with('`') && !quoted);
        let token = token.trim_end_matches(';');

        if !token.starts_with('-') {
            let name = strip_version(token);
            if is_likely_package(name) {
                packages.push(name.to_string());
            }
        }

        if ends_command {
            break;
        }
    }

    packages
}

/// `lodash@4.17.21` -> `lodash`, `@scope/pkg@next` -> `@scope/pkg`.
fn strip_version(token: &str) -> &str {
    let search_from = usize::from(token.starts_with('@'));
    match token[search_from..].find('@') {
        Some(pos) => &token[..search_from + pos],
        None => token,
    }
}
