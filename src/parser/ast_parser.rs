//! AST-based JavaScript/TypeScript extraction using oxc_parser.

use crate::types::{DepconfuseError, Result};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::visit::walk;
use oxc_ast::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::trace;

/// Structured extractor for import/require/dynamic-import specifiers.
#[derive(Debug, Clone, Default)]
pub struct AstParser;

impl AstParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse content and collect every literal module specifier.
    ///
    /// Any syntax error fails the whole parse; callers fall back to the
    /// text scan.
    pub fn parse(&self, content: &str, source_id: &str) -> Result<BTreeSet<String>> {
        let allocator = Allocator::default();
        let source_type = source_type_for(source_id);

        let parser_result = Parser::new(&allocator, content, source_type).parse();

        if !parser_result.errors.is_empty() {
            return Err(DepconfuseError::AstParseError(format!(
                "{} syntax errors in {}",
                parser_result.errors.len(),
                source_id
            )));
        }

        let mut visitor = SpecifierVisitor::default();
        visitor.visit_program(&parser_result.program);

        trace!(
            "AST yielded {} specifiers: {}",
            visitor.specifiers.len(),
            source_id
        );

        Ok(visitor.specifiers)
    }
}

/// Pick the dialect from the file extension, defaulting to JSX. Always
/// parsed as a module so `import` is accepted in `.js` files.
fn source_type_for(source_id: &str) -> SourceType {
    SourceType::from_path(Path::new(source_id))
        .unwrap_or_else(|_| SourceType::default().with_jsx(true))
        .with_module(true)
}

#[derive(Default)]
struct SpecifierVisitor {
    specifiers: BTreeSet<String>,
}

impl SpecifierVisitor {
    fn add(&mut self, value: &str) {
        if !value.is_empty() {
            self.specifiers.insert(value.to_string());
        }
    }
}

impl<'a> Visit<'a> for SpecifierVisitor {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        self.add(decl.source.value.as_str());
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.add(decl.source.value.as_str());
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(ref source) = decl.source {
            self.add(source.value.as_str());
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        // require('x') with exactly one literal argument
        if let Expression::Identifier(id) = &expr.callee {
            if id.name == "require" && expr.arguments.len() == 1 {
                if let Some(Argument::StringLiteral(lit)) = expr.arguments.first() {
                    self.add(lit.value.as_str());
                }
            }
        }

        walk::walk_call_expression(self, expr);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &expr.source {
            self.add(lit.value.as_str());
        }
        walk::walk_import_expression(self, expr);
    }
}
