//! `import`/`export` declarations. Grounded on the same "entail a context bit the
//! first time this syntax is seen" shape `stmt::try_parse_directive`/
//! `Parser::parse_program` already use for `"use strict"` — import/export
//! do the same for module-ness, just from anywhere in the top-level body
//! rather than only the directive prologue.

use crate::parser::Parser;
use crate::state::{ParserContext, StrictMode};
use crate::symbol_table::SymbolTable;
use crate::token_source::TokenSource;
use crate::T;
use jsc_rowan::{Name, TextRange};
use jsc_syntax::ast::{
    ArrayPattern, ExportSpecifier, Expr, ImportSpecifier, ObjectPattern, Pattern, Stmt, StmtId,
};
use jsc_syntax::scope::{ScopeKind, StrictReason};
use jsc_syntax::symbol::SymbolKind;
use jsc_syntax::token::TokenPayload;
use jsc_syntax::SyntaxKind;

/// The first `import`/`export` seen in a file retroactively commits the
/// whole parse to module grammar: implicit strict mode, `await`
/// reserved at the top level. Diagnostics already raised against sloppier
/// assumptions before this point are not revisited — a deliberate
/// simplification.
fn entail_module(p: &mut Parser<impl TokenSource>) {
    if p.context.contains(ParserContext::MODULE) {
        return;
    }
    p.context |= ParserContext::MODULE | ParserContext::AWAIT;
    if !p.state.strict.is_strict() {
        p.state.strict = StrictMode::strict(StrictReason::Module);
    }
    let scope = p.current_scope();
    p.scopes_mut().mark_strict(scope, StrictReason::Module);
}

fn require_module_top_level(p: &mut Parser<impl TokenSource>, what: &str, range: TextRange) {
    if p.scopes().get(p.current_scope()).kind != ScopeKind::ModuleTopLevel {
        p.error(
            format!("'{what}' declarations may only appear at the top level of a module"),
            range,
        );
    }
}

fn parse_string_literal(p: &mut Parser<impl TokenSource>) -> String {
    if p.at(SyntaxKind::STRING) {
        let value = match p.peek_current_payload() {
            TokenPayload::String { value, .. } => value.clone(),
            _ => String::new(),
        };
        p.bump_any();
        value
    } else {
        let range = p.cur_range();
        p.error("expected a module specifier string", range);
        String::new()
    }
}

/// Any token spelling usable as an `ImportSpecifier`/`ExportSpecifier` name
/// inside `{ ... }` — plain identifiers as well as keywords (`export {
/// default as x }`, `import { default as y } from "...";`).
fn parse_ident_name(p: &mut Parser<impl TokenSource>) -> (Name, TextRange) {
    let range = p.cur_range();
    let text = p.cur_text().to_string();
    p.bump_any();
    (p.intern(&text), range)
}

pub fn parse_import(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![import]);
    entail_module(p);
    require_module_top_level(p, "import", start);
    let scope = p.current_scope();

    if p.at(SyntaxKind::STRING) {
        let source = parse_string_literal(p);
        let end = p.cur_range();
        p.expect_semi();
        return p.alloc_stmt(start.cover(end), Stmt::Import { specifiers: Vec::new(), source });
    }

    let mut specifiers = Vec::new();
    let mut needs_more = false;
    if p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword() {
        let range = p.cur_range();
        let text = p.cur_text().to_string();
        p.bump_any();
        let name = p.intern(&text);
        let symbol = p.declare(scope, name, SymbolKind::Import, range, false);
        specifiers.push(ImportSpecifier::Default(symbol));
        needs_more = p.eat(T![,]);
    } else {
        needs_more = true;
    }

    if needs_more {
        if p.eat(T![*]) {
            p.expect(T![as]);
            let range = p.cur_range();
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            let symbol = p.declare(scope, name, SymbolKind::Import, range, false);
            specifiers.push(ImportSpecifier::Namespace(symbol));
        } else if p.eat(T!['{']) {
            while !p.at(T!['}']) && !p.at_eof() {
                let (imported, imported_range) = parse_ident_name(p);
                let (local, local_range) = if p.eat(T![as]) {
                    parse_ident_name(p)
                } else {
                    (imported, imported_range)
                };
                let symbol = p.declare(scope, local, SymbolKind::Import, local_range, false);
                specifiers.push(ImportSpecifier::Named { imported, local: symbol });
                if !p.at(T!['}']) {
                    p.expect(T![,]);
                }
            }
            p.expect(T!['}']);
        }
    }

    p.expect(T![from]);
    let source = parse_string_literal(p);
    let end = p.cur_range();
    p.expect_semi();
    p.alloc_stmt(start.cover(end), Stmt::Import { specifiers, source })
}

pub fn parse_export(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![export]);
    entail_module(p);
    require_module_top_level(p, "export", start);

    if p.eat(T![default]) {
        return parse_export_default(p, start);
    }
    if p.at(T![*]) {
        return parse_export_all(p, start);
    }
    if p.at(T!['{']) {
        return parse_export_named(p, start);
    }
    parse_export_declaration(p, start)
}

fn parse_export_default(p: &mut Parser<impl TokenSource>, start: TextRange) -> StmtId {
    let declaration = if p.at(T![function]) || (p.at(T![async]) && p.nth_at(1, SyntaxKind::FUNCTION_KW)) {
        let is_async = p.eat(T![async]);
        let expr = crate::syntax::expr::parse_function_expr(p, is_async);
        unwrap_as_decl(p, expr)
    } else if p.at(T![class]) {
        let expr = crate::syntax::class::parse_class_expr(p);
        unwrap_as_decl(p, expr)
    } else {
        let expr = crate::syntax::expr::parse_assignment_expr(p);
        let range = p.arena().expr(expr).range;
        let wrapped = p.alloc_stmt(range, Stmt::Expr(expr));
        p.expect_semi();
        wrapped
    };
    let end = p.arena().stmt(declaration).range;
    p.alloc_stmt(
        start.cover(end),
        Stmt::Export {
            specifiers: vec![ExportSpecifier::Default],
            source: None,
            declaration: Some(declaration),
        },
    )
}

/// `export default function(){}`/`export default class {}` parse as
/// expressions (anonymous default exports are legal, unlike a plain
/// declaration) and get unwrapped back into the matching `Stmt` variant so
/// `declaration` always holds a real statement rather than a synthetic
/// `Stmt::Expr` wrapper for these two cases.
fn unwrap_as_decl(p: &mut Parser<impl TokenSource>, expr: jsc_syntax::ast::ExprId) -> StmtId {
    let node = p.arena().expr(expr).clone();
    match node.kind {
        Expr::Function(function) => p.alloc_stmt(node.range, Stmt::FunctionDecl { function }),
        Expr::Class(class) => p.alloc_stmt(node.range, Stmt::ClassDecl { class }),
        _ => p.alloc_stmt(node.range, Stmt::Expr(expr)),
    }
}

fn parse_export_all(p: &mut Parser<impl TokenSource>, start: TextRange) -> StmtId {
    p.bump(T![*]);
    let exported = if p.eat(T![as]) {
        let (name, _) = parse_ident_name(p);
        Some(name)
    } else {
        None
    };
    p.expect(T![from]);
    let source = parse_string_literal(p);
    let end = p.cur_range();
    p.expect_semi();
    p.alloc_stmt(
        start.cover(end),
        Stmt::Export {
            specifiers: vec![ExportSpecifier::All { exported }],
            source: Some(source),
            declaration: None,
        },
    )
}

fn parse_export_named(p: &mut Parser<impl TokenSource>, start: TextRange) -> StmtId {
    p.bump(T!['{']);
    let mut specifiers = Vec::new();
    let mut locals = Vec::new();
    while !p.at(T!['}']) && !p.at_eof() {
        let (local, local_range) = parse_ident_name(p);
        let exported = if p.eat(T![as]) {
            parse_ident_name(p).0
        } else {
            local
        };
        specifiers.push(ExportSpecifier::Named { local, exported });
        locals.push((local, local_range));
        if !p.at(T!['}']) {
            p.expect(T![,]);
        }
    }
    p.expect(T!['}']);
    let source = if p.eat(T![from]) {
        Some(parse_string_literal(p))
    } else {
        // Without a re-export source, each local name must already be a
        // resolvable binding in this module; with one, the names describe
        // the *source* module's exports and never touch local scope.
        for (local, range) in locals {
            p.resolve_identifier(local, range);
        }
        None
    };
    let end = p.cur_range();
    p.expect_semi();
    p.alloc_stmt(start.cover(end), Stmt::Export { specifiers, source, declaration: None })
}

fn parse_export_declaration(p: &mut Parser<impl TokenSource>, start: TextRange) -> StmtId {
    let declaration = match crate::syntax::stmt::parse_statement(p) {
        crate::parser::ParsedSyntax::Present(stmt) => stmt,
        crate::parser::ParsedSyntax::Absent => {
            p.error("expected a declaration after 'export'", start);
            p.alloc_stmt(start, Stmt::Error)
        }
    };
    let mut names = Vec::new();
    collect_exported_names(p.arena().stmt(declaration).kind.clone(), p.symbols(), &mut names);
    let specifiers = names
        .into_iter()
        .map(|local| ExportSpecifier::Named { local, exported: local })
        .collect();
    let end = p.arena().stmt(declaration).range;
    p.alloc_stmt(
        start.cover(end),
        Stmt::Export { specifiers, source: None, declaration: Some(declaration) },
    )
}

fn collect_exported_names(stmt: Stmt, symbols: &SymbolTable, out: &mut Vec<Name>) {
    match stmt {
        Stmt::VarDecl { declarations, .. } => {
            for decl in declarations {
                collect_pattern_names(&decl.pattern, symbols, out);
            }
        }
        Stmt::FunctionDecl { function } => {
            if let Some(symbol) = function.name {
                out.push(symbols.get(symbol).name);
            }
        }
        Stmt::ClassDecl { class } => {
            if let Some(symbol) = class.name {
                out.push(symbols.get(symbol).name);
            }
        }
        _ => {}
    }
}

fn collect_pattern_names(pattern: &Pattern, symbols: &SymbolTable, out: &mut Vec<Name>) {
    match pattern {
        Pattern::Ident(symbol) => out.push(symbols.get(*symbol).name),
        Pattern::Array(ArrayPattern { elements, rest }) => {
            for element in elements.iter().filter_map(|e| e.as_ref()) {
                collect_pattern_names(element, symbols, out);
            }
            if let Some(rest) = rest {
                collect_pattern_names(rest, symbols, out);
            }
        }
        Pattern::Object(ObjectPattern { props, rest }) => {
            for prop in props {
                collect_pattern_names(&prop.value, symbols, out);
            }
            if let Some(rest) = rest {
                collect_pattern_names(rest, symbols, out);
            }
        }
        Pattern::Assign(inner, _) | Pattern::Rest(inner) => collect_pattern_names(inner, symbols, out),
        Pattern::Expr(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    #[test]
    fn default_and_named_imports_declare_bindings() {
        let result = parse("import Default, { a, b as c } from \"mod\"; console.log(Default, a, c);");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn namespace_import_declares_binding() {
        let result = parse("import * as ns from \"mod\"; ns.foo();");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn export_declaration_collects_names() {
        let result = parse("export const a = 1, b = 2;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn anonymous_default_export_function_is_allowed() {
        let result = parse("export default function() {}");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn import_outside_module_top_level_is_rejected() {
        let result = parse("if (true) { import x from \"mod\"; }");
        assert!(result.diagnostics.has_errors());
    }
}
