//! Semantic Validator finalization pass. Everything local to one
//! production (assignment-target legality, getter/setter arity, `super`
//! placement, label resolution, …) is already checked inline by
//! `syntax::*` as it parses — see each module's own diagnostics. This pass
//! runs once, after the whole program has parsed, for constraints that need
//! to see the file as a whole:
//!
//! - Duplicate export names, including a name exported once as a named
//!   export and again as the default export.
//! - Escalating warnings raised before the file's module-ness was known
//!   (legacy octal literals, duplicate function declarations) into errors,
//!   now that we can see whether `import`/`export` ever appeared.
//! - Unused-import warnings.
//!
//! Diagnostics pushed here are appended strictly after every inline-pass
//! diagnostic, enforced by `DiagnosticSink::begin_finalization_pass`.

use crate::diagnostics::{Diagnostic, DiagnosticSink, Note};
use crate::scope_tree::ScopeTree;
use crate::symbol_table::SymbolTable;
use jsc_rowan::{Name, TextRange};
use jsc_syntax::ast::{AstArena, ExportSpecifier, ImportSpecifier, Stmt, StmtId};
use jsc_syntax::scope::{ScopeId, StrictReason};
use jsc_syntax::symbol::SymbolKind;
use rustc_hash::FxHashMap;

pub fn run_finalization_pass(
    arena: &AstArena,
    symbols: &SymbolTable,
    scopes: &mut ScopeTree,
    body: &[StmtId],
    diagnostics: &mut DiagnosticSink,
) {
    diagnostics.begin_finalization_pass();

    escalate_module_only_warnings(scopes, diagnostics);
    check_duplicate_exports(arena, body, diagnostics);
    check_duplicate_function_declarations(arena, symbols, scopes, body, diagnostics);
    check_unused_imports(arena, symbols, body, diagnostics);
}

/// The module-top-level scope is always the first one `Parser::parse_program`
/// opens, so it is always id `0` for any given parse — there is exactly one
/// per `Parser` instance, each owning its own disjoint scope tree.
fn module_scope_id() -> ScopeId {
    ScopeId::from_raw(0)
}

/// Warnings the inline pass couldn't know yet whether to escalate, because
/// module-ness can be entailed by an `import`/`export` anywhere in the file,
/// including after the warning's own position. Strict/module mode
/// retroactively escalates earlier warnings into errors; escalation emits
/// the original token's range plus a note pointing at the directive or the
/// construct that made the file a module.
fn escalate_module_only_warnings(scopes: &ScopeTree, diagnostics: &mut DiagnosticSink) {
    let root = scopes.get(module_scope_id());
    if root.strict_reason != Some(StrictReason::Module) {
        return;
    }
    for diagnostic in diagnostics.iter_mut() {
        if diagnostic.message.starts_with("legacy octal literal") {
            diagnostic.severity = crate::diagnostics::Severity::Error;
            diagnostic.notes.push(Note {
                message: "modules are always strict mode".to_string(),
                range: None,
            });
        }
    }
}

/// Spec §4.4 finalization pass: "duplicate export names (`export {x};
/// export {x}` and `export {x as default}; export default ...`)".
fn check_duplicate_exports(arena: &AstArena, body: &[StmtId], diagnostics: &mut DiagnosticSink) {
    let mut seen: FxHashMap<Name, TextRange> = FxHashMap::default();
    let mut default_range: Option<TextRange> = None;

    for &stmt in body {
        let node = arena.stmt(stmt);
        let Stmt::Export { specifiers, .. } = &node.kind else {
            continue;
        };
        for specifier in specifiers {
            match specifier {
                ExportSpecifier::Default => {
                    if let Some(first) = default_range {
                        diagnostics.push_finalization(
                            Diagnostic::error(
                                "multiple default exports in one module",
                                node.range,
                            )
                            .with_note("the default export was already declared here", Some(first)),
                        );
                    } else {
                        default_range = Some(node.range);
                    }
                }
                ExportSpecifier::Named { exported, .. } => {
                    record_export_name(*exported, node.range, &mut seen, diagnostics);
                }
                // `export * as x` binds a concrete name in this module's
                // export list regardless of what the source module turns
                // out to contain, so it is treated exactly like any other
                // named export for duplicate-name purposes.
                ExportSpecifier::All { exported: Some(name) } => {
                    record_export_name(*name, node.range, &mut seen, diagnostics);
                }
                ExportSpecifier::All { exported: None } => {}
            }
        }
    }
}

fn record_export_name(
    name: Name,
    range: TextRange,
    seen: &mut FxHashMap<Name, TextRange>,
    diagnostics: &mut DiagnosticSink,
) {
    if let Some(&first) = seen.get(&name) {
        diagnostics.push_finalization(
            Diagnostic::error("multiple exports with the same name are not allowed", range)
                .with_note("this name was already exported here", Some(first)),
        );
    } else {
        seen.insert(name, range);
    }
}

/// Two `function foo(){}` declarations at the same scope are legal
/// redeclaration in sloppy mode (only a warning) and an error under module
/// mode, one of the subset of warnings that module mode escalates to an
/// error. `SymbolTable::kinds_may_coexist`
/// deliberately lets function/function pairs through without a
/// redeclaration diagnostic at declare-time (that's the sloppy-mode-legal
/// case) — this pass is what notices the duplication at all and chooses the
/// severity.
fn check_duplicate_function_declarations(
    arena: &AstArena,
    symbols: &SymbolTable,
    scopes: &ScopeTree,
    body: &[StmtId],
    diagnostics: &mut DiagnosticSink,
) {
    let is_module = scopes.get(module_scope_id()).strict_reason == Some(StrictReason::Module);
    let mut seen: FxHashMap<Name, TextRange> = FxHashMap::default();
    for &stmt in body {
        let node = arena.stmt(stmt);
        let Stmt::FunctionDecl { function } = &node.kind else {
            continue;
        };
        let Some(symbol) = function.name else { continue };
        let data = symbols.get(symbol);
        if let Some(&first) = seen.get(&data.name) {
            let message = "duplicate function declaration";
            let diagnostic = if is_module {
                Diagnostic::error(message, node.range)
            } else {
                Diagnostic::warning(message, node.range)
            }
            .with_note("the function was already declared here", Some(first));
            diagnostics.push_finalization(diagnostic);
        } else {
            seen.insert(data.name, node.range);
        }
    }
}

/// Spec §4.4: "unused-but-declared imports (warning only)".
fn check_unused_imports(
    arena: &AstArena,
    symbols: &SymbolTable,
    body: &[StmtId],
    diagnostics: &mut DiagnosticSink,
) {
    for &stmt in body {
        let node = arena.stmt(stmt);
        let Stmt::Import { specifiers, .. } = &node.kind else {
            continue;
        };
        for specifier in specifiers {
            let symbol_id = match specifier {
                ImportSpecifier::Default(id) | ImportSpecifier::Namespace(id) => *id,
                ImportSpecifier::Named { local, .. } => *local,
            };
            let data = symbols.get(symbol_id);
            if data.kind == SymbolKind::Import && data.use_count_estimate == 0 {
                diagnostics.push_finalization(Diagnostic::warning(
                    "imported binding is never used",
                    data.declaration_range,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    #[test]
    fn duplicate_named_export_is_an_error() {
        let result = parse("const x = 1; export { x }; export { x };");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn export_named_as_default_conflicts_with_export_default() {
        let result = parse("const x = 1; export { x as default }; export default 2;");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn distinct_export_names_are_fine() {
        let result = parse("const x = 1, y = 2; export { x }; export { y };");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn duplicate_function_declaration_is_only_a_warning_in_sloppy_mode() {
        let result = parse("function f() {} function f() {}");
        assert!(!result.diagnostics.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.message.contains("duplicate function declaration")));
    }

    #[test]
    fn duplicate_function_declaration_is_an_error_in_a_module() {
        let result = parse("export {}; function f() {} function f() {}");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn legacy_octal_is_a_warning_in_sloppy_scripts() {
        let result = parse("var x = 0123;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn legacy_octal_is_an_error_once_the_file_is_a_module() {
        let result = parse("var x = 0123; export {};");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn unused_import_is_a_warning_not_an_error() {
        let result = parse("import { unused } from \"mod\";");
        assert!(!result.diagnostics.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.message.contains("never used")));
    }
}
