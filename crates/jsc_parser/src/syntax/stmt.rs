//! Statement grammar: declarations, control flow, modules, classes, and
//! Annex B web-compatibility quirks. `parse_statement` is the single
//! dispatch point every statement-list loop in the crate (program top
//! level, block bodies, function bodies, switch case bodies) calls into.

use crate::parser::{Parser, ParsedSyntax, SyntaxFeature};
use crate::state::ParserContext;
use crate::token_source::TokenSource;
use crate::{token_set, T};
use jsc_rowan::TextRange;
use jsc_syntax::ast::{
    CatchClause, DeclKind, ForHead, ForInit, Pattern, Stmt, StmtId, SwitchCase, VariableDeclarator,
};
use jsc_syntax::scope::{ScopeId, ScopeKind};
use jsc_syntax::symbol::SymbolKind;
use jsc_syntax::token::TokenPayload;
use jsc_syntax::SyntaxKind;

/// Dispatches on the current token to the matching statement production.
/// `Absent` only at the boundaries a statement list's own loop condition
/// already checks (`}`/EOF) — every other input produces *some* `StmtId`,
/// falling back to `Stmt::Error` for genuinely unrecognizable syntax so
/// list loops elsewhere always make progress.
pub fn parse_statement(p: &mut Parser<impl TokenSource>) -> ParsedSyntax<StmtId> {
    p.check_cancellation();
    match p.cur() {
        SyntaxKind::EOF | SyntaxKind::R_CURLY => ParsedSyntax::Absent,
        SyntaxKind::L_CURLY => ParsedSyntax::Present(parse_block_stmt(p)),
        SyntaxKind::SEMICOLON => {
            let range = p.cur_range();
            p.bump_any();
            ParsedSyntax::Present(p.alloc_stmt(range, Stmt::Empty))
        }
        SyntaxKind::VAR_KW => ParsedSyntax::Present(parse_var_decl_stmt(p, DeclKind::Var)),
        SyntaxKind::CONST_KW => ParsedSyntax::Present(parse_var_decl_stmt(p, DeclKind::Const)),
        SyntaxKind::LET_KW if starts_binding_target(p.nth(1)) => {
            ParsedSyntax::Present(parse_var_decl_stmt(p, DeclKind::Let))
        }
        SyntaxKind::IF_KW => ParsedSyntax::Present(parse_if_stmt(p)),
        SyntaxKind::FOR_KW => ParsedSyntax::Present(parse_for_stmt(p)),
        SyntaxKind::WHILE_KW => ParsedSyntax::Present(parse_while_stmt(p)),
        SyntaxKind::DO_KW => ParsedSyntax::Present(parse_do_while_stmt(p)),
        SyntaxKind::SWITCH_KW => ParsedSyntax::Present(parse_switch_stmt(p)),
        SyntaxKind::TRY_KW => ParsedSyntax::Present(parse_try_stmt(p)),
        SyntaxKind::THROW_KW => ParsedSyntax::Present(parse_throw_stmt(p)),
        SyntaxKind::RETURN_KW => ParsedSyntax::Present(parse_return_stmt(p)),
        SyntaxKind::BREAK_KW => ParsedSyntax::Present(parse_break_stmt(p)),
        SyntaxKind::CONTINUE_KW => ParsedSyntax::Present(parse_continue_stmt(p)),
        SyntaxKind::WITH_KW => ParsedSyntax::Present(parse_with_stmt(p)),
        SyntaxKind::DEBUGGER_KW => ParsedSyntax::Present(parse_debugger_stmt(p)),
        SyntaxKind::FUNCTION_KW => ParsedSyntax::Present(parse_function_decl(p, false)),
        SyntaxKind::ASYNC_KW if p.nth_at(1, SyntaxKind::FUNCTION_KW) => {
            ParsedSyntax::Present(parse_function_decl(p, true))
        }
        SyntaxKind::CLASS_KW => ParsedSyntax::Present(crate::syntax::class::parse_class_decl(p)),
        SyntaxKind::IMPORT_KW if !p.nth_at(1, T!['(']) && !p.nth_at(1, T![.]) => {
            ParsedSyntax::Present(crate::syntax::module::parse_import(p))
        }
        SyntaxKind::EXPORT_KW => ParsedSyntax::Present(crate::syntax::module::parse_export(p)),
        SyntaxKind::IDENT if p.nth_at(1, T![:]) => ParsedSyntax::Present(parse_labeled_stmt(p)),
        _ => parse_expr_stmt(p),
    }
}

fn starts_binding_target(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::IDENT | SyntaxKind::L_BRACK | SyntaxKind::L_CURLY)
        || kind.is_contextual_keyword()
}

fn decl_symbol_kind(decl_kind: DeclKind) -> SymbolKind {
    match decl_kind {
        DeclKind::Var => SymbolKind::Var,
        DeclKind::Let => SymbolKind::Let,
        DeclKind::Const => SymbolKind::Const,
    }
}

fn error_pattern(p: &mut Parser<impl TokenSource>, message: &str) -> Pattern {
    let range = p.cur_range();
    p.error(message.to_string(), range);
    let placeholder = p.intern("_error_");
    Pattern::Ident(p.resolve_identifier(placeholder, range))
}

fn error_stmt(p: &mut Parser<impl TokenSource>, message: &str) -> StmtId {
    let range = p.cur_range();
    p.error(message.to_string(), range);
    p.alloc_stmt(range, Stmt::Error)
}

/// Parses the body of a single-statement context (`if`/`else` arms, loop
/// bodies, `label:`, `with`). Spec §4.2 forbids `let`/`const`/`class`/
/// `function*`/`async function`/`async function*` declarations here; plain
/// `function` is still accepted under the Annex B path. The production is
/// parsed in full either way (for error recovery) and then flagged.
fn parse_required_statement(p: &mut Parser<impl TokenSource>) -> StmtId {
    let stmt = parse_statement(p).or_else(|| error_stmt(p, "expected a statement"));
    reject_lexical_decl_in_single_stmt_context(p, stmt);
    stmt
}

fn reject_lexical_decl_in_single_stmt_context(p: &mut Parser<impl TokenSource>, stmt: StmtId) {
    let node = p.arena().stmt(stmt);
    let message = match &node.kind {
        Stmt::VarDecl { kind: DeclKind::Let, .. } => {
            Some("'let' declarations can't appear in single-statement contexts")
        }
        Stmt::VarDecl { kind: DeclKind::Const, .. } => {
            Some("'const' declarations can't appear in single-statement contexts")
        }
        Stmt::ClassDecl { .. } => Some("class declarations can't appear in single-statement contexts"),
        Stmt::FunctionDecl { function } if function.kind != jsc_syntax::ast::FunctionKind::Normal => {
            Some("generator and async function declarations can't appear in single-statement contexts")
        }
        _ => None,
    };
    if let Some(message) = message {
        let range = node.range;
        p.error(message, range);
    }
}

// -- blocks -------------------------------------------------------------------

fn parse_block_statements(p: &mut Parser<impl TokenSource>) -> Vec<StmtId> {
    p.expect(T!['{']);
    p.open_scope(ScopeKind::Block);
    let mut body = Vec::new();
    while !p.at(T!['}']) && !p.at_eof() {
        match parse_statement(p) {
            ParsedSyntax::Present(stmt) => body.push(stmt),
            ParsedSyntax::Absent => {
                let range = p.cur_range();
                p.fatal_error(format!("unexpected token {:?}", p.cur()), range);
                if p.at_eof() {
                    break;
                }
                p.bump_any();
            }
        }
    }
    p.close_scope();
    p.expect(T!['}']);
    body
}

fn parse_block_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    let body = parse_block_statements(p);
    let end = p.cur_range();
    p.alloc_stmt(start.cover(end), Stmt::Block(body))
}

// -- declarations ---------------------------------------------------------

fn parse_var_decl_stmt(p: &mut Parser<impl TokenSource>, decl_kind: DeclKind) -> StmtId {
    let start = p.cur_range();
    p.bump_any();
    let declarations = parse_variable_declarators(p, decl_kind);
    let end = p.cur_range();
    p.expect_semi();
    p.alloc_stmt(start.cover(end), Stmt::VarDecl { kind: decl_kind, declarations })
}

fn parse_variable_declarators(
    p: &mut Parser<impl TokenSource>,
    decl_kind: DeclKind,
) -> Vec<VariableDeclarator> {
    let hoisted = decl_kind == DeclKind::Var;
    let symbol_kind = decl_symbol_kind(decl_kind);
    let mut out = Vec::new();
    loop {
        let ctx = crate::syntax::pattern::BindingContext::declaring(p.current_scope(), symbol_kind, hoisted);
        let pattern = crate::syntax::pattern::parse_binding_pattern(p, ctx)
            .or_else(|| error_pattern(p, "expected a binding pattern"));
        let init = if p.eat(T![=]) {
            Some(crate::syntax::expr::parse_assignment_expr(p))
        } else {
            None
        };
        out.push(VariableDeclarator { pattern, init });
        if !p.eat(T![,]) {
            break;
        }
    }
    out
}

fn parse_function_decl(p: &mut Parser<impl TokenSource>, is_async: bool) -> StmtId {
    let start = p.cur_range();
    if is_async {
        p.bump(T![async]);
    }
    p.bump(T![function]);
    let is_generator = p.eat(T![*]);
    let name_range = p.cur_range();
    let name = if p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword() {
        let text = p.cur_text().to_string();
        p.bump_any();
        let interned = p.intern(&text);
        Some(p.declare(p.current_scope(), interned, SymbolKind::Function, name_range, true))
    } else {
        p.error("expected a function name", name_range);
        None
    };
    let function = crate::syntax::expr::parse_function_tail(p, name, is_async, is_generator, false);
    let end = p.cur_range();
    p.alloc_stmt(start.cover(end), Stmt::FunctionDecl { function: Box::new(function) })
}

// -- control flow ---------------------------------------------------------

fn parse_if_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![if]);
    p.expect(T!['(']);
    let test = crate::syntax::expr::parse_expr(p);
    p.expect(T![')']);
    let consequent = parse_required_statement(p);
    let alternate = if p.eat(T![else]) {
        Some(parse_required_statement(p))
    } else {
        None
    };
    let end_stmt = alternate.unwrap_or(consequent);
    let end = p.arena().stmt(end_stmt).range;
    p.alloc_stmt(start.cover(end), Stmt::If { test, consequent, alternate })
}

fn parse_loop_body(p: &mut Parser<impl TokenSource>) -> StmtId {
    let saved = p.context;
    p.context = saved | ParserContext::IN_BREAKABLE | ParserContext::IN_ITERATION;
    let body = parse_required_statement(p);
    p.context = saved;
    body
}

fn parse_while_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![while]);
    p.expect(T!['(']);
    let test = crate::syntax::expr::parse_expr(p);
    p.expect(T![')']);
    let body = parse_loop_body(p);
    let end = p.arena().stmt(body).range;
    p.alloc_stmt(start.cover(end), Stmt::While { test, body })
}

fn parse_do_while_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![do]);
    let body = parse_loop_body(p);
    p.expect(T![while]);
    p.expect(T!['(']);
    let test = crate::syntax::expr::parse_expr(p);
    let end = p.cur_range();
    p.expect(T![')']);
    // ASI after `do...while(...)` is automatic regardless of line breaks.
    p.eat(T![;]);
    p.alloc_stmt(start.cover(end), Stmt::DoWhile { body, test })
}

fn finish_classic_for(p: &mut Parser<impl TokenSource>, start: TextRange, init: ForInit) -> StmtId {
    p.expect(T![;]);
    let test = if !p.at(T![;]) {
        Some(crate::syntax::expr::parse_expr(p))
    } else {
        None
    };
    p.expect(T![;]);
    let update = if !p.at(T![')']) {
        Some(crate::syntax::expr::parse_expr(p))
    } else {
        None
    };
    p.expect(T![')']);
    let body = parse_loop_body(p);
    let end = p.arena().stmt(body).range;
    p.alloc_stmt(
        start.cover(end),
        Stmt::For { head: ForHead::Classic { init, test, update }, body },
    )
}

fn parse_for_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![for]);
    let is_await = p.eat(T![await]);
    p.expect(T!['(']);

    let decl_kind = match p.cur() {
        SyntaxKind::VAR_KW => Some(DeclKind::Var),
        SyntaxKind::CONST_KW => Some(DeclKind::Const),
        SyntaxKind::LET_KW if starts_binding_target(p.nth(1)) => Some(DeclKind::Let),
        _ => None,
    };

    if let Some(decl_kind) = decl_kind {
        p.bump_any();
        let hoisted = decl_kind == DeclKind::Var;
        let symbol_kind = decl_symbol_kind(decl_kind);
        let ctx = crate::syntax::pattern::BindingContext::declaring(p.current_scope(), symbol_kind, hoisted);
        let pattern = crate::syntax::pattern::parse_binding_pattern(p, ctx)
            .or_else(|| error_pattern(p, "expected a binding pattern"));

        if p.at(T![of]) || (p.at(T![in]) && !is_await) {
            let is_of = p.eat(T![of]);
            if !is_of {
                p.bump(T![in]);
            }
            let right = if is_of {
                crate::syntax::expr::parse_assignment_expr(p)
            } else {
                crate::syntax::expr::parse_expr(p)
            };
            p.expect(T![')']);
            let head = if is_of {
                ForHead::Of { decl_kind: Some(decl_kind), pattern, right, is_await }
            } else {
                ForHead::In { decl_kind: Some(decl_kind), pattern, right }
            };
            let body = parse_loop_body(p);
            let end = p.arena().stmt(body).range;
            return p.alloc_stmt(start.cover(end), Stmt::For { head, body });
        }

        let init_range = p.cur_range();
        let init_value = if p.eat(T![=]) {
            Some(crate::syntax::expr::parse_assignment_expr(p))
        } else {
            None
        };

        // Annex B legacy production: `for (var x = e in y)` is accepted
        // (only for `var`, and only when `e` is not itself a for-in/for-of
        // head); every other combination of an initializer with `in`/`of`
        // is a syntax error, but still parses as a for-in/for-of so the
        // rest of the loop recovers cleanly.
        if init_value.is_some() && (p.at(T![in]) || p.at(T![of])) {
            let is_of = p.eat(T![of]);
            if !is_of {
                p.bump(T![in]);
            }
            if is_of {
                p.error("for-of loop variables cannot have an initializer", init_range);
            } else if decl_kind != DeclKind::Var {
                p.error("for-in loop variables cannot have an initializer", init_range);
            }
            let right = if is_of {
                crate::syntax::expr::parse_assignment_expr(p)
            } else {
                crate::syntax::expr::parse_expr(p)
            };
            p.expect(T![')']);
            let head = if is_of {
                ForHead::Of { decl_kind: Some(decl_kind), pattern, right, is_await }
            } else {
                ForHead::In { decl_kind: Some(decl_kind), pattern, right }
            };
            let body = parse_loop_body(p);
            let end = p.arena().stmt(body).range;
            return p.alloc_stmt(start.cover(end), Stmt::For { head, body });
        }

        let mut declarations = vec![VariableDeclarator { pattern, init: init_value }];
        while p.eat(T![,]) {
            let ctx =
                crate::syntax::pattern::BindingContext::declaring(p.current_scope(), symbol_kind, hoisted);
            let pattern = crate::syntax::pattern::parse_binding_pattern(p, ctx)
                .or_else(|| error_pattern(p, "expected a binding pattern"));
            let init_value = if p.eat(T![=]) {
                Some(crate::syntax::expr::parse_assignment_expr(p))
            } else {
                None
            };
            declarations.push(VariableDeclarator { pattern, init: init_value });
        }
        return finish_classic_for(p, start, ForInit::VarDecl(decl_kind, declarations));
    }

    if p.at(T![;]) {
        return finish_classic_for(p, start, ForInit::None);
    }

    let saved_ctx = p.context;
    p.context = saved_ctx.with_in(false);
    let expr = crate::syntax::expr::parse_expr(p);
    p.context = saved_ctx;

    if p.at(T![of]) || (p.at(T![in]) && !is_await) {
        let is_of = p.eat(T![of]);
        if !is_of {
            p.bump(T![in]);
        }
        let pattern = crate::syntax::pattern::reinterpret_expr_as_pattern(p, expr);
        let right = if is_of {
            crate::syntax::expr::parse_assignment_expr(p)
        } else {
            crate::syntax::expr::parse_expr(p)
        };
        p.expect(T![')']);
        let head = if is_of {
            ForHead::Of { decl_kind: None, pattern, right, is_await }
        } else {
            ForHead::In { decl_kind: None, pattern, right }
        };
        let body = parse_loop_body(p);
        let end = p.arena().stmt(body).range;
        return p.alloc_stmt(start.cover(end), Stmt::For { head, body });
    }

    finish_classic_for(p, start, ForInit::Expr(expr))
}

fn parse_switch_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![switch]);
    p.expect(T!['(']);
    let discriminant = crate::syntax::expr::parse_expr(p);
    p.expect(T![')']);
    p.expect(T!['{']);
    p.open_scope(ScopeKind::Block);
    let saved = p.context;
    p.context = saved | ParserContext::IN_BREAKABLE;
    let mut cases = Vec::new();
    let mut seen_default = false;
    while !p.at(T!['}']) && !p.at_eof() {
        let test = if p.eat(T![case]) {
            let test = crate::syntax::expr::parse_expr(p);
            p.expect(T![:]);
            Some(test)
        } else if p.eat(T![default]) {
            if seen_default {
                let range = p.cur_range();
                p.error("a switch statement may have only one default clause", range);
            }
            seen_default = true;
            p.expect(T![:]);
            None
        } else {
            let range = p.cur_range();
            p.error("expected 'case' or 'default'", range);
            p.recover(token_set![T!['}'], T![case], T![default]]);
            continue;
        };
        let mut consequent = Vec::new();
        while !matches!(p.cur(), SyntaxKind::CASE_KW | SyntaxKind::DEFAULT_KW | SyntaxKind::R_CURLY)
            && !p.at_eof()
        {
            match parse_statement(p) {
                ParsedSyntax::Present(stmt) => consequent.push(stmt),
                ParsedSyntax::Absent => {
                    let range = p.cur_range();
                    p.fatal_error(format!("unexpected token {:?}", p.cur()), range);
                    if p.at_eof() {
                        break;
                    }
                    p.bump_any();
                }
            }
        }
        cases.push(SwitchCase { test, consequent });
    }
    p.context = saved;
    p.close_scope();
    let end = p.cur_range();
    p.expect(T!['}']);
    p.alloc_stmt(start.cover(end), Stmt::Switch { discriminant, cases })
}

fn parse_try_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![try]);
    let block = parse_block_statements(p);
    let handler = if p.eat(T![catch]) {
        let param_scope = p.open_scope(ScopeKind::CatchBinding);
        let param = if p.eat(T!['(']) {
            let ctx =
                crate::syntax::pattern::BindingContext::declaring(param_scope, SymbolKind::CatchBinding, false);
            let pattern = crate::syntax::pattern::parse_binding_pattern(p, ctx)
                .or_else(|| error_pattern(p, "expected a catch binding"));
            p.expect(T![')']);
            Some(pattern)
        } else {
            None
        };
        let body = parse_block_statements(p);
        p.close_scope();
        Some(CatchClause { param, body })
    } else {
        None
    };
    let finalizer = if p.eat(T![finally]) {
        Some(parse_block_statements(p))
    } else {
        None
    };
    if handler.is_none() && finalizer.is_none() {
        let range = p.cur_range();
        p.error("missing catch or finally after try", range);
    }
    let end = p.cur_range();
    p.alloc_stmt(start.cover(end), Stmt::Try { block, handler, finalizer })
}

fn parse_throw_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![throw]);
    if p.preceded_by_line_break() {
        p.error("no line break is allowed between 'throw' and its argument", start);
    }
    let argument = crate::syntax::expr::parse_expr(p);
    let end = p.arena().expr(argument).range;
    p.expect_semi();
    p.alloc_stmt(start.cover(end), Stmt::Throw(argument))
}

fn parse_return_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![return]);
    if !p.context.contains(ParserContext::RETURN) {
        p.error("'return' is only valid inside a function body", start);
    }
    let can_have_argument = !p.preceded_by_line_break()
        && !matches!(p.cur(), SyntaxKind::SEMICOLON | SyntaxKind::R_CURLY | SyntaxKind::EOF);
    let argument = if can_have_argument {
        Some(crate::syntax::expr::parse_expr(p))
    } else {
        None
    };
    p.expect_semi();
    p.alloc_stmt(start, Stmt::Return(argument))
}

fn parse_break_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![break]);
    let label = if !p.preceded_by_line_break() && (p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword()) {
        let text = p.cur_text().to_string();
        p.bump_any();
        if p.state.find_label(&text).is_none() {
            p.error(format!("undefined label '{text}'"), start);
        }
        Some(p.intern(&text))
    } else {
        if !p.context.contains(ParserContext::IN_BREAKABLE) {
            p.error("'break' is only valid inside a loop or switch", start);
        }
        None
    };
    p.expect_semi();
    p.alloc_stmt(start, Stmt::Break(label))
}

fn parse_continue_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![continue]);
    let label = if !p.preceded_by_line_break() && (p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword()) {
        let text = p.cur_text().to_string();
        p.bump_any();
        match p.state.find_label(&text) {
            Some(true) => {}
            Some(false) => p.error(format!("'continue' cannot target the non-loop label '{text}'"), start),
            None => p.error(format!("undefined label '{text}'"), start),
        }
        Some(p.intern(&text))
    } else {
        if !p.context.contains(ParserContext::IN_ITERATION) {
            p.error("'continue' is only valid inside a loop", start);
        }
        None
    };
    p.expect_semi();
    p.alloc_stmt(start, Stmt::Continue(label))
}

fn parse_labeled_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    let text = p.cur_text().to_string();
    p.bump_any();
    p.bump(T![:]);
    if p.state.label_is_duplicate(&text) {
        p.error(format!("label '{text}' is already in use"), start);
    }
    // A transitively-nested label chain (`a: b: for (...)`) would also make
    // `a` target-able by `continue`, but the 1-token lookahead budget can't
    // see past `b` to confirm it without speculatively parsing — only the
    // immediate target is checked.
    let is_iteration = matches!(p.cur(), SyntaxKind::FOR_KW | SyntaxKind::WHILE_KW | SyntaxKind::DO_KW);
    p.state.push_label(text.clone(), is_iteration);
    let body = parse_required_statement(p);
    p.state.pop_label();
    let name = p.intern(&text);
    let scope = p.current_scope();
    p.scopes_mut().push_label(
        scope,
        jsc_syntax::scope::LabelBinding { name, range: start, is_iteration_statement: is_iteration },
    );
    let end = p.arena().stmt(body).range;
    p.alloc_stmt(start.cover(end), Stmt::Labeled { label: name, body })
}

fn parse_with_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![with]);
    p.expect(T!['(']);
    let object = crate::syntax::expr::parse_expr(p);
    p.expect(T![')']);
    let body = parse_required_statement(p);
    let end = p.arena().stmt(body).range;
    let stmt = p.alloc_stmt(start.cover(end), Stmt::With { object, body });
    stmt.excluding_syntax(
        p,
        p.state.strict.is_strict(),
        "'with' statements are not allowed in strict mode",
        start,
    )
}

fn parse_debugger_stmt(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![debugger]);
    p.expect_semi();
    p.alloc_stmt(start, Stmt::Debugger)
}

fn parse_expr_stmt(p: &mut Parser<impl TokenSource>) -> ParsedSyntax<StmtId> {
    if p.at_eof() {
        return ParsedSyntax::Absent;
    }
    let start = p.cur_range();
    let expr = crate::syntax::expr::parse_expr(p);
    let end = p.arena().expr(expr).range;
    p.expect_semi();
    ParsedSyntax::Present(p.alloc_stmt(start.cover(end), Stmt::Expr(expr)))
}

// -- directive prologue ----------------------------------------------------

/// Recognizes one entry of the directive prologue: a string-literal
/// expression statement, immediately followed
/// by its statement terminator with nothing else attached (so `"a" + "b";`
/// or `("use strict");` don't count). Returns the directive's exact source
/// text (quotes stripped, escapes *not* decoded — `"use strict"` is a
/// different directive from `"use strict"`, spec's literal-text rule).
pub fn try_parse_directive(p: &mut Parser<impl TokenSource>) -> Option<String> {
    if p.cur() != SyntaxKind::STRING {
        return None;
    }
    let checkpoint = p.checkpoint();
    let raw = match p.peek_current_payload() {
        TokenPayload::String { raw, .. } => raw.clone(),
        _ => return None,
    };
    p.bump_any();
    let directive_end = p.at(T![;]) || p.at(T!['}']) || p.at_eof() || p.preceded_by_line_break();
    if !directive_end {
        p.rewind(checkpoint);
        return None;
    }
    p.eat(T![;]);
    Some(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
}

// -- hoisting ---------------------------------------------------------------

/// Walks a just-parsed function/program body for block-nested function
/// declarations and, outside strict mode, also declares each as a `var` of
/// the enclosing function scope — the Annex B web-compatibility quirk
/// where a function declared directly inside a block is also visible, as a
/// plain `var`, in the enclosing function. `var`/hoisted-function
/// declarations at the body's
/// own top level already hoisted themselves as they were parsed
/// ([`Parser::declare`] with `hoisted: true`); this pass only reaches
/// declarations nested under `if`/loops/`try`/labels/nested blocks.
pub fn run_var_hoisting(p: &mut Parser<impl TokenSource>, scope: ScopeId, body: &[StmtId]) {
    if p.state.strict.is_strict() {
        return;
    }
    for &stmt in body {
        annex_b_hoist(p, scope, stmt, true);
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use jsc_syntax::ast::{DeclKind, ForHead, Stmt};

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    fn first_stmt(result: &crate::ParseResult) -> Stmt {
        let stmt = result.body[0];
        result.arena.stmt(stmt).kind.clone()
    }

    #[test]
    fn legacy_for_in_with_var_initializer_parses_without_errors() {
        let result = parse("for (var x = 0 in y) ;");
        assert!(!result.diagnostics.has_errors());
        match first_stmt(&result) {
            Stmt::For { head: ForHead::In { decl_kind: Some(DeclKind::Var), .. }, .. } => {}
            other => panic!("expected a var for-in statement, got {other:?}"),
        }
    }

    #[test]
    fn legacy_for_in_with_let_initializer_is_an_error() {
        let result = parse("for (let x = 0 in y) ;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("for-in loop variables cannot have an initializer")));
    }

    #[test]
    fn for_of_with_an_initializer_is_always_an_error() {
        let result = parse("for (var x = 0 of y) ;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("for-of loop variables cannot have an initializer")));
    }

    #[test]
    fn ordinary_classic_for_with_var_initializer_is_unaffected() {
        let result = parse("for (var i = 0; i < 10; i++) ;");
        assert!(!result.diagnostics.has_errors());
        match first_stmt(&result) {
            Stmt::For { head: ForHead::Classic { .. }, .. } => {}
            other => panic!("expected a classic for statement, got {other:?}"),
        }
    }

    #[test]
    fn for_in_without_a_declaration_keyword_reinterprets_the_left_as_a_pattern() {
        let result = parse("for (x in y) ;");
        assert!(!result.diagnostics.has_errors());
        match first_stmt(&result) {
            Stmt::For { head: ForHead::In { decl_kind: None, .. }, .. } => {}
            other => panic!("expected a bare for-in statement, got {other:?}"),
        }
    }

    #[test]
    fn break_outside_a_loop_or_switch_is_an_error() {
        let result = parse("break;");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn continue_targeting_a_non_loop_label_is_an_error() {
        let result = parse("outer: { continue outer; }");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("non-loop label")));
    }

    #[test]
    fn continue_targeting_a_loop_label_is_fine() {
        let result = parse("outer: for (;;) { continue outer; }");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn duplicate_label_in_the_same_scope_is_an_error() {
        let result = parse("a: a: ;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("already in use")));
    }

    #[test]
    fn with_statement_is_rejected_in_strict_mode() {
        let result = parse("\"use strict\"; with (o) { }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn function_in_block_hoists_a_var_alias_in_sloppy_mode() {
        let result = parse("if (true) { function f() {} } f;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn try_without_catch_or_finally_is_an_error() {
        let result = parse("try { }");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("missing catch or finally")));
    }

    #[test]
    fn switch_with_two_default_clauses_is_an_error() {
        let result = parse("switch (x) { default: break; default: break; }");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("only one default clause")));
    }

    #[test]
    fn let_declaration_as_an_if_body_is_an_error() {
        let result = parse("if (true) let x = 1;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("'let' declarations can't appear in single-statement contexts")));
    }

    #[test]
    fn const_declaration_as_an_if_body_is_an_error() {
        let result = parse("if (true) const x = 1;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("'const' declarations can't appear in single-statement contexts")));
    }

    #[test]
    fn class_declaration_as_a_while_body_is_an_error() {
        let result = parse("while (c) class C {}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("class declarations can't appear in single-statement contexts")));
    }

    #[test]
    fn generator_declaration_as_a_label_body_is_an_error() {
        let result = parse("label: function* g(){}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("generator and async function declarations can't appear in single-statement contexts")));
    }

    #[test]
    fn async_function_declaration_as_a_with_body_is_an_error() {
        let result = parse("with (o) async function f(){}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("generator and async function declarations can't appear in single-statement contexts")));
    }

    #[test]
    fn plain_function_as_an_if_body_is_accepted_via_annex_b() {
        let result = parse("if (true) function f() {}");
        assert!(result
            .diagnostics
            .iter()
            .all(|d| !d.message.contains("single-statement contexts")));
    }
}

fn annex_b_hoist(p: &mut Parser<impl TokenSource>, scope: ScopeId, stmt: StmtId, top_level: bool) {
    let kind = p.arena().stmt(stmt).kind.clone();
    match kind {
        Stmt::FunctionDecl { function } if !top_level => {
            if let Some(symbol) = function.name {
                let data = p.symbols().get(symbol);
                let (name, range) = (data.name, data.declaration_range);
                p.declare(scope, name, SymbolKind::Hoisted, range, true);
            }
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                annex_b_hoist(p, scope, s, false);
            }
        }
        Stmt::If { consequent, alternate, .. } => {
            annex_b_hoist(p, scope, consequent, false);
            if let Some(alt) = alternate {
                annex_b_hoist(p, scope, alt, false);
            }
        }
        Stmt::For { body, .. } | Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            annex_b_hoist(p, scope, body, false);
        }
        Stmt::Labeled { body, .. } | Stmt::With { body, .. } => {
            annex_b_hoist(p, scope, body, false);
        }
        Stmt::Try { block, handler, finalizer } => {
            for s in block {
                annex_b_hoist(p, scope, s, false);
            }
            if let Some(handler) = handler {
                for s in handler.body {
                    annex_b_hoist(p, scope, s, false);
                }
            }
            if let Some(finalizer) = finalizer {
                for s in finalizer {
                    annex_b_hoist(p, scope, s, false);
                }
            }
        }
        Stmt::Switch { cases, .. } => {
            for case in cases {
                for s in case.consequent {
                    annex_b_hoist(p, scope, s, false);
                }
            }
        }
        _ => {}
    }
}
