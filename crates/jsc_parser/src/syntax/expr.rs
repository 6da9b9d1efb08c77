//! The Pratt expression parser. Precedence climbs bottom-up from
//! assignment down to primary expressions through a `parse_*`-per-
//! precedence-tier cascade, each tier allocating typed [`Expr`] nodes
//! directly as it goes.

use crate::parser::Parser;
use crate::state::ParserContext;
use crate::token_source::TokenSource;
use crate::T;
use jsc_syntax::ast::{
    Argument, ArrayElement, AssignOp, BinaryOp, ChainLinkPosition, Expr, ExprId, Function,
    FunctionBody, FunctionKind, LogicalOp, Param, PropertyKey, PropertyKind, TemplateLiteral,
    TemplatePart, UnaryOp, UpdateOp,
};
use jsc_syntax::scope::ScopeKind;
use jsc_syntax::symbol::SymbolKind;
use jsc_syntax::token::TokenPayload;
use jsc_syntax::SyntaxKind;

/// `expr, expr, ...` — the comma operator is just the lowest precedence
/// tier, below assignment.
pub fn parse_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let first = parse_assignment_expr(p);
    if !p.at(T![,]) {
        return first;
    }
    let mut exprs = vec![first];
    while p.eat(T![,]) {
        exprs.push(parse_assignment_expr(p));
    }
    let end = p.arena().expr(*exprs.last().unwrap()).range;
    p.alloc_expr(start.cover(end), Expr::Sequence(exprs))
}

/// Assignment expressions, the arrow-function/conditional/yield entry
/// point. Arrow detection requires a checkpointed speculative parse: an
/// identifier or a parenthesized list followed by `=>` is an arrow, while
/// the same prefix followed by anything else is a conditional expression —
/// the parameter list is reinterpreted from the already-parsed expression
/// rather than parsed twice.
pub fn parse_assignment_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    if p.context.contains(ParserContext::YIELD) && p.at(T![yield]) {
        return parse_yield_expr(p);
    }
    if let Some(arrow) = try_parse_arrow_function(p) {
        return arrow;
    }

    let start = p.cur_range();
    let left = parse_conditional_expr(p);
    if let Some(op) = assign_op(p.cur()) {
        p.bump_any();
        let pattern = crate::syntax::pattern::reinterpret_expr_as_pattern(p, left);
        let _ = pattern; // validated shape; `Assign` still carries `left` as the target expr
        let right = parse_assignment_expr(p);
        let end = p.arena().expr(right).range;
        return p.alloc_expr(
            start.cover(end),
            Expr::Assign {
                op,
                target: left,
                value: right,
            },
        );
    }
    left
}

fn assign_op(kind: SyntaxKind) -> Option<AssignOp> {
    Some(match kind {
        k if k == T![=] => AssignOp::Eq,
        k if k == T![+=] => AssignOp::AddEq,
        k if k == T![-=] => AssignOp::SubEq,
        k if k == T![*=] => AssignOp::MulEq,
        k if k == T![/=] => AssignOp::DivEq,
        k if k == T![%=] => AssignOp::ModEq,
        k if k == T![**=] => AssignOp::ExpEq,
        k if k == T![&=] => AssignOp::BitAndEq,
        k if k == T![|=] => AssignOp::BitOrEq,
        k if k == T![^=] => AssignOp::BitXorEq,
        k if k == T![<<=] => AssignOp::ShlEq,
        k if k == T![>>=] => AssignOp::ShrEq,
        k if k == T![>>>=] => AssignOp::UShrEq,
        k if k == T![&&=] => AssignOp::AndEq,
        k if k == T![||=] => AssignOp::OrEq,
        k if k == T![??=] => AssignOp::NullishEq,
        _ => return None,
    })
}

fn parse_yield_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T![yield]);
    let delegate = p.eat(T![*]);
    let can_have_argument = !p.preceded_by_line_break()
        && !matches!(p.cur(), SyntaxKind::SEMICOLON | SyntaxKind::R_PAREN | SyntaxKind::R_BRACK | SyntaxKind::R_CURLY | SyntaxKind::COMMA | SyntaxKind::COLON | SyntaxKind::EOF);
    let argument = if delegate || can_have_argument {
        Some(parse_assignment_expr(p))
    } else {
        None
    };
    let end = argument.map(|a| p.arena().expr(a).range).unwrap_or(start);
    p.alloc_expr(start.cover(end), Expr::Yield { argument, delegate })
}

/// Attempts to parse an arrow function starting at the current position,
/// rewinding and returning `None` if the prefix doesn't resolve to `=>`.
/// The arrow's own `FunctionArgs` scope is opened before its parameter
/// list so bindings declare into the scope the body will also resolve
/// against, then closed before rewinding on failure (the [`Checkpoint`]
/// rewind asserts balanced scope depth).
fn try_parse_arrow_function(p: &mut Parser<impl TokenSource>) -> Option<ExprId> {
    let is_async = p.at(T![async])
        && (p.nth_at(1, SyntaxKind::IDENT) || p.nth_at(1, T!['(']))
        && !p.nth_preceded_by_line_break(1);
    let start = p.cur_range();
    let checkpoint = p.checkpoint();

    if is_async {
        p.bump_any();
    }

    p.open_scope(ScopeKind::FunctionArgs);
    let params = if p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword() {
        Some(parse_single_ident_param_list(p))
    } else if p.at(T!['(']) {
        parse_parenthesized_param_list(p)
    } else {
        None
    };

    let params = match params {
        Some(params) if p.at(T![=>]) && !p.preceded_by_line_break() => params,
        _ => {
            p.close_scope();
            p.rewind(checkpoint);
            return None;
        }
    };
    p.bump(T![=>]);

    let saved_ctx = p.context;
    p.context = p.context.for_function_body(is_async, false);
    let body = if p.at(T!['{']) {
        FunctionBody::Block(parse_function_block_body(p))
    } else {
        FunctionBody::Expr(parse_assignment_expr(p))
    };
    p.context = saved_ctx;
    p.close_scope();

    let kind = if is_async {
        FunctionKind::Async
    } else {
        FunctionKind::Normal
    };
    let end = match &body {
        FunctionBody::Expr(e) => p.arena().expr(*e).range,
        FunctionBody::Block(_) => p.cur_range(),
    };
    Some(p.alloc_expr(
        start.cover(end),
        Expr::Function(Box::new(Function {
            name: None,
            kind,
            params,
            body,
            is_arrow: true,
        })),
    ))
}

fn parse_single_ident_param_list(p: &mut Parser<impl TokenSource>) -> Vec<Param> {
    let ctx = crate::syntax::pattern::BindingContext::declaring(
        p.current_scope(),
        SymbolKind::Let,
        false,
    );
    match crate::syntax::pattern::parse_binding_pattern(p, ctx) {
        crate::parser::ParsedSyntax::Present(pattern) => vec![Param {
            pattern,
            default: None,
            rest: false,
        }],
        crate::parser::ParsedSyntax::Absent => Vec::new(),
    }
}

/// Parses `(a, b = 1, ...rest)` as an arrow parameter list, declaring each
/// binding into the scope the caller already opened. Returns `None` if
/// what follows `(` doesn't resolve to a parameter list at all — the
/// caller then rewinds and falls back to a parenthesized expression.
fn parse_parenthesized_param_list(p: &mut Parser<impl TokenSource>) -> Option<Vec<Param>> {
    p.bump(T!['(']);
    let scope = p.current_scope();
    let mut params = Vec::new();
    let mut ok = true;
    while !p.at(T![')']) && !p.at_eof() {
        let rest = p.eat(T![...]);
        let ctx = crate::syntax::pattern::BindingContext::declaring(scope, SymbolKind::Let, false);
        let pattern = match crate::syntax::pattern::parse_binding_pattern(p, ctx) {
            crate::parser::ParsedSyntax::Present(pattern) => pattern,
            crate::parser::ParsedSyntax::Absent => {
                ok = false;
                break;
            }
        };
        let default = if !rest && p.eat(T![=]) {
            Some(parse_assignment_expr(p))
        } else {
            None
        };
        params.push(Param {
            pattern,
            default,
            rest,
        });
        if !p.at(T![')']) && !p.eat(T![,]) {
            ok = false;
            break;
        }
    }
    if ok {
        ok = p.eat(T![')']);
    }
    if ok {
        Some(params)
    } else {
        None
    }
}

// -- conditional / binary / unary -------------------------------------------

pub fn parse_conditional_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let test = parse_binary_expr(p, 0);
    if !p.eat(T![?]) {
        return test;
    }
    let ctx = p.context;
    p.context = ctx | ParserContext::IN;
    let consequent = parse_assignment_expr(p);
    p.context = ctx;
    p.expect(T![:]);
    let alternate = parse_assignment_expr(p);
    let end = p.arena().expr(alternate).range;
    p.alloc_expr(
        start.cover(end),
        Expr::Conditional {
            test,
            consequent,
            alternate,
        },
    )
}

/// Binary-operator precedence, highest number binds tightest.
/// `??` deliberately sits at its own tier between `||` and assignment — the
/// "can't mix `??` with `||`/`&&` without parens" restriction is a
/// validator-time check, not a precedence-climbing concern.
fn binary_binding_power(kind: SyntaxKind) -> Option<(u8, bool)> {
    let power = match kind {
        k if k == T![??] => 1,
        k if k == T![||] => 2,
        k if k == T![&&] => 3,
        k if k == T![|] => 4,
        k if k == T![^] => 5,
        k if k == T![&] => 6,
        k if k == T![==] || k == T![!=] || k == T![===] || k == T![!==] => 7,
        k if k == T![<] || k == T![>] || k == T![<=] || k == T![>=] || k == T![instanceof] || k == T![in] => 8,
        k if k == T![<<] || k == T![>>] || k == T![>>>] => 9,
        k if k == T![+] || k == T![-] => 10,
        k if k == T![*] || k == T![/] || k == T![%] => 11,
        k if k == T![**] => 12,
        _ => return None,
    };
    // `**` is right-associative.
    Some((power, kind == T![**]))
}

pub fn parse_binary_expr(p: &mut Parser<impl TokenSource>, min_power: u8) -> ExprId {
    let mut left = parse_unary_expr(p);
    loop {
        if p.at(T![in]) && !p.context.contains(ParserContext::IN) {
            break;
        }
        let Some((power, right_assoc)) = binary_binding_power(p.cur()) else {
            break;
        };
        if power < min_power {
            break;
        }
        let op_kind = p.cur();
        let start = p.arena().expr(left).range;
        if op_kind == T![**]
            && matches!(p.arena().expr(left).kind, Expr::Unary { .. } | Expr::Await(_))
        {
            p.error(
                "unary expression cannot appear on the left-hand side of '**'; wrap it in parentheses",
                start,
            );
        }
        p.bump_any();
        let next_min = if right_assoc { power } else { power + 1 };
        let right = parse_binary_expr(p, next_min);
        let end = p.arena().expr(right).range;
        let range = start.cover(end);
        left = if op_kind == T![**] {
            p.alloc_expr(range, Expr::Exponent { base: left, exponent: right })
        } else if let Some(logical) = logical_op(op_kind) {
            p.alloc_expr(range, Expr::Logical { op: logical, left, right })
        } else {
            let op = binary_op(op_kind);
            p.alloc_expr(range, Expr::Binary { op, left, right })
        };
    }
    left
}

fn logical_op(kind: SyntaxKind) -> Option<LogicalOp> {
    Some(match kind {
        k if k == T![&&] => LogicalOp::And,
        k if k == T![||] => LogicalOp::Or,
        k if k == T![??] => LogicalOp::NullishCoalescing,
        _ => return None,
    })
}

fn binary_op(kind: SyntaxKind) -> BinaryOp {
    match kind {
        k if k == T![+] => BinaryOp::Add,
        k if k == T![-] => BinaryOp::Sub,
        k if k == T![*] => BinaryOp::Mul,
        k if k == T![/] => BinaryOp::Div,
        k if k == T![%] => BinaryOp::Mod,
        k if k == T![&] => BinaryOp::BitAnd,
        k if k == T![|] => BinaryOp::BitOr,
        k if k == T![^] => BinaryOp::BitXor,
        k if k == T![<<] => BinaryOp::Shl,
        k if k == T![>>] => BinaryOp::Shr,
        k if k == T![>>>] => BinaryOp::UShr,
        k if k == T![<] => BinaryOp::Lt,
        k if k == T![<=] => BinaryOp::Lte,
        k if k == T![>] => BinaryOp::Gt,
        k if k == T![>=] => BinaryOp::Gte,
        k if k == T![in] => BinaryOp::In,
        k if k == T![instanceof] => BinaryOp::Instanceof,
        k if k == T![==] => BinaryOp::EqEq,
        k if k == T![!=] => BinaryOp::NotEq,
        k if k == T![===] => BinaryOp::EqEqEq,
        k if k == T![!==] => BinaryOp::NotEqEq,
        _ => unreachable!("binary_op called with a non-binary-operator token"),
    }
}

pub fn parse_unary_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let unary_op = match p.cur() {
        k if k == T![-] => Some(UnaryOp::Minus),
        k if k == T![+] => Some(UnaryOp::Plus),
        k if k == T![~] => Some(UnaryOp::BitNot),
        k if k == T![!] => Some(UnaryOp::Not),
        k if k == T![void] => Some(UnaryOp::Void),
        k if k == T![delete] => Some(UnaryOp::Delete),
        k if k == T![typeof] => Some(UnaryOp::Typeof),
        _ => None,
    };
    if let Some(op) = unary_op {
        p.bump_any();
        let argument = parse_unary_expr(p);
        let end = p.arena().expr(argument).range;
        return p.alloc_expr(start.cover(end), Expr::Unary { op, argument });
    }
    if p.at(T![await]) && p.context.contains(ParserContext::AWAIT) {
        p.bump_any();
        let argument = parse_unary_expr(p);
        let end = p.arena().expr(argument).range;
        return p.alloc_expr(start.cover(end), Expr::Await(argument));
    }
    if matches!(p.cur(), SyntaxKind::PLUS2 | SyntaxKind::MINUS2) {
        let op = if p.cur() == SyntaxKind::PLUS2 {
            UpdateOp::Increment
        } else {
            UpdateOp::Decrement
        };
        p.bump_any();
        let argument = parse_unary_expr(p);
        let end = p.arena().expr(argument).range;
        return p.alloc_expr(
            start.cover(end),
            Expr::Update { op, argument, prefix: true },
        );
    }
    parse_postfix_expr(p)
}

fn parse_postfix_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let expr = parse_lhs_expr(p);
    if p.preceded_by_line_break() {
        return expr;
    }
    if matches!(p.cur(), SyntaxKind::PLUS2 | SyntaxKind::MINUS2) {
        let op = if p.cur() == SyntaxKind::PLUS2 {
            UpdateOp::Increment
        } else {
            UpdateOp::Decrement
        };
        let start = p.arena().expr(expr).range;
        let end = p.cur_range();
        p.bump_any();
        return p.alloc_expr(
            start.cover(end),
            Expr::Update { op, argument: expr, prefix: false },
        );
    }
    expr
}

// -- left-hand-side: new/call/member chains with optional chaining ----------

pub(crate) fn parse_lhs_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let mut expr = if p.at(T![new]) {
        parse_new_expr(p)
    } else {
        parse_primary_expr(p)
    };
    let mut chain_open = false;
    loop {
        if p.at(T![?.]) {
            p.bump_any();
            chain_open = true;
            if p.at(T!['(']) {
                let arguments = parse_arguments(p);
                let end = p.cur_range();
                expr = p.alloc_expr(
                    start.cover(end),
                    Expr::Call {
                        callee: expr,
                        arguments,
                        chain: ChainLinkPosition::ChainStart,
                    },
                );
            } else if p.eat(T!['[']) {
                let property = parse_assignment_expr(p);
                p.expect(T![']']);
                let end = p.cur_range();
                expr = p.alloc_expr(
                    start.cover(end),
                    Expr::Member {
                        object: expr,
                        property: PropertyKey::Computed(property),
                        computed: true,
                        chain: ChainLinkPosition::ChainStart,
                    },
                );
            } else {
                let (key, range) = parse_member_name(p);
                expr = p.alloc_expr(
                    start.cover(range),
                    Expr::Member {
                        object: expr,
                        property: key,
                        computed: false,
                        chain: ChainLinkPosition::ChainStart,
                    },
                );
            }
            continue;
        }
        if p.eat(T![.]) {
            let (key, range) = parse_member_name(p);
            let position = if chain_open {
                ChainLinkPosition::ChainContinue
            } else {
                ChainLinkPosition::None
            };
            expr = p.alloc_expr(
                start.cover(range),
                Expr::Member {
                    object: expr,
                    property: key,
                    computed: false,
                    chain: position,
                },
            );
            continue;
        }
        if p.eat(T!['[']) {
            let property = parse_assignment_expr(p);
            p.expect(T![']']);
            let end = p.cur_range();
            let position = if chain_open {
                ChainLinkPosition::ChainContinue
            } else {
                ChainLinkPosition::None
            };
            expr = p.alloc_expr(
                start.cover(end),
                Expr::Member {
                    object: expr,
                    property: PropertyKey::Computed(property),
                    computed: true,
                    chain: position,
                },
            );
            continue;
        }
        if p.at(T!['(']) {
            let arguments = parse_arguments(p);
            let end = p.cur_range();
            let position = if chain_open {
                ChainLinkPosition::ChainContinue
            } else {
                ChainLinkPosition::None
            };
            expr = p.alloc_expr(
                start.cover(end),
                Expr::Call {
                    callee: expr,
                    arguments,
                    chain: position,
                },
            );
            continue;
        }
        if matches!(p.cur(), SyntaxKind::NO_SUBSTITUTION_TEMPLATE | SyntaxKind::TEMPLATE_HEAD) {
            if chain_open {
                let range = p.cur_range();
                p.error("Template literals cannot have an optional chain as a tag", range);
            }
            let quasi = parse_template_literal(p);
            let end = p.arena().expr(expr).range;
            expr = p.alloc_expr(start.cover(end), Expr::TaggedTemplate { tag: expr, quasi });
            continue;
        }
        break;
    }
    expr
}

fn parse_member_name(p: &mut Parser<impl TokenSource>) -> (PropertyKey, jsc_rowan::TextRange) {
    let range = p.cur_range();
    if p.at(SyntaxKind::PRIVATE_NAME) {
        let text = p.cur_text().to_string();
        p.bump_any();
        let name = p.intern(&text);
        p.resolve_private_name(name, range);
        return (PropertyKey::PrivateName(name), range);
    }
    let text = p.cur_text().to_string();
    p.bump_any();
    let name = p.intern(&text);
    (PropertyKey::Ident(name), range)
}

fn parse_new_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T![new]);
    if p.at(T![.]) {
        p.bump_any();
        let text = p.cur_text().to_string();
        let end = p.cur_range();
        p.bump_any();
        if text == "target" {
            return p.alloc_expr(start.cover(end), Expr::NewTarget);
        }
        p.error("expected 'target' after 'new.'", end);
        return p.alloc_expr(start.cover(end), Expr::Error);
    }
    let callee = if p.at(T![new]) {
        parse_new_expr(p)
    } else {
        parse_primary_expr_with_members(p)
    };
    let arguments = if p.at(T!['(']) {
        parse_arguments(p)
    } else {
        Vec::new()
    };
    let end = p.cur_range();
    p.alloc_expr(start.cover(end), Expr::New { callee, arguments })
}

/// `new`'s callee only consumes member accesses, not calls (`new a().b` is
/// `(new a()).b`, spec's MemberExpression production) — parsed separately
/// from the general LHS loop which also consumes `(...)`.
fn parse_primary_expr_with_members(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let mut expr = parse_primary_expr(p);
    loop {
        if p.eat(T![.]) {
            let (key, range) = parse_member_name(p);
            expr = p.alloc_expr(
                start.cover(range),
                Expr::Member {
                    object: expr,
                    property: key,
                    computed: false,
                    chain: ChainLinkPosition::None,
                },
            );
        } else if p.eat(T!['[']) {
            let property = parse_assignment_expr(p);
            p.expect(T![']']);
            let end = p.cur_range();
            expr = p.alloc_expr(
                start.cover(end),
                Expr::Member {
                    object: expr,
                    property: PropertyKey::Computed(property),
                    computed: true,
                    chain: ChainLinkPosition::None,
                },
            );
        } else {
            break;
        }
    }
    expr
}

fn parse_arguments(p: &mut Parser<impl TokenSource>) -> Vec<Argument> {
    p.expect(T!['(']);
    let mut arguments = Vec::new();
    while !p.at(T![')']) && !p.at_eof() {
        let spread = p.eat(T![...]);
        let expr = parse_assignment_expr(p);
        arguments.push(Argument { expr, spread });
        if !p.at(T![')']) {
            p.expect(T![,]);
        }
    }
    p.expect(T![')']);
    arguments
}

// -- primary expressions ------------------------------------------------------

/// `0123`-style legacy octal (Annex B): leading `0` followed directly by
/// another digit, with no `0x`/`0o`/`0b` prefix, no decimal point, and no
/// exponent — `0`, `0.5`, `0e1`, and `0o17` are all fine. Escalated to an
/// error under module mode by the finalization pass.
fn is_legacy_octal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return false;
    }
    if matches!(bytes[1], b'x' | b'X' | b'o' | b'O' | b'b' | b'B') {
        return false;
    }
    if !bytes[1].is_ascii_digit() {
        return false;
    }
    !text.contains('.') && !text.contains('e') && !text.contains('E')
}

fn parse_primary_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    match p.cur() {
        SyntaxKind::NUMBER => {
            let value = match p.peek_current_payload() {
                TokenPayload::Number(n) => *n,
                _ => f64::NAN,
            };
            let text = p.cur_text().to_string();
            if is_legacy_octal_literal(&text) {
                p.push_diagnostic(crate::diagnostics::Diagnostic::warning(
                    "legacy octal literals are not allowed in strict mode",
                    start,
                ));
            }
            p.bump_any();
            p.alloc_expr(start, Expr::NumberLit(value))
        }
        SyntaxKind::BIGINT => {
            let text = match p.peek_current_payload() {
                TokenPayload::BigInt(s) => s.clone(),
                _ => String::new(),
            };
            p.bump_any();
            p.alloc_expr(start, Expr::BigIntLit(text))
        }
        SyntaxKind::STRING => {
            let value = match p.peek_current_payload() {
                TokenPayload::String { value, .. } => value.clone(),
                _ => String::new(),
            };
            p.bump_any();
            p.alloc_expr(start, Expr::StringLit(value))
        }
        SyntaxKind::IDENT => {
            let text = p.cur_text().to_string();
            match text.as_str() {
                "true" => {
                    p.bump_any();
                    p.alloc_expr(start, Expr::BooleanLit(true))
                }
                "false" => {
                    p.bump_any();
                    p.alloc_expr(start, Expr::BooleanLit(false))
                }
                "null" => {
                    p.bump_any();
                    p.alloc_expr(start, Expr::NullLit)
                }
                _ => {
                    p.bump_any();
                    let name = p.intern(&text);
                    let symbol = p.resolve_identifier(name, start);
                    p.alloc_expr(start, Expr::Identifier(symbol))
                }
            }
        }
        k if k.is_contextual_keyword() => {
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            let symbol = p.resolve_identifier(name, start);
            p.alloc_expr(start, Expr::Identifier(symbol))
        }
        SyntaxKind::THIS_KW => {
            p.bump_any();
            p.alloc_expr(start, Expr::This)
        }
        SyntaxKind::SUPER_KW => {
            p.bump_any();
            if !p.context.contains(crate::state::ParserContext::IN_CLASS) {
                p.error("'super' keyword is only valid inside a class", start);
            } else if p.at(T!['('])
                && !p.context.contains(crate::state::ParserContext::DERIVED_CONSTRUCTOR)
            {
                p.error(
                    "'super' calls are only valid in the constructor of a derived class",
                    start,
                );
            }
            p.alloc_expr(start, Expr::Super)
        }
        SyntaxKind::FUNCTION_KW => parse_function_expr(p, false),
        SyntaxKind::ASYNC_KW if p.nth_at(1, SyntaxKind::FUNCTION_KW) => {
            p.bump_any();
            parse_function_expr(p, true)
        }
        SyntaxKind::CLASS_KW => crate::syntax::class::parse_class_expr(p),
        SyntaxKind::L_PAREN => parse_parenthesized_expr(p),
        SyntaxKind::L_BRACK => parse_array_literal(p),
        SyntaxKind::L_CURLY => parse_object_literal(p),
        SyntaxKind::NO_SUBSTITUTION_TEMPLATE | SyntaxKind::TEMPLATE_HEAD => {
            let template = parse_template_literal(p);
            let end = template
                .parts
                .last()
                .map(|part| part.range)
                .unwrap_or(start);
            p.alloc_expr(start.cover(end), Expr::Template(template))
        }
        SyntaxKind::SLASH | SyntaxKind::SLASHEQ => {
            p.relex(crate::token_source::ReLexContext::Regex);
            parse_regex_literal(p)
        }
        SyntaxKind::IMPORT_KW => {
            p.bump_any();
            if p.eat(T![.]) {
                let end = p.cur_range();
                p.bump_any();
                return p.alloc_expr(start.cover(end), Expr::ImportMeta);
            }
            let arguments = parse_arguments(p);
            let end = p.cur_range();
            let callee = p.alloc_expr(start, Expr::Error);
            p.alloc_expr(start.cover(end), Expr::Call { callee, arguments, chain: ChainLinkPosition::None })
        }
        SyntaxKind::LT if p.options.loader.enables_jsx() => crate::syntax::jsx::parse_jsx_element(p),
        SyntaxKind::PRIVATE_NAME => {
            // Only legal spelling of a bare private name: the left side of
            // `#x in obj`, an ergonomic brand check.
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            let symbol = p.resolve_private_name(name, start);
            if !p.at(T![in]) {
                p.error("private names may only appear after '.' or before 'in'", start);
            }
            p.alloc_expr(start, Expr::Identifier(symbol))
        }
        _ => {
            p.error(format!("unexpected token {:?}", p.cur()), start);
            p.bump_any();
            p.alloc_expr(start, Expr::Error)
        }
    }
}

fn parse_regex_literal(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let (pattern, flags) = match p.peek_current_payload() {
        TokenPayload::Regex { pattern, flags } => (pattern.clone(), flags.clone()),
        _ => (String::new(), String::new()),
    };
    p.bump_any();
    p.alloc_expr(start, Expr::RegexLit { pattern, flags })
}

pub(crate) fn parse_function_expr(p: &mut Parser<impl TokenSource>, is_async: bool) -> ExprId {
    let start = p.cur_range();
    p.bump(T![function]);
    let is_generator = p.eat(T![*]);
    let name = if p.at(SyntaxKind::IDENT) {
        let text = p.cur_text().to_string();
        let range = p.cur_range();
        p.bump_any();
        let interned = p.intern(&text);
        let scope = p.current_scope();
        Some(p.declare(scope, interned, SymbolKind::Function, range, false))
    } else {
        None
    };
    let function = parse_function_tail(p, name, is_async, is_generator, false);
    let end = p.cur_range();
    p.alloc_expr(start.cover(end), Expr::Function(Box::new(function)))
}

/// Parses `(params) { body }` given the declaration's name/async/generator
/// bits are already known; shared by function expressions, function
/// declarations (`stmt.rs`), and class methods (`class.rs`).
pub fn parse_function_tail(
    p: &mut Parser<impl TokenSource>,
    name: Option<jsc_syntax::symbol::SymbolId>,
    is_async: bool,
    is_generator: bool,
    is_arrow: bool,
) -> Function {
    p.open_scope(ScopeKind::FunctionArgs);
    let saved_ctx = p.context;
    p.context = p.context.for_function_body(is_async, is_generator);
    let params = parse_function_params(p);
    let body = FunctionBody::Block(parse_function_block_body(p));
    p.context = saved_ctx;
    p.close_scope();
    let kind = match (is_async, is_generator) {
        (true, true) => FunctionKind::AsyncGenerator,
        (true, false) => FunctionKind::Async,
        (false, true) => FunctionKind::Generator,
        (false, false) => FunctionKind::Normal,
    };
    Function {
        name,
        kind,
        params,
        body,
        is_arrow,
    }
}

pub fn parse_function_params(p: &mut Parser<impl TokenSource>) -> Vec<Param> {
    let scope_id = p.current_scope();
    p.expect(T!['(']);
    let mut params = Vec::new();
    while !p.at(T![')']) && !p.at_eof() {
        let rest = p.eat(T![...]);
        let ctx = crate::syntax::pattern::BindingContext::declaring(scope_id, SymbolKind::Let, false);
        let pattern = match crate::syntax::pattern::parse_binding_pattern(p, ctx) {
            crate::parser::ParsedSyntax::Present(pattern) => pattern,
            crate::parser::ParsedSyntax::Absent => {
                let range = p.cur_range();
                p.error("expected a parameter", range);
                break;
            }
        };
        let default = if !rest && p.eat(T![=]) {
            Some(parse_assignment_expr(p))
        } else {
            None
        };
        params.push(Param { pattern, default, rest });
        if !p.at(T![')']) {
            p.expect(T![,]);
        }
    }
    p.expect(T![')']);
    params
}

pub fn parse_function_block_body(p: &mut Parser<impl TokenSource>) -> Vec<jsc_syntax::ast::StmtId> {
    p.expect(T!['{']);
    let body_scope = p.open_scope(ScopeKind::Block);
    let mut body = Vec::new();
    let mut in_directive_prologue = true;
    while !p.at(T!['}']) && !p.at_eof() {
        if in_directive_prologue {
            if let Some(directive) = crate::syntax::stmt::try_parse_directive(p) {
                if directive == "use strict" {
                    p.state.strict = crate::state::StrictMode::strict(
                        jsc_syntax::scope::StrictReason::UseStrictDirective,
                    );
                    p.scopes_mut().mark_strict(
                        body_scope,
                        jsc_syntax::scope::StrictReason::UseStrictDirective,
                    );
                }
                continue;
            }
            in_directive_prologue = false;
        }
        match crate::syntax::stmt::parse_statement(p) {
            crate::parser::ParsedSyntax::Present(stmt) => body.push(stmt),
            crate::parser::ParsedSyntax::Absent => {
                let range = p.cur_range();
                p.fatal_error(format!("unexpected token {:?}", p.cur()), range);
                if p.at_eof() {
                    break;
                }
                p.bump_any();
            }
        }
    }
    crate::syntax::stmt::run_var_hoisting(p, body_scope, &body);
    p.close_scope();
    p.expect(T!['}']);
    body
}

fn parse_parenthesized_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T!['(']);
    let ctx = p.context;
    p.context = ctx | ParserContext::IN;
    let expr = parse_expr(p);
    p.context = ctx;
    let close = p.cur_range();
    p.expect(T![')']);
    p.alloc_expr(start.cover(close), Expr::Paren(expr))
}

fn parse_array_literal(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T!['[']);
    let mut elements = Vec::new();
    while !p.at(T![']']) && !p.at_eof() {
        if p.at(T![,]) {
            elements.push(ArrayElement::Hole);
            p.bump_any();
            continue;
        }
        if p.eat(T![...]) {
            let expr = parse_assignment_expr(p);
            elements.push(ArrayElement::Spread(expr));
        } else {
            let expr = parse_assignment_expr(p);
            elements.push(ArrayElement::Expr(expr));
        }
        if !p.at(T![']']) {
            p.expect(T![,]);
        }
    }
    let end = p.cur_range();
    p.expect(T![']']);
    p.alloc_expr(start.cover(end), Expr::Array(elements))
}

fn parse_object_literal(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T!['{']);
    let mut properties = Vec::new();
    while !p.at(T!['}']) && !p.at_eof() {
        if p.eat(T![...]) {
            let expr = parse_assignment_expr(p);
            properties.push(jsc_syntax::ast::ObjectProperty {
                key: PropertyKey::Ident(p.intern("")),
                value: expr,
                kind: PropertyKind::Spread,
                shorthand: false,
                computed: false,
            });
        } else {
            properties.push(parse_object_property(p));
        }
        if !p.at(T!['}']) {
            p.expect(T![,]);
        }
    }
    let end = p.cur_range();
    p.expect(T!['}']);
    check_object_literal_duplicates(p, &properties, start.cover(end));
    p.alloc_expr(start.cover(end), Expr::Object(properties))
}

/// Spec §4.1 "duplicate `__proto__` in an object literal" (hard error) and
/// §7's "duplicate object key" (warning, any kind of key — getters/setters
/// are exempt since a get/set pair at the same key is the normal spelling
/// of an accessor).
fn check_object_literal_duplicates(
    p: &mut Parser<impl TokenSource>,
    properties: &[jsc_syntax::ast::ObjectProperty],
    range: TextRange,
) {
    let mut proto_count = 0u32;
    let mut seen_init: rustc_hash::FxHashSet<String> = rustc_hash::FxHashSet::default();
    for prop in properties {
        if prop.computed || !matches!(prop.kind, PropertyKind::Init) {
            continue;
        }
        let key_text = match &prop.key {
            PropertyKey::Ident(name) if !prop.shorthand => Some(p.resolve_name(*name).to_string()),
            PropertyKey::String(s) => Some(s.clone()),
            _ => None,
        };
        let Some(key_text) = key_text else { continue };
        if key_text == "__proto__" {
            proto_count += 1;
            continue;
        }
        if !seen_init.insert(key_text.clone()) {
            p.warning(format!("duplicate key '{key_text}' in object literal"), range);
        }
    }
    if proto_count > 1 {
        p.error("duplicate __proto__ fields are not allowed in object literals", range);
    }
}

fn parse_object_property(p: &mut Parser<impl TokenSource>) -> jsc_syntax::ast::ObjectProperty {
    let is_async = p.at(T![async]) && !p.nth_at(1, T![:]) && !p.nth_at(1, T![,]) && !p.nth_at(1, T!['}']) && !p.nth_at(1, T!['(']);
    if is_async {
        p.bump_any();
    }
    let is_generator = p.eat(T![*]);
    let accessor = if !is_async
        && !is_generator
        && (p.at(T![get]) || p.at(T![set]))
        && !p.nth_at(1, T![:])
        && !p.nth_at(1, T![,])
        && !p.nth_at(1, T!['}'])
        && !p.nth_at(1, T!['('])
    {
        let is_get = p.at(T![get]);
        p.bump_any();
        Some(is_get)
    } else {
        None
    };

    let (key, computed) = parse_object_key(p);

    if p.at(T!['(']) {
        let name = None;
        let function = parse_function_tail(p, name, is_async, is_generator, false);
        let kind = match accessor {
            Some(true) => PropertyKind::Get,
            Some(false) => PropertyKind::Set,
            None => PropertyKind::Method,
        };
        let range = p.cur_range();
        let value = p.alloc_expr(range, Expr::Function(Box::new(function)));
        return jsc_syntax::ast::ObjectProperty {
            key,
            value,
            kind,
            shorthand: false,
            computed,
        };
    }

    if p.eat(T![:]) {
        let value = parse_assignment_expr(p);
        return jsc_syntax::ast::ObjectProperty {
            key,
            value,
            kind: PropertyKind::Init,
            shorthand: false,
            computed,
        };
    }

    // shorthand `{ x }` / `{ x = default }` (the latter only valid once
    // reinterpreted as a destructuring pattern; kept here as an `Assign`
    // expression so object-literal-as-pattern reinterpretation handles it).
    let range = p.cur_range();
    let symbol = match &key {
        PropertyKey::Ident(name) => p.resolve_identifier(*name, range),
        _ => p.resolve_identifier(p.intern("_error_"), range),
    };
    let mut value = p.alloc_expr(range, Expr::Identifier(symbol));
    if p.eat(T![=]) {
        let default = parse_assignment_expr(p);
        value = p.alloc_expr(range, Expr::Assign { op: AssignOp::Eq, target: value, value: default });
    }
    jsc_syntax::ast::ObjectProperty {
        key,
        value,
        kind: PropertyKind::Init,
        shorthand: true,
        computed,
    }
}

pub(crate) fn parse_object_key(p: &mut Parser<impl TokenSource>) -> (PropertyKey, bool) {
    if p.eat(T!['[']) {
        let expr = parse_assignment_expr(p);
        p.expect(T![']']);
        return (PropertyKey::Computed(expr), true);
    }
    match p.cur() {
        SyntaxKind::STRING => {
            let value = match p.peek_current_payload() {
                TokenPayload::String { value, .. } => value.clone(),
                _ => String::new(),
            };
            p.bump_any();
            (PropertyKey::String(value), false)
        }
        SyntaxKind::NUMBER => {
            let value = match p.peek_current_payload() {
                TokenPayload::Number(n) => *n,
                _ => f64::NAN,
            };
            p.bump_any();
            (PropertyKey::Number(value), false)
        }
        SyntaxKind::PRIVATE_NAME => {
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            (PropertyKey::PrivateName(name), false)
        }
        _ => {
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            (PropertyKey::Ident(name), false)
        }
    }
}

pub fn parse_template_literal(p: &mut Parser<impl TokenSource>) -> TemplateLiteral {
    let mut parts = Vec::new();
    let mut exprs = Vec::new();
    let range = p.cur_range();
    let (cooked, raw, is_tail) = match p.peek_current_payload() {
        TokenPayload::Template { cooked, raw } => (cooked.clone(), raw.clone(), p.at(SyntaxKind::NO_SUBSTITUTION_TEMPLATE)),
        _ => (None, String::new(), true),
    };
    parts.push(TemplatePart { cooked, raw, range });
    p.bump_any();
    if is_tail {
        return TemplateLiteral { parts, exprs };
    }
    loop {
        let expr = parse_expr(p);
        exprs.push(expr);
        p.relex(crate::token_source::ReLexContext::TemplateTail);
        let range = p.cur_range();
        let (cooked, raw, is_tail) = match p.peek_current_payload() {
            TokenPayload::Template { cooked, raw } => (cooked.clone(), raw.clone(), p.at(SyntaxKind::TEMPLATE_TAIL)),
            _ => (None, String::new(), true),
        };
        parts.push(TemplatePart { cooked, raw, range });
        p.bump_any();
        if is_tail {
            break;
        }
    }
    TemplateLiteral { parts, exprs }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use jsc_syntax::ast::{BinaryOp, ChainLinkPosition, Expr, Stmt};

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    fn first_expr(result: &crate::ParseResult) -> &Expr {
        let stmt = result.arena.stmt(result.body[0]);
        match &stmt.kind {
            Stmt::Expr(id) => &result.arena.expr(*id).kind,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn unparenthesized_unary_left_of_exponent_is_an_error() {
        let result = parse("-x ** 2;");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn parenthesized_unary_left_of_exponent_is_fine() {
        let result = parse("(-x) ** 2;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn await_left_of_exponent_is_also_restricted() {
        let result = parse("async function f() { return (await x) ** 2; }");
        assert!(!result.diagnostics.has_errors());
        let result = parse("async function f() { return await x ** 2; }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn tagged_template_on_an_optional_chain_is_an_error() {
        let result = parse("a?.b`c`;");
        assert!(result.diagnostics.has_errors());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("optional chain")));
    }

    #[test]
    fn tagged_template_on_a_plain_chain_is_fine() {
        let result = parse("a.b`c`;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn arrow_with_single_identifier_param_reinterprets_cleanly() {
        let result = parse("const f = x => x + 1;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn parenthesized_expr_followed_by_arrow_becomes_a_param_list() {
        let result = parse("const f = (a, b) => a + b;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn grouped_expression_without_arrow_stays_a_parenthesized_expr() {
        let result = parse("(a, b);");
        assert!(!result.diagnostics.has_errors());
        assert!(matches!(first_expr(&result), Expr::Paren(_)));
    }

    #[test]
    fn async_prefix_with_line_break_before_identifier_disables_arrow() {
        let result = parse("async\nx => {};");
        // Not an arrow: `async` parses as a bare identifier expression
        // statement, then `x => {}` is a second statement.
        assert_eq!(result.body.len(), 2);
    }

    #[test]
    fn slash_after_identifier_is_division_not_regex() {
        let result = parse("a / b;");
        assert!(!result.diagnostics.has_errors());
        assert!(matches!(
            first_expr(&result),
            Expr::Binary { op: BinaryOp::Div, .. }
        ));
    }

    #[test]
    fn slash_in_primary_position_is_a_regex_literal() {
        let result = parse("x = /abc/g;");
        assert!(!result.diagnostics.has_errors());
        assert!(matches!(first_expr(&result), Expr::Assign { .. }));
    }

    #[test]
    fn optional_chain_links_are_flagged_chain_start_and_continue() {
        let result = parse("a?.b.c;");
        let Expr::Member { chain, .. } = first_expr(&result) else {
            panic!("expected a member expression");
        };
        assert!(matches!(chain, ChainLinkPosition::ChainContinue));
    }

    #[test]
    fn object_literal_as_assignment_target_rejects_a_method_shorthand() {
        let result = parse("({ foo() {} } = x);");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn duplicate_proto_keys_in_an_object_literal_is_an_error() {
        let result = parse("x = { __proto__: 1, __proto__: 2 };");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn getter_named_proto_does_not_collide_with_a_value_proto() {
        let result = parse("x = { get __proto__() { return 1; }, __proto__: 2 };");
        assert!(!result.diagnostics.has_errors());
    }
}

