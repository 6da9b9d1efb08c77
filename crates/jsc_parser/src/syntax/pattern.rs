//! Binding patterns and their reinterpretation from arbitrary expressions:
//! arrow function parameter lists and the object/array literal vs.
//! destructuring assignment target ambiguity. Builds typed [`Pattern`] nodes
//! directly instead of going through CST events.

use crate::parser::{ParsedSyntax, Parser};
use crate::token_source::TokenSource;
use crate::T;
use jsc_syntax::ast::{ArrayPattern, Expr, ObjectPattern, ObjectPatternProp, Pattern, PropertyKey};
use jsc_syntax::scope::ScopeId;
use jsc_syntax::symbol::SymbolKind;
use jsc_syntax::token::TokenPayload;
use jsc_syntax::SyntaxKind;

/// Which scope/kind a freshly-parsed binding pattern's leaves declare into.
/// `None` means "this is an assignment target, not a declaration" — leaves
/// resolve existing bindings via [`Parser::resolve_identifier`] instead.
#[derive(Debug, Clone, Copy)]
pub struct BindingContext {
    pub scope: ScopeId,
    pub kind: SymbolKind,
    pub hoisted: bool,
}

impl BindingContext {
    pub fn declaring(scope: ScopeId, kind: SymbolKind, hoisted: bool) -> Self {
        Self { scope, kind, hoisted }
    }
}

pub fn parse_binding_pattern(
    p: &mut Parser<impl TokenSource>,
    ctx: BindingContext,
) -> ParsedSyntax<Pattern> {
    let cur = p.cur();
    if cur == SyntaxKind::IDENT || cur.is_contextual_keyword() {
        return parse_binding_ident(p, ctx);
    }
    match cur {
        SyntaxKind::L_BRACK => ParsedSyntax::Present(parse_array_pattern(p, Some(ctx))),
        SyntaxKind::L_CURLY => ParsedSyntax::Present(parse_object_pattern(p, Some(ctx))),
        _ => ParsedSyntax::Absent,
    }
}

fn parse_binding_ident(p: &mut Parser<impl TokenSource>, ctx: BindingContext) -> ParsedSyntax<Pattern> {
    if p.cur() != SyntaxKind::IDENT && !p.cur().is_contextual_keyword() {
        return ParsedSyntax::Absent;
    }
    let range = p.cur_range();
    let text = p.cur_text().to_string();
    p.bump_any();
    let name = p.intern(&text);
    let symbol = p.declare(ctx.scope, name, ctx.kind, range, ctx.hoisted);
    ParsedSyntax::Present(Pattern::Ident(symbol))
}

/// Parses `[a, , ...rest]`; `None` slots are elisions (array pattern
/// holes). When `ctx` is `None`, this is being parsed as an
/// assignment-pattern reinterpretation of an array literal and inner
/// identifiers resolve rather than declare.
pub fn parse_array_pattern(
    p: &mut Parser<impl TokenSource>,
    ctx: Option<BindingContext>,
) -> Pattern {
    p.expect(T!['[']);
    let mut elements = Vec::new();
    let mut rest = None;
    while !p.at(T![']']) && !p.at_eof() {
        if p.at(T![,]) {
            elements.push(None);
            p.bump_any();
            continue;
        }
        if p.at(T![...]) {
            p.bump_any();
            let inner = parse_pattern_element(p, ctx);
            rest = Some(Box::new(inner));
            break;
        }
        let element = parse_pattern_element(p, ctx);
        elements.push(Some(element));
        if !p.at(T![']']) {
            p.expect(T![,]);
        }
    }
    p.expect(T![']']);
    Pattern::Array(ArrayPattern { elements, rest })
}

/// Parses `{a, b: c, ...rest}`; shares the ident-vs-assignment-pattern
/// duality with [`parse_array_pattern`] through `ctx`.
pub fn parse_object_pattern(
    p: &mut Parser<impl TokenSource>,
    ctx: Option<BindingContext>,
) -> Pattern {
    p.expect(T!['{']);
    let mut props = Vec::new();
    let mut rest = None;
    while !p.at(T!['}']) && !p.at_eof() {
        if p.at(T![...]) {
            p.bump_any();
            let inner = parse_pattern_element(p, ctx);
            rest = Some(Box::new(inner));
            break;
        }
        let key_range = p.cur_range();
        let (key, computed) = parse_property_key(p);
        let shorthand = !p.at(T![:]);
        let value = if shorthand {
            match &key {
                PropertyKey::Ident(name) => {
                    let name = *name;
                    match ctx {
                        Some(binding_ctx) => {
                            let symbol = p.declare(
                                binding_ctx.scope,
                                name,
                                binding_ctx.kind,
                                key_range,
                                binding_ctx.hoisted,
                            );
                            Pattern::Ident(symbol)
                        }
                        None => Pattern::Ident(p.resolve_identifier(name, key_range)),
                    }
                }
                _ => {
                    let range = p.cur_range();
                    p.error("shorthand property must be a plain identifier", range);
                    let placeholder = p.intern("_error_");
                    Pattern::Ident(p.resolve_identifier(placeholder, range))
                }
            }
        } else {
            p.bump(T![:]);
            parse_pattern_element(p, ctx)
        };
        let value = if p.eat(T![=]) {
            let default = crate::syntax::expr::parse_assignment_expr(p);
            Pattern::Assign(Box::new(value), default)
        } else {
            value
        };
        props.push(ObjectPatternProp {
            key,
            value,
            computed,
            shorthand,
        });
        if !p.at(T!['}']) {
            p.expect(T![,]);
        }
    }
    p.expect(T!['}']);
    Pattern::Object(ObjectPattern { props, rest })
}

fn parse_pattern_element(p: &mut Parser<impl TokenSource>, ctx: Option<BindingContext>) -> Pattern {
    let base = match ctx {
        Some(binding_ctx) => match parse_binding_pattern(p, binding_ctx) {
            ParsedSyntax::Present(pattern) => pattern,
            ParsedSyntax::Absent => {
                let range = p.cur_range();
                p.error("expected a binding pattern", range);
                let placeholder = p.intern("_error_");
                Pattern::Ident(p.resolve_identifier(placeholder, range))
            }
        },
        None => parse_assignment_target(p),
    };
    if ctx.is_some() && p.eat(T![=]) {
        let default = crate::syntax::expr::parse_assignment_expr(p);
        Pattern::Assign(Box::new(base), default)
    } else {
        base
    }
}

/// Parses one destructuring-assignment target (not a declaration): a
/// plain identifier resolves against the existing scope chain, `[`/`{`
/// recurse as nested assignment patterns.
pub fn parse_assignment_target(p: &mut Parser<impl TokenSource>) -> Pattern {
    match p.cur() {
        SyntaxKind::L_BRACK => parse_array_pattern(p, None),
        SyntaxKind::L_CURLY => parse_object_pattern(p, None),
        SyntaxKind::IDENT => {
            let range = p.cur_range();
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            Pattern::Ident(p.resolve_identifier(name, range))
        }
        _ => {
            let expr = crate::syntax::expr::parse_unary_expr(p);
            Pattern::Expr(expr)
        }
    }
}

fn parse_property_key(p: &mut Parser<impl TokenSource>) -> (PropertyKey, bool) {
    if p.eat(T!['[']) {
        let expr = crate::syntax::expr::parse_assignment_expr(p);
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
        _ => {
            let text = p.cur_text().to_string();
            p.bump_any();
            let name = p.intern(&text);
            (PropertyKey::Ident(name), false)
        }
    }
}

/// Reinterprets an already-parsed expression tree as a destructuring
/// pattern: an object/array literal parsed as an expression gets
/// reinterpreted as a pattern once `=` confirms assignment context, or once
/// `=>` confirms an arrow parameter list. Only `Identifier`, `Array`, and
/// `Object` expression shapes reinterpret cleanly; anything else becomes
/// `Pattern::Expr` so the validator can still point at the exact offending
/// subexpression.
pub fn reinterpret_expr_as_pattern(
    p: &mut Parser<impl TokenSource>,
    expr: jsc_syntax::ast::ExprId,
) -> Pattern {
    let node = p.arena().expr(expr).clone();
    match node.kind {
        Expr::Identifier(symbol) => Pattern::Ident(symbol),
        Expr::Member { .. } => Pattern::Expr(expr),
        Expr::Paren(inner) => reinterpret_expr_as_pattern(p, inner),
        Expr::Assign {
            op: jsc_syntax::ast::AssignOp::Eq,
            target,
            value,
        } => Pattern::Assign(Box::new(reinterpret_expr_as_pattern(p, target)), value),
        Expr::Array(elements) => {
            let mut out = Vec::new();
            let mut rest = None;
            for element in elements {
                match element {
                    jsc_syntax::ast::ArrayElement::Hole => out.push(None),
                    jsc_syntax::ast::ArrayElement::Expr(e) => {
                        out.push(Some(reinterpret_expr_as_pattern(p, e)))
                    }
                    jsc_syntax::ast::ArrayElement::Spread(e) => {
                        rest = Some(Box::new(reinterpret_expr_as_pattern(p, e)));
                    }
                }
            }
            Pattern::Array(ArrayPattern { elements: out, rest })
        }
        Expr::Object(properties) => {
            let mut props = Vec::new();
            let mut rest = None;
            for property in properties {
                if matches!(property.kind, jsc_syntax::ast::PropertyKind::Spread) {
                    rest = Some(Box::new(reinterpret_expr_as_pattern(p, property.value)));
                    continue;
                }
                if !matches!(property.kind, jsc_syntax::ast::PropertyKind::Init) {
                    p.error(
                        "methods, getters, and setters cannot be destructuring targets",
                        node.range,
                    );
                    props.push(ObjectPatternProp {
                        key: property.key,
                        value: Pattern::Expr(property.value),
                        computed: property.computed,
                        shorthand: property.shorthand,
                    });
                    continue;
                }
                props.push(ObjectPatternProp {
                    key: property.key,
                    value: reinterpret_expr_as_pattern(p, property.value),
                    computed: property.computed,
                    shorthand: property.shorthand,
                });
            }
            Pattern::Object(ObjectPattern { props, rest })
        }
        _ => {
            p.error("invalid assignment target", node.range);
            Pattern::Expr(expr)
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
    fn array_destructuring_assignment_is_fine() {
        let result = parse("[a, b] = [1, 2];");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn object_destructuring_assignment_with_defaults_is_fine() {
        let result = parse("({ a = 1, b: c } = obj);");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn member_expression_is_a_valid_assignment_target() {
        let result = parse("obj.prop = 1;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn numeric_literal_property_value_is_an_invalid_target() {
        let result = parse("({ x: 0 } = y);");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn assigning_to_a_call_expression_is_an_error() {
        let result = parse("f() = 1;");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn trailing_rest_in_array_pattern_is_accepted() {
        let result = parse("const [a, ...rest] = [1, 2, 3];");
        assert!(!result.diagnostics.has_errors());
    }
}
