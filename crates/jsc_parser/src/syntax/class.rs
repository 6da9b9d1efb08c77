//! Class declarations/expressions, including private-name members. Follows
//! the same per-production shape as `syntax::expr`'s object-literal member
//! parsing (`parse_object_property`), generalized for
//! `static`/`accessor`/private-name members and the constructor/`extends`
//! machinery object literals don't have.

use crate::parser::{ParsedSyntax, Parser};
use crate::state::ParserContext;
use crate::token_source::TokenSource;
use crate::T;
use jsc_rowan::{Name, TextRange};
use jsc_syntax::ast::{
    ClassBody, ClassExpr, ClassMember, ClassMemberKind, Expr, ExprId, Param, PropertyKey, Stmt,
    StmtId,
};
use jsc_syntax::scope::{ScopeKind, StrictReason};
use jsc_syntax::symbol::SymbolKind;
use jsc_syntax::SyntaxKind;

pub fn parse_class_decl(p: &mut Parser<impl TokenSource>) -> StmtId {
    let start = p.cur_range();
    p.bump(T![class]);
    let name = match parse_class_name(p) {
        Some((name, range)) => Some(p.declare(p.current_scope(), name, SymbolKind::Class, range, false)),
        None => {
            p.error("class declarations require a name", start);
            None
        }
    };
    let body = parse_class_tail(p);
    let end = p.cur_range();
    p.alloc_stmt(
        start.cover(end),
        Stmt::ClassDecl { class: Box::new(ClassExpr { name, body }) },
    )
}

pub fn parse_class_expr(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    p.bump(T![class]);
    // Unlike a declaration, a class expression's name (if any) is only
    // really visible inside its own body; we declare it into the enclosing
    // scope anyway, the same simplification `parse_function_expr` already
    // makes for named function expressions.
    let name = parse_class_name(p)
        .map(|(name, range)| p.declare(p.current_scope(), name, SymbolKind::Class, range, false));
    let body = parse_class_tail(p);
    let end = p.cur_range();
    p.alloc_expr(start.cover(end), Expr::Class(Box::new(ClassExpr { name, body })))
}

fn parse_class_name(p: &mut Parser<impl TokenSource>) -> Option<(Name, TextRange)> {
    if p.at(SyntaxKind::IDENT) || p.cur().is_contextual_keyword() {
        let range = p.cur_range();
        let text = p.cur_text().to_string();
        p.bump_any();
        Some((p.intern(&text), range))
    } else {
        None
    }
}

/// Parses the `extends` clause and `{ ... }` body shared by class
/// declarations and expressions. Class bodies are always strict (spec
/// §4.2 "Strict mode and module mode": "a class body is strict regardless
/// of what encloses it").
fn parse_class_tail(p: &mut Parser<impl TokenSource>) -> ClassBody {
    let superclass = if p.eat(T![extends]) {
        Some(crate::syntax::expr::parse_lhs_expr(p))
    } else {
        None
    };
    let is_derived = superclass.is_some();

    let class_scope = p.open_scope(ScopeKind::Class);
    p.scopes_mut().mark_strict(class_scope, StrictReason::ClassBody);

    let prescanned_private_names = prescan_private_names(p);
    p.push_private_name_scope(prescanned_private_names);

    p.expect(T!['{']);
    let mut members = Vec::new();
    let mut constructor = None;
    while !p.at(T!['}']) && !p.at_eof() {
        if p.eat(T![;]) {
            continue;
        }
        let (member, is_ctor) = parse_class_member(p, is_derived);
        if is_ctor {
            if constructor.is_some() {
                p.error("a class may only have one constructor", member.range);
            } else {
                constructor = Some(members.len());
            }
        }
        members.push(member);
    }
    p.expect(T!['}']);

    p.pop_private_name_scope();
    p.close_scope();

    ClassBody { members, constructor, superclass }
}

/// A raw-token lookahead over the whole class body, run before any member
/// is actually parsed, collecting every `#name` spelling it sees. Ordinary
/// scope resolution (`Parser::resolve_private_name`) handles a `#field`
/// reference that comes textually *after* its declaration for free; this
/// covers the forward-reference case JS also allows (spec's private-name
/// declarations are not temporally ordered the way `let`/`const` are).
///
/// Brace-depth tracking here doesn't know about template-literal
/// interpolations: a `}` that closes a `${...}` is indistinguishable from
/// an ordinary `}` token at this raw-scan level, so a private name used
/// only after a template literal inside the same body can be missed. Rare
/// in practice, and the fallback failure mode is a spurious "not defined"
/// diagnostic rather than a panic or a wrong program, so it isn't worth a
/// template-aware scanner here.
fn prescan_private_names(
    p: &mut Parser<impl TokenSource>,
) -> rustc_hash::FxHashMap<Name, TextRange> {
    let mut names = rustc_hash::FxHashMap::default();
    if !p.at(T!['{']) {
        return names;
    }
    let checkpoint = p.checkpoint();
    p.bump_any();
    let mut depth: u32 = 1;
    while depth > 0 && !p.at_eof() {
        match p.cur() {
            SyntaxKind::L_CURLY => depth += 1,
            SyntaxKind::R_CURLY => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            SyntaxKind::PRIVATE_NAME => {
                let range = p.cur_range();
                let text = p.cur_text().to_string();
                let name = p.intern(&text);
                names.entry(name).or_insert(range);
            }
            _ => {}
        }
        p.bump_any();
    }
    p.rewind(checkpoint);
    names
}

/// Parses one class element, returning whether it's the constructor (the
/// caller enforces the ≤1 constructor invariant, since that needs to see
/// every sibling member too).
fn parse_class_member(
    p: &mut Parser<impl TokenSource>,
    is_derived_class: bool,
) -> (ClassMember, bool) {
    let start = p.cur_range();

    let is_static = p.at(T![static]) && !ends_member_key(p.nth(1));
    if is_static {
        p.bump_any();
    }
    if is_static && p.at(T!['{']) {
        return (parse_static_init_block(p, start), false);
    }

    let is_accessor_field = p.at(T![accessor]) && !ends_member_key(p.nth(1));
    if is_accessor_field {
        p.bump_any();
    }

    let is_async = !is_accessor_field && p.at(T![async]) && !ends_member_key(p.nth(1));
    if is_async {
        p.bump_any();
    }

    let is_generator = !is_accessor_field && p.eat(T![*]);

    let accessor_kind = if !is_accessor_field
        && !is_async
        && !is_generator
        && (p.at(T![get]) || p.at(T![set]))
        && !ends_member_key(p.nth(1))
    {
        let is_get = p.at(T![get]);
        p.bump_any();
        Some(is_get)
    } else {
        None
    };

    let key_range = p.cur_range();
    let (key, computed) = crate::syntax::expr::parse_object_key(p);
    check_forbidden_member_name(
        p,
        &key,
        computed,
        is_static,
        is_async,
        is_generator,
        accessor_kind,
        is_accessor_field,
        key_range,
    );

    if p.at(T!['(']) {
        let is_plain_method =
            !is_async && !is_generator && accessor_kind.is_none() && !is_accessor_field;
        let is_ctor = is_plain_method
            && !is_static
            && !computed
            && matches!(&key, PropertyKey::Ident(name) if p.resolve_name(*name) == "constructor");

        if let PropertyKey::PrivateName(name) = &key {
            let kind = private_symbol_kind(is_static, accessor_kind, true);
            p.declare(p.current_scope(), *name, kind, key_range, false);
        }

        let (params, body) = parse_method_body(p, is_async, is_generator, is_ctor && is_derived_class);
        let kind = match accessor_kind {
            Some(true) => ClassMemberKind::Get,
            Some(false) => ClassMemberKind::Set,
            None => ClassMemberKind::Method,
        };
        if kind == ClassMemberKind::Get && !params.is_empty() {
            p.error("a getter must not have any parameters", key_range);
        }
        if kind == ClassMemberKind::Set
            && (params.len() != 1 || params.first().is_some_and(|param| param.rest))
        {
            p.error("a setter must have exactly one non-rest parameter", key_range);
        }
        let end = p.cur_range();
        let member = ClassMember {
            key,
            kind,
            is_static,
            is_accessor_field: false,
            computed,
            value: None,
            params,
            body: Some(body),
            range: start.cover(end),
        };
        return (member, is_ctor);
    }

    if let PropertyKey::PrivateName(name) = &key {
        let kind = private_symbol_kind(is_static, accessor_kind, false);
        p.declare(p.current_scope(), *name, kind, key_range, false);
    }

    let value = if p.eat(T![=]) {
        let saved_ctx = p.context;
        p.context = p.context.for_function_body(false, false) | ParserContext::IN_CLASS;
        let init = crate::syntax::expr::parse_assignment_expr(p);
        p.context = saved_ctx;
        Some(init)
    } else {
        None
    };
    let end = p.cur_range();
    p.expect_semi();
    let member = ClassMember {
        key,
        kind: ClassMemberKind::Field,
        is_static,
        is_accessor_field,
        computed,
        value,
        params: Vec::new(),
        body: None,
        range: start.cover(end),
    };
    (member, false)
}

/// Whether `kind` immediately following a modifier keyword (`static`,
/// `accessor`, `async`, `get`, `set`) means the keyword is actually that
/// member's own name rather than a modifier — `static() {}`, `static = 1`,
/// `static;`, and a bare `static }` (trailing member) all name a member
/// literally called `static`.
fn ends_member_key(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::L_PAREN | SyntaxKind::EQ | SyntaxKind::SEMICOLON | SyntaxKind::R_CURLY
    )
}

#[allow(clippy::too_many_arguments)]
fn check_forbidden_member_name(
    p: &mut Parser<impl TokenSource>,
    key: &PropertyKey,
    computed: bool,
    is_static: bool,
    is_async: bool,
    is_generator: bool,
    accessor_kind: Option<bool>,
    is_accessor_field: bool,
    range: TextRange,
) {
    if computed {
        return;
    }
    match key {
        PropertyKey::Ident(name) => {
            let text = p.resolve_name(*name).to_string();
            if text == "constructor" {
                let is_plain_instance_method_shape =
                    !is_static && !is_async && !is_generator && accessor_kind.is_none() && !is_accessor_field;
                if !is_plain_instance_method_shape {
                    p.error(
                        "classes may not have a member named 'constructor' other than the constructor method",
                        range,
                    );
                }
            } else if is_static && text == "prototype" {
                p.error("classes may not have a static property named 'prototype'", range);
            }
        }
        PropertyKey::String(s) if is_static && s == "prototype" => {
            p.error("classes may not have a static property named 'prototype'", range);
        }
        PropertyKey::PrivateName(name) => {
            if p.resolve_name(*name) == "#constructor" {
                p.error("classes may not have a private member named '#constructor'", range);
            }
        }
        _ => {}
    }
}

fn private_symbol_kind(is_static: bool, accessor_kind: Option<bool>, is_method: bool) -> SymbolKind {
    match (is_static, accessor_kind, is_method) {
        (false, Some(true), _) => SymbolKind::PrivateGetter,
        (false, Some(false), _) => SymbolKind::PrivateSetter,
        (true, Some(true), _) => SymbolKind::PrivateStaticGetter,
        (true, Some(false), _) => SymbolKind::PrivateStaticSetter,
        (false, None, true) => SymbolKind::PrivateMethod,
        (true, None, true) => SymbolKind::PrivateStaticMethod,
        (false, None, false) => SymbolKind::PrivateField,
        (true, None, false) => SymbolKind::PrivateStaticField,
    }
}

/// A method/getter/setter/constructor body. Unlike `expr::parse_function_tail`
/// this doesn't build a [`jsc_syntax::ast::Function`] — `ClassMember` stores
/// `params`/`body` directly — but it needs its own context wiring:
/// `for_function_body` clears `IN_CLASS`/`DERIVED_CONSTRUCTOR` (it's built
/// for plain functions, which never see either), so this restores them
/// around the params/body parse.
fn parse_method_body(
    p: &mut Parser<impl TokenSource>,
    is_async: bool,
    is_generator: bool,
    is_derived_constructor: bool,
) -> (Vec<Param>, Vec<StmtId>) {
    p.open_scope(ScopeKind::FunctionArgs);
    let saved_ctx = p.context;
    let mut ctx = p.context.for_function_body(is_async, is_generator);
    ctx |= ParserContext::IN_CLASS;
    if is_derived_constructor {
        ctx |= ParserContext::DERIVED_CONSTRUCTOR;
    }
    p.context = ctx;
    let params = crate::syntax::expr::parse_function_params(p);
    let body = crate::syntax::expr::parse_function_block_body(p);
    p.context = saved_ctx;
    p.close_scope();
    (params, body)
}

fn parse_static_init_block(p: &mut Parser<impl TokenSource>, start: TextRange) -> ClassMember {
    let scope = p.open_scope(ScopeKind::ClassStaticInit);
    let saved_ctx = p.context;
    p.context = (p.context & ParserContext::MODULE) | ParserContext::IN | ParserContext::IN_CLASS;

    p.expect(T!['{']);
    let mut body = Vec::new();
    while !p.at(T!['}']) && !p.at_eof() {
        match crate::syntax::stmt::parse_statement(p) {
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
    crate::syntax::stmt::run_var_hoisting(p, scope, &body);
    p.close_scope();
    let end = p.cur_range();
    p.expect(T!['}']);
    p.context = saved_ctx;

    ClassMember {
        key: PropertyKey::Ident(p.intern("")),
        kind: ClassMemberKind::StaticInit,
        is_static: true,
        is_accessor_field: false,
        computed: false,
        value: None,
        params: Vec::new(),
        body: Some(body),
        range: start.cover(end),
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    #[test]
    fn parses_fields_methods_and_accessors() {
        let result = parse(
            "class Point { x = 0; #y = 0; static origin = null; get magnitude() { return 0; } set magnitude(v) {} constructor(x) { this.x = x; } }",
        );
        assert!(!result.had_fatal_error);
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn private_name_forward_reference_resolves() {
        let result = parse("class C { useIt() { return this.#x; } #x = 1; }");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn duplicate_constructor_is_an_error() {
        let result = parse("class C { constructor() {} constructor() {} }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn static_prototype_member_is_rejected() {
        let result = parse("class C { static prototype = 1; }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn derived_class_allows_super_call_in_constructor() {
        let result = parse("class A {} class B extends A { constructor() { super(); } }");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn super_call_outside_derived_constructor_is_rejected() {
        let result = parse("class A { constructor() { super(); } }");
        assert!(result.diagnostics.has_errors());
    }
}
