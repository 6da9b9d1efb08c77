//! JSX elements and fragments, enabled only under the `jsx`/`tsx` loaders.
//! Grounded on the same relex-on-demand shape
//! `syntax::expr`'s template-literal parsing uses for `TemplateTail`: the
//! lexer's ordinary token stream can't express "run of text up to `<`/`{`",
//! so the parser asks it to re-scan under [`ReLexContext::JsxChild`] once it
//! knows it's in a child position.

use crate::parser::Parser;
use crate::token_source::{ReLexContext, TokenSource};
use crate::T;
use jsc_syntax::ast::{Expr, ExprId, JsxAttribute, JsxAttributeValue, JsxChild, JsxElement};
use jsc_syntax::SyntaxKind;

/// `<name.path.of.dotted.members>` or a plain identifier. JSX intentionally
/// does not resolve this against lexical scope: a tag
/// name is either a host element (lowercase, untyped) or a capitalized
/// component reference whose binding the printer/lowerer never needs.
fn parse_jsx_name(p: &mut Parser<impl TokenSource>) -> String {
    let mut name = p.cur_text().to_string();
    p.bump_any();
    while p.at(T![.]) || p.at(T![:]) || p.at(T![-]) {
        name.push_str(p.cur_text());
        p.bump_any();
        name.push_str(p.cur_text());
        p.bump_any();
    }
    name
}

fn parse_jsx_attributes(p: &mut Parser<impl TokenSource>) -> Vec<JsxAttribute> {
    let mut attributes = Vec::new();
    while !p.at(T![>]) && !p.at(T![/]) && !p.at_eof() {
        if p.eat(T!['{']) {
            p.expect(T![...]);
            let value = crate::syntax::expr::parse_assignment_expr(p);
            p.expect(T!['}']);
            attributes.push(JsxAttribute { name: String::new(), value: Some(JsxAttributeValue::Spread(value)) });
            continue;
        }
        let name = parse_jsx_name(p);
        let value = if p.eat(T![=]) {
            if p.at(SyntaxKind::STRING) {
                let text = p.cur_text().to_string();
                p.bump_any();
                Some(JsxAttributeValue::String(text))
            } else if p.eat(T!['{']) {
                let expr = crate::syntax::expr::parse_assignment_expr(p);
                p.expect(T!['}']);
                Some(JsxAttributeValue::Expr(expr))
            } else {
                let range = p.cur_range();
                p.error("expected a JSX attribute value", range);
                None
            }
        } else {
            None
        };
        attributes.push(JsxAttribute { name, value });
    }
    attributes
}

fn parse_jsx_children(p: &mut Parser<impl TokenSource>) -> Vec<JsxChild> {
    let mut children = Vec::new();
    loop {
        // The relexed token is always JSX_TEXT, even when empty (the scan
        // stops immediately at a delimiter byte) — bumping past it unmasks
        // the real `<`/`{`/`}`/EOF token underneath without relexing again,
        // so each iteration relexes exactly once.
        p.relex(ReLexContext::JsxChild);
        let text = p.cur_text().to_string();
        p.bump_any();
        if !text.is_empty() {
            children.push(JsxChild::Text(text));
        }
        if p.at(T![<]) {
            if p.nth_at(1, T![/]) {
                break;
            }
            children.push(JsxChild::Element(Box::new(parse_jsx_tag(p))));
            continue;
        }
        if p.eat(T!['{']) {
            if p.eat(T![...]) {
                let expr = crate::syntax::expr::parse_assignment_expr(p);
                p.expect(T!['}']);
                children.push(JsxChild::Spread(expr));
                continue;
            }
            if p.at(T!['}']) {
                // `{}` and `{/* comment */}` are legal empty expression
                // containers; comments are discarded by the lexer so the
                // two are indistinguishable here since the lexer never
                // preserves comment text.
                p.bump_any();
                children.push(JsxChild::Expr(None));
                continue;
            }
            let expr = crate::syntax::expr::parse_assignment_expr(p);
            p.expect(T!['}']);
            children.push(JsxChild::Expr(Some(expr)));
            continue;
        }
        if p.at_eof() {
            let range = p.cur_range();
            p.error("unterminated JSX element", range);
            break;
        }
        // A stray `}` in text position: the relex already stopped the text
        // run here, so warn and keep it as a text child rather than
        // dropping it — `<a>{1}}</a>` has children `[1, "}"]`.
        let range = p.cur_range();
        p.warning("unexpected '}' in JSX text; did you mean '&#125;'?", range);
        children.push(JsxChild::Text("}".to_string()));
        p.bump_any();
    }
    children
}

fn parse_jsx_tag(p: &mut Parser<impl TokenSource>) -> JsxElement {
    let start = p.cur_range();
    p.bump(T![<]);

    if p.at(T![>]) {
        p.bump_any();
        let children = parse_jsx_children(p);
        p.bump(T![<]);
        p.expect(T![/]);
        p.expect(T![>]);
        return JsxElement { name: None, attributes: Vec::new(), children, self_closing: false };
    }

    let name = parse_jsx_name(p);
    let attributes = parse_jsx_attributes(p);

    if p.eat(T![/]) {
        p.expect(T![>]);
        return JsxElement { name: Some(name), attributes, children: Vec::new(), self_closing: true };
    }
    p.expect(T![>]);
    let children = parse_jsx_children(p);
    p.bump(T![<]);
    p.expect(T![/]);
    if !p.at(T![>]) {
        let closing = parse_jsx_name(p);
        if closing != name {
            p.error(
                format!("mismatched JSX closing tag: expected '{name}', found '{closing}'"),
                start,
            );
        }
    }
    p.expect(T![>]);
    JsxElement { name: Some(name), attributes, children, self_closing: false }
}

pub fn parse_jsx_element(p: &mut Parser<impl TokenSource>) -> ExprId {
    let start = p.cur_range();
    let element = parse_jsx_tag(p);
    let end = p.cur_range();
    p.alloc_expr(start.cover(end), Expr::Jsx(Box::new(element)))
}

#[cfg(test)]
mod tests {
    use crate::options::{Loader, ParseOptions};
    use jsc_syntax::ast::{Expr, JsxChild, Stmt};

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions { loader: Loader::Jsx, ..ParseOptions::default() })
    }

    #[test]
    fn self_closing_element_with_attributes() {
        let result = parse("const el = <Foo bar=\"baz\" qux={1} />;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn fragment_with_text_and_expression_children() {
        let result = parse("const el = <>hello {name}</>;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn nested_elements_with_spread_attribute_and_child() {
        let result = parse("const el = <div {...props}><span>{...items}</span></div>;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn mismatched_closing_tag_is_an_error() {
        let result = parse("const el = <div></span>;");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn jsx_pragma_comments_override_default_factory_and_runtime() {
        let src = "// @jsx h\n// @jsxFrag Fragment\n// @jsxRuntime automatic\nconst el = <div />;";
        let result = crate::parse(
            src,
            ParseOptions { loader: Loader::Jsx, ..ParseOptions::default() },
        );
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn jsx_import_source_with_classic_runtime_warns_but_still_parses() {
        let src = "// @jsxImportSource preact\nconst el = <div />;";
        let result = crate::parse(
            src,
            ParseOptions { loader: Loader::Jsx, ..ParseOptions::default() },
        );
        assert!(!result.diagnostics.has_errors());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("classic JSX runtime")));
    }

    #[test]
    fn stray_closing_brace_in_text_becomes_a_text_child_with_a_warning() {
        let result = parse("const el = <a>{1}}</a>;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unexpected '}' in JSX text")));

        let Stmt::VarDecl { declarations, .. } = &result.arena.stmt(result.body[0]).kind else {
            panic!("expected a variable declaration");
        };
        let init = declarations[0].init.expect("expected an initializer");
        let Expr::Jsx(element) = &result.arena.expr(init).kind else {
            panic!("expected a JSX element initializer");
        };
        assert!(matches!(element.children[0], JsxChild::Expr(Some(_))));
        match &element.children[1] {
            JsxChild::Text(text) => assert_eq!(text, "}"),
            other => panic!("expected a text child for the stray '}}', got {other:?}"),
        }
        assert_eq!(element.children.len(), 2);
    }

    #[test]
    fn jsx_pragmas_are_ignored_under_the_plain_js_loader() {
        // No JSX grammar is enabled, so the `<div/>` text is never reached,
        // but the pragma scan itself must not fire (and must not panic)
        // when `loader` doesn't enable JSX.
        let src = "// @jsxImportSource preact\nconst x = 1;";
        let result = crate::parse(src, ParseOptions { loader: Loader::Js, ..ParseOptions::default() });
        assert!(!result.diagnostics.has_errors());
    }
}
