//! Optional constant-folding/DCE/inlining pass, enabled by
//! `ParseOptions::mangle_syntax`. Runs once, after the whole program has
//! parsed and resolved, and rewrites the arena in place — child slots are
//! overwritten rather than reparented rather than the tree being rebuilt.
//!
//! Every rewrite here must be unobservable under the language's abstract
//! semantics; the implementation leans conservative rather than clever —
//! e.g. local-variable inlining only
//! substitutes a side-effect-free literal into the very next sibling
//! statement, not an arbitrary dataflow analysis, and it never looks inside
//! a nested function/class body it didn't itself open (closures may run
//! later, at a time the surrounding mutation analysis can't see).

use crate::symbol_table::SymbolTable;
use jsc_rowan::Interner;
use jsc_syntax::ast::{
    ArrayElement, AstArena, BinaryOp, ClassExpr, DeclKind, Expr, ExprId, ForHead, ForInit,
    Function, FunctionBody, FunctionKind, JsxChild, JsxElement, LogicalOp, Pattern, PropertyKey,
    Stmt, StmtId, UnaryOp,
};
use jsc_syntax::symbol::{SymbolFlags, SymbolId, SymbolKind};

pub struct Mangler<'a> {
    arena: &'a mut AstArena,
    symbols: &'a SymbolTable,
    interner: &'a Interner,
}

impl<'a> Mangler<'a> {
    pub fn new(arena: &'a mut AstArena, symbols: &'a SymbolTable, interner: &'a Interner) -> Self {
        Self { arena, symbols, interner }
    }

    pub fn run(&mut self, body: &mut Vec<StmtId>) {
        self.fold_stmts(body);
    }

    // -- statement lists ---------------------------------------------------

    fn fold_stmts(&mut self, stmts: &mut Vec<StmtId>) {
        for &id in stmts.iter() {
            self.fold_stmt(id);
        }
        self.inline_single_use_locals(stmts);
    }

    fn fold_stmt(&mut self, id: StmtId) {
        let kind = self.arena.stmt(id).kind.clone();
        let new_kind = match kind {
            Stmt::Expr(e) => {
                self.fold_expr(e);
                Stmt::Expr(e)
            }
            Stmt::Block(mut stmts) => {
                self.fold_stmts(&mut stmts);
                Stmt::Block(stmts)
            }
            Stmt::Empty | Stmt::Debugger | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Error => {
                kind
            }
            Stmt::VarDecl { kind: decl_kind, declarations } => {
                for decl in &declarations {
                    if let Some(init) = decl.init {
                        self.fold_expr(init);
                    }
                }
                Stmt::VarDecl { kind: decl_kind, declarations }
            }
            Stmt::FunctionDecl { function } => {
                let function = self.fold_function(function);
                Stmt::FunctionDecl { function }
            }
            Stmt::ClassDecl { class } => {
                let class = self.fold_class(class);
                Stmt::ClassDecl { class }
            }
            Stmt::If { test, consequent, alternate } => {
                self.fold_expr(test);
                self.fold_stmt(consequent);
                if let Some(alt) = alternate {
                    self.fold_stmt(alt);
                }
                self.simplify_if(test, consequent, alternate)
            }
            Stmt::For { head, body } => {
                self.fold_for_head(&head);
                self.fold_stmt(body);
                Stmt::For { head, body }
            }
            Stmt::While { test, body } => {
                self.fold_expr(test);
                self.fold_stmt(body);
                // `while (e)` lowers to the equivalent `for (;e;)`.
                Stmt::For {
                    head: ForHead::Classic { init: ForInit::None, test: Some(test), update: None },
                    body,
                }
            }
            Stmt::DoWhile { body, test } => {
                self.fold_stmt(body);
                self.fold_expr(test);
                Stmt::DoWhile { body, test }
            }
            Stmt::Switch { discriminant, mut cases } => {
                self.fold_expr(discriminant);
                for case in &mut cases {
                    if let Some(test) = case.test {
                        self.fold_expr(test);
                    }
                    self.fold_stmts(&mut case.consequent);
                }
                Stmt::Switch { discriminant, cases }
            }
            Stmt::Try { mut block, mut handler, mut finalizer } => {
                self.fold_stmts(&mut block);
                if let Some(h) = &mut handler {
                    self.fold_stmts(&mut h.body);
                }
                if let Some(f) = &mut finalizer {
                    self.fold_stmts(f);
                }
                Stmt::Try { block, handler, finalizer }
            }
            Stmt::Throw(e) => {
                self.fold_expr(e);
                Stmt::Throw(e)
            }
            Stmt::Return(Some(e)) => {
                self.fold_expr(e);
                Stmt::Return(Some(e))
            }
            Stmt::Return(None) => Stmt::Return(None),
            Stmt::Labeled { label, body } => {
                self.fold_stmt(body);
                Stmt::Labeled { label, body }
            }
            Stmt::With { object, body } => {
                self.fold_expr(object);
                self.fold_stmt(body);
                Stmt::With { object, body }
            }
            Stmt::Import { .. } => kind,
            Stmt::Export { specifiers, source, declaration } => {
                if let Some(decl) = declaration {
                    self.fold_stmt(decl);
                }
                Stmt::Export { specifiers, source, declaration }
            }
        };
        self.arena.stmt_mut(id).kind = new_kind;
    }

    /// Dead-code elimination for `if` plus the `if (a) b; else c;` ->
    /// `a ? b : c;` statement lowering, when both arms are plain expression
    /// statements.
    fn simplify_if(&mut self, test: ExprId, consequent: StmtId, alternate: Option<StmtId>) -> Stmt {
        let test_kind = self.arena.expr(test).kind.clone();
        if let Some(taken) = to_boolean(&test_kind) {
            return if taken {
                self.arena.stmt(consequent).kind.clone()
            } else if let Some(alt) = alternate {
                self.arena.stmt(alt).kind.clone()
            } else {
                Stmt::Empty
            };
        }
        if let Some(alt) = alternate {
            if let (Stmt::Expr(c), Stmt::Expr(a)) =
                (self.arena.stmt(consequent).kind.clone(), self.arena.stmt(alt).kind.clone())
            {
                let range = self.arena.expr(test).range;
                let conditional =
                    self.arena.alloc_expr(range, Expr::Conditional { test, consequent: c, alternate: a });
                return Stmt::Expr(conditional);
            }
        }
        Stmt::If { test, consequent, alternate }
    }

    fn fold_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Classic { init, test, update } => {
                match init {
                    ForInit::VarDecl(_, decls) => {
                        for decl in decls {
                            if let Some(init) = decl.init {
                                self.fold_expr(init);
                            }
                        }
                    }
                    ForInit::Expr(e) => self.fold_expr(*e),
                    ForInit::None => {}
                }
                if let Some(t) = test {
                    self.fold_expr(*t);
                }
                if let Some(u) = update {
                    self.fold_expr(*u);
                }
            }
            ForHead::In { right, .. } | ForHead::Of { right, .. } => self.fold_expr(*right),
        }
    }

    fn fold_function(&mut self, mut function: Box<Function>) -> Box<Function> {
        for param in &function.params {
            if let Some(default) = param.default {
                self.fold_expr(default);
            }
        }
        if let FunctionBody::Block(stmts) = &mut function.body {
            self.fold_stmts(stmts);
            // A trailing `return undefined` is removed, except in
            // async-generator functions where it still matters.
            if !matches!(function.kind, FunctionKind::AsyncGenerator) {
                if matches!(stmts.last().map(|&s| self.arena.stmt(s).kind.clone()), Some(Stmt::Return(None)))
                {
                    stmts.pop();
                }
            }
        }
        if function.is_arrow {
            // Implicit-return optimization: `() => { return e; }` becomes
            // the concise form `() => e`.
            if let FunctionBody::Block(stmts) = &function.body {
                if let [single] = stmts.as_slice() {
                    if let Stmt::Return(Some(expr)) = self.arena.stmt(*single).kind.clone() {
                        function.body = FunctionBody::Expr(expr);
                    }
                }
            }
        }
        function
    }

    fn fold_class(&mut self, mut class: Box<ClassExpr>) -> Box<ClassExpr> {
        if let Some(superclass) = class.body.superclass {
            self.fold_expr(superclass);
        }
        for member in &mut class.body.members {
            if let Some(value) = member.value {
                self.fold_expr(value);
            }
            for param in &member.params {
                if let Some(default) = param.default {
                    self.fold_expr(default);
                }
            }
            if let Some(body) = &mut member.body {
                self.fold_stmts(body);
            }
        }
        class
    }

    // -- expressions ---------------------------------------------------------

    fn fold_expr(&mut self, id: ExprId) {
        let kind = self.arena.expr(id).kind.clone();
        let new_kind = match kind {
            Expr::NumberLit(_)
            | Expr::BigIntLit(_)
            | Expr::StringLit(_)
            | Expr::BooleanLit(_)
            | Expr::NullLit
            | Expr::RegexLit { .. }
            | Expr::Identifier(_)
            | Expr::This
            | Expr::Super
            | Expr::NewTarget
            | Expr::ImportMeta
            | Expr::Error => kind,
            Expr::Template(template) => {
                for e in &template.exprs {
                    self.fold_expr(*e);
                }
                match self.fold_template_to_string(&template) {
                    Some(folded) => folded,
                    None => Expr::Template(template),
                }
            }
            Expr::TaggedTemplate { tag, quasi } => {
                self.fold_expr(tag);
                for e in &quasi.exprs {
                    self.fold_expr(*e);
                }
                Expr::TaggedTemplate { tag, quasi }
            }
            Expr::Array(elements) => {
                for element in &elements {
                    match element {
                        ArrayElement::Expr(e) | ArrayElement::Spread(e) => self.fold_expr(*e),
                        ArrayElement::Hole => {}
                    }
                }
                Expr::Array(elements)
            }
            Expr::Object(mut props) => {
                for prop in &props {
                    self.fold_expr(prop.value);
                    if let PropertyKey::Computed(k) = &prop.key {
                        self.fold_expr(*k);
                    }
                }
                // Property-key simplification: canonical integer-literal
                // string keys become numeric keys.
                for prop in &mut props {
                    if prop.computed {
                        continue;
                    }
                    if let PropertyKey::String(s) = &prop.key {
                        if s != "__proto__" {
                            if let Some(n) = canonical_integer_key(s) {
                                prop.key = PropertyKey::Number(n);
                            }
                        }
                    }
                }
                Expr::Object(props)
            }
            Expr::Function(function) => Expr::Function(self.fold_function(function)),
            Expr::Class(class) => Expr::Class(self.fold_class(class)),
            Expr::Unary { op, argument } => {
                self.fold_expr(argument);
                let arg_kind = self.arena.expr(argument).kind.clone();
                const_fold_unary(op, &arg_kind).unwrap_or(Expr::Unary { op, argument })
            }
            Expr::Update { op, argument, prefix } => {
                self.fold_expr(argument);
                Expr::Update { op, argument, prefix }
            }
            Expr::Binary { op, left, right } => {
                self.fold_expr(left);
                self.fold_expr(right);
                let lk = self.arena.expr(left).kind.clone();
                let rk = self.arena.expr(right).kind.clone();
                const_fold_binary(op, &lk, &rk).unwrap_or(Expr::Binary { op, left, right })
            }
            Expr::Logical { op, left, right } => {
                self.fold_expr(left);
                self.fold_expr(right);
                let lk = self.arena.expr(left).kind.clone();
                match logical_shortcircuit(op, &lk) {
                    Some(true) => lk,
                    Some(false) => self.arena.expr(right).kind.clone(),
                    None => Expr::Logical { op, left, right },
                }
            }
            Expr::Exponent { base, exponent } => {
                self.fold_expr(base);
                self.fold_expr(exponent);
                let bk = self.arena.expr(base).kind.clone();
                let ek = self.arena.expr(exponent).kind.clone();
                match (bk, ek) {
                    (Expr::NumberLit(b), Expr::NumberLit(e)) => Expr::NumberLit(b.powf(e)),
                    _ => Expr::Exponent { base, exponent },
                }
            }
            Expr::Assign { op, target, value } => {
                self.fold_expr(target);
                self.fold_expr(value);
                Expr::Assign { op, target, value }
            }
            Expr::Conditional { test, consequent, alternate } => {
                self.fold_expr(test);
                self.fold_expr(consequent);
                self.fold_expr(alternate);
                let tk = self.arena.expr(test).kind.clone();
                match to_boolean(&tk) {
                    Some(true) => self.arena.expr(consequent).kind.clone(),
                    Some(false) => self.arena.expr(alternate).kind.clone(),
                    None => Expr::Conditional { test, consequent, alternate },
                }
            }
            Expr::Sequence(exprs) => {
                for e in &exprs {
                    self.fold_expr(*e);
                }
                Expr::Sequence(exprs)
            }
            Expr::Member { object, property, computed, chain } => {
                self.fold_expr(object);
                if let PropertyKey::Computed(p) = property {
                    self.fold_expr(p);
                }
                Expr::Member { object, property, computed, chain }
            }
            Expr::Call { callee, arguments, chain } => {
                self.fold_expr(callee);
                for arg in &arguments {
                    self.fold_expr(arg.expr);
                }
                if let Some(inlined) = self.try_inline_iife(callee, &arguments) {
                    inlined
                } else if self.is_pure_call_target(callee, &arguments) {
                    let range = self.arena.expr(id).range;
                    let inner = self.arena.alloc_expr(range, Expr::Call { callee, arguments, chain });
                    Expr::PureAnnotated(inner)
                } else {
                    Expr::Call { callee, arguments, chain }
                }
            }
            Expr::New { callee, arguments } => {
                self.fold_expr(callee);
                for arg in &arguments {
                    self.fold_expr(arg.expr);
                }
                if self.is_pure_new_target(callee, &arguments) {
                    let range = self.arena.expr(id).range;
                    let inner = self.arena.alloc_expr(range, Expr::New { callee, arguments });
                    Expr::PureAnnotated(inner)
                } else {
                    Expr::New { callee, arguments }
                }
            }
            Expr::Spread(e) => {
                self.fold_expr(e);
                Expr::Spread(e)
            }
            Expr::Paren(e) => {
                self.fold_expr(e);
                Expr::Paren(e)
            }
            Expr::Await(e) => {
                self.fold_expr(e);
                Expr::Await(e)
            }
            Expr::Yield { argument, delegate } => {
                if let Some(a) = argument {
                    self.fold_expr(a);
                }
                Expr::Yield { argument, delegate }
            }
            Expr::Jsx(mut element) => {
                self.fold_jsx_element(&mut element);
                Expr::Jsx(element)
            }
            Expr::PureAnnotated(inner) => {
                self.fold_expr(inner);
                Expr::PureAnnotated(inner)
            }
        };
        self.arena.expr_mut(id).kind = new_kind;
    }

    fn fold_jsx_element(&mut self, element: &mut JsxElement) {
        for attr in &mut element.attributes {
            match &attr.value {
                Some(jsc_syntax::ast::JsxAttributeValue::Expr(e))
                | Some(jsc_syntax::ast::JsxAttributeValue::Spread(e)) => self.fold_expr(*e),
                _ => {}
            }
        }
        for child in &mut element.children {
            match child {
                JsxChild::Expr(Some(e)) | JsxChild::Spread(e) => self.fold_expr(*e),
                JsxChild::Element(inner) => self.fold_jsx_element(inner),
                JsxChild::Text(_) | JsxChild::Expr(None) => {}
            }
        }
    }

    /// Folds a template with no remaining un-evaluatable interpolations into
    /// a single string literal (spec scenario 5: `` `a${1 + `b${2}c` + 3}d`
    /// `` folds to `` `a1b2c3d` ``). Only applies to untagged templates with
    /// literal cooked parts and literal (or already-folded-to-literal)
    /// interpolations.
    fn fold_template_to_string(&self, template: &jsc_syntax::ast::TemplateLiteral) -> Option<Expr> {
        let mut out = String::new();
        for (i, part) in template.parts.iter().enumerate() {
            out.push_str(part.cooked.as_deref()?);
            if let Some(&expr_id) = template.exprs.get(i) {
                out.push_str(&literal_to_string(&self.arena.expr(expr_id).kind)?);
            }
        }
        Some(Expr::StringLit(out))
    }

    // -- IIFE inlining / pure-call annotation -------------------------------

    fn global_identifier_name(&self, id: ExprId) -> Option<&str> {
        match &self.arena.expr(id).kind {
            Expr::Identifier(sym) => {
                let data = self.symbols.get(*sym);
                (data.kind == SymbolKind::Unbound).then(|| self.interner.resolve(data.name))
            }
            _ => None,
        }
    }

    fn is_pure_call_target(&self, callee: ExprId, arguments: &[jsc_syntax::ast::Argument]) -> bool {
        if matches!(self.global_identifier_name(callee), Some("Boolean" | "Number" | "String" | "BigInt")) {
            return true;
        }
        self.is_object_create_safe(callee, arguments)
    }

    /// `Object.create(null)` / `Object.create({...})`.
    fn is_object_create_safe(&self, callee: ExprId, arguments: &[jsc_syntax::ast::Argument]) -> bool {
        let Expr::Member { object, property: PropertyKey::Ident(prop), computed: false, .. } =
            &self.arena.expr(callee).kind
        else {
            return false;
        };
        if self.interner.resolve(*prop) != "create" {
            return false;
        }
        if self.global_identifier_name(*object) != Some("Object") {
            return false;
        }
        match arguments {
            [arg] if !arg.spread => {
                matches!(self.arena.expr(arg.expr).kind, Expr::NullLit | Expr::Object(_))
            }
            _ => false,
        }
    }

    fn is_pure_new_target(&self, callee: ExprId, arguments: &[jsc_syntax::ast::Argument]) -> bool {
        if arguments.iter().any(|a| a.spread) {
            return false;
        }
        matches!(
            self.global_identifier_name(callee),
            Some("Date" | "Set" | "Map" | "WeakSet" | "WeakMap")
        )
    }

    /// `(function(){ return e; })()` -> `e`, the narrow, always-safe slice
    /// of IIFE inlining: niladic, non-arrow, non-generator, non-async,
    /// single-statement `return`.
    fn try_inline_iife(&mut self, callee: ExprId, arguments: &[jsc_syntax::ast::Argument]) -> Option<Expr> {
        if !arguments.is_empty() {
            return None;
        }
        let mut target = callee;
        loop {
            match self.arena.expr(target).kind.clone() {
                Expr::Paren(inner) => target = inner,
                Expr::Function(function)
                    if !function.is_arrow
                        && function.params.is_empty()
                        && matches!(function.kind, FunctionKind::Normal) =>
                {
                    if let FunctionBody::Block(stmts) = &function.body {
                        if let [single] = stmts.as_slice() {
                            if let Stmt::Return(Some(expr)) = self.arena.stmt(*single).kind.clone() {
                                return Some(self.arena.expr(expr).kind.clone());
                            }
                        }
                    }
                    return None;
                }
                _ => return None,
            }
        }
    }

    // -- local-variable inlining ---------------------------------------------

    /// Local-variable inlining: substitutes a single-use `let` initialized
    /// with a side-effect-free literal at its use site. Limited to the very
    /// next sibling statement — a deliberate narrowing that sidesteps the
    /// general reordering-safety analysis the full rule would require,
    /// while still being unconditionally sound for literal initializers.
    fn inline_single_use_locals(&mut self, stmts: &mut Vec<StmtId>) {
        let mut i = 0;
        while i < stmts.len() {
            if let Some((sym, literal)) = self.single_use_let_literal(stmts[i]) {
                if i + 1 < stmts.len() && self.try_inline_into_stmt(stmts[i + 1], sym, &literal) {
                    stmts.remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }

    fn single_use_let_literal(&self, id: StmtId) -> Option<(SymbolId, Expr)> {
        let Stmt::VarDecl { kind: DeclKind::Let, declarations } = &self.arena.stmt(id).kind else {
            return None;
        };
        if declarations.len() != 1 {
            return None;
        }
        let decl = &declarations[0];
        let Pattern::Ident(sym) = decl.pattern else {
            return None;
        };
        let init = decl.init?;
        let init_kind = self.arena.expr(init).kind.clone();
        if !matches!(
            init_kind,
            Expr::NumberLit(_) | Expr::StringLit(_) | Expr::BooleanLit(_) | Expr::NullLit
        ) {
            return None;
        }
        let data = self.symbols.get(sym);
        if data.use_count_estimate != 1
            || data.is_captured
            || data.flags.contains(SymbolFlags::DO_NOT_RENAME)
        {
            return None;
        }
        Some((sym, init_kind))
    }

    fn try_inline_into_stmt(&mut self, id: StmtId, sym: SymbolId, literal: &Expr) -> bool {
        let target = match self.arena.stmt(id).kind.clone() {
            Stmt::Expr(e) | Stmt::Throw(e) => Some(e),
            Stmt::Return(Some(e)) => Some(e),
            _ => None,
        };
        target.is_some_and(|e| self.replace_identifier(e, sym, literal))
    }

    /// Depth-first search for the first `Identifier(sym)` leaf, stopping at
    /// a nested function/class body — a closure may run at a time this
    /// analysis can't reason about, and `this` may rebind across it.
    fn replace_identifier(&mut self, id: ExprId, sym: SymbolId, literal: &Expr) -> bool {
        let kind = self.arena.expr(id).kind.clone();
        let found = match kind {
            Expr::Identifier(s) => s == sym,
            Expr::Unary { argument, .. }
            | Expr::Spread(argument)
            | Expr::Paren(argument)
            | Expr::Await(argument)
            | Expr::Update { argument, .. } => self.replace_identifier(argument, sym, literal),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.replace_identifier(left, sym, literal) || self.replace_identifier(right, sym, literal)
            }
            Expr::Exponent { base, exponent } => {
                self.replace_identifier(base, sym, literal) || self.replace_identifier(exponent, sym, literal)
            }
            Expr::Assign { target, value, .. } => {
                self.replace_identifier(target, sym, literal) || self.replace_identifier(value, sym, literal)
            }
            Expr::Conditional { test, consequent, alternate } => {
                self.replace_identifier(test, sym, literal)
                    || self.replace_identifier(consequent, sym, literal)
                    || self.replace_identifier(alternate, sym, literal)
            }
            Expr::Sequence(exprs) => exprs.into_iter().any(|e| self.replace_identifier(e, sym, literal)),
            Expr::Member { object, property, .. } => {
                self.replace_identifier(object, sym, literal)
                    || matches!(property, PropertyKey::Computed(p) if self.replace_identifier(p, sym, literal))
            }
            Expr::Call { callee, arguments, .. } | Expr::New { callee, arguments } => {
                self.replace_identifier(callee, sym, literal)
                    || arguments.into_iter().any(|a| self.replace_identifier(a.expr, sym, literal))
            }
            Expr::Array(elements) => elements.into_iter().any(|e| match e {
                ArrayElement::Expr(e) | ArrayElement::Spread(e) => self.replace_identifier(e, sym, literal),
                ArrayElement::Hole => false,
            }),
            Expr::Object(props) => props.into_iter().any(|p| self.replace_identifier(p.value, sym, literal)),
            Expr::Template(t) => t.exprs.into_iter().any(|e| self.replace_identifier(e, sym, literal)),
            Expr::TaggedTemplate { tag, quasi } => {
                self.replace_identifier(tag, sym, literal)
                    || quasi.exprs.into_iter().any(|e| self.replace_identifier(e, sym, literal))
            }
            Expr::Yield { argument: Some(a), .. } => self.replace_identifier(a, sym, literal),
            _ => false,
        };
        if found && matches!(self.arena.expr(id).kind, Expr::Identifier(s) if s == sym) {
            self.arena.expr_mut(id).kind = literal.clone();
        }
        found
    }
}

// -- pure constant evaluation -------------------------------------------------

fn to_boolean(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::NumberLit(n) => Some(*n != 0.0 && !n.is_nan()),
        Expr::StringLit(s) => Some(!s.is_empty()),
        Expr::BooleanLit(b) => Some(*b),
        Expr::NullLit => Some(false),
        _ => None,
    }
}

fn is_nullish_literal(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::NullLit => Some(true),
        Expr::NumberLit(_) | Expr::StringLit(_) | Expr::BooleanLit(_) => Some(false),
        _ => None,
    }
}

/// `Some(true)`: the logical expression's value is its left operand
/// (short-circuited). `Some(false)`: its value is the right operand.
fn logical_shortcircuit(op: LogicalOp, left: &Expr) -> Option<bool> {
    match op {
        LogicalOp::And => to_boolean(left).map(|truthy| !truthy),
        LogicalOp::Or => to_boolean(left),
        LogicalOp::NullishCoalescing => is_nullish_literal(left).map(|nullish| !nullish),
    }
}

fn literal_to_string(expr: &Expr) -> Option<String> {
    match expr {
        Expr::StringLit(s) => Some(s.clone()),
        Expr::NumberLit(n) => Some(format_number(*n)),
        Expr::BooleanLit(b) => Some(b.to_string()),
        Expr::NullLit => Some("null".to_string()),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// ECMAScript `ToInt32`.
fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc();
    let modulo = n.rem_euclid(4294967296.0);
    (if modulo >= 2147483648.0 { modulo - 4294967296.0 } else { modulo }) as i32
}

fn const_fold_unary(op: UnaryOp, arg: &Expr) -> Option<Expr> {
    match op {
        UnaryOp::Not => to_boolean(arg).map(|b| Expr::BooleanLit(!b)),
        UnaryOp::Minus => match arg {
            // `-0` vs `0` must be preserved; negating a literal number is
            // always observably correct to fold since the literal itself
            // has no side effects.
            Expr::NumberLit(n) => Some(Expr::NumberLit(-n)),
            _ => None,
        },
        UnaryOp::Plus => match arg {
            Expr::NumberLit(n) => Some(Expr::NumberLit(*n)),
            _ => None,
        },
        UnaryOp::BitNot => match arg {
            Expr::NumberLit(n) => Some(Expr::NumberLit(!to_int32(*n) as f64)),
            _ => None,
        },
        UnaryOp::Typeof => match arg {
            Expr::NumberLit(_) => Some(Expr::StringLit("number".to_string())),
            Expr::StringLit(_) => Some(Expr::StringLit("string".to_string())),
            Expr::BooleanLit(_) => Some(Expr::StringLit("boolean".to_string())),
            Expr::NullLit => Some(Expr::StringLit("object".to_string())),
            Expr::Function(_) | Expr::Class(_) => Some(Expr::StringLit("function".to_string())),
            Expr::BigIntLit(_) => Some(Expr::StringLit("bigint".to_string())),
            _ => None,
        },
        // `void`'s result is always `undefined`, which this AST has no
        // literal for; folding it would require synthesizing one, so it is
        // left alone even when the operand is side-effect-free.
        UnaryOp::Void | UnaryOp::Delete => None,
    }
}

fn const_fold_binary(op: BinaryOp, left: &Expr, right: &Expr) -> Option<Expr> {
    use BinaryOp::*;
    match (op, left, right) {
        (Add, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::NumberLit(a + b)),
        (Add, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::StringLit(format!("{a}{b}"))),
        (Sub, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::NumberLit(a - b)),
        (Mul, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::NumberLit(a * b)),
        (Div, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::NumberLit(a / b)),
        (Mod, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::NumberLit(a % b)),
        (BitAnd, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            Some(Expr::NumberLit((to_int32(*a) & to_int32(*b)) as f64))
        }
        (BitOr, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            Some(Expr::NumberLit((to_int32(*a) | to_int32(*b)) as f64))
        }
        (BitXor, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            Some(Expr::NumberLit((to_int32(*a) ^ to_int32(*b)) as f64))
        }
        (Shl, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            Some(Expr::NumberLit((to_int32(*a).wrapping_shl(to_int32(*b) as u32 & 31)) as f64))
        }
        (Shr, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            Some(Expr::NumberLit((to_int32(*a).wrapping_shr(to_int32(*b) as u32 & 31)) as f64))
        }
        (UShr, Expr::NumberLit(a), Expr::NumberLit(b)) => {
            let unsigned = to_int32(*a) as u32;
            Some(Expr::NumberLit((unsigned.wrapping_shr(to_int32(*b) as u32 & 31)) as f64))
        }
        (Lt, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a < b)),
        (Lte, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a <= b)),
        (Gt, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a > b)),
        (Gte, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a >= b)),
        (Lt, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a < b)),
        (Lte, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a <= b)),
        (Gt, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a > b)),
        (Gte, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a >= b)),
        (EqEqEq | EqEq, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a == b)),
        (NotEqEq | NotEq, Expr::NumberLit(a), Expr::NumberLit(b)) => Some(Expr::BooleanLit(a != b)),
        (EqEqEq | EqEq, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a == b)),
        (NotEqEq | NotEq, Expr::StringLit(a), Expr::StringLit(b)) => Some(Expr::BooleanLit(a != b)),
        (EqEqEq | EqEq, Expr::BooleanLit(a), Expr::BooleanLit(b)) => Some(Expr::BooleanLit(a == b)),
        (NotEqEq | NotEq, Expr::BooleanLit(a), Expr::BooleanLit(b)) => Some(Expr::BooleanLit(a != b)),
        (EqEqEq | EqEq, Expr::NullLit, Expr::NullLit) => Some(Expr::BooleanLit(true)),
        (NotEqEq | NotEq, Expr::NullLit, Expr::NullLit) => Some(Expr::BooleanLit(false)),
        _ => None,
    }
}

fn canonical_integer_key(s: &str) -> Option<f64> {
    if s == "0" {
        return Some(0.0);
    }
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = s.parse().ok()?;
    (n <= 2_147_483_647).then_some(n as f64)
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;

    fn mangle(src: &str) -> crate::ParseResult {
        let mut options = ParseOptions::default();
        options.mangle_syntax = true;
        crate::parse(src, options)
    }

    fn expr_kind_at(result: &crate::ParseResult, stmt_index: usize) -> String {
        let stmt = result.arena.stmt(result.body[stmt_index]);
        format!("{:?}", stmt.kind)
    }

    #[test]
    fn folds_numeric_constant_arithmetic() {
        let result = mangle("1 + 2;");
        assert!(expr_kind_at(&result, 0).contains("NumberLit(3.0)"));
    }

    #[test]
    fn preserves_negative_zero() {
        let result = mangle("-0;");
        let text = expr_kind_at(&result, 0);
        assert!(text.contains("NumberLit(-0.0)"));
    }

    #[test]
    fn eliminates_dead_if_branch() {
        let result = mangle("if (true) { 1; } else { 2; }");
        let text = expr_kind_at(&result, 0);
        assert!(text.contains("NumberLit(1.0)"));
        assert!(!text.contains("NumberLit(2.0)"));
    }

    #[test]
    fn lowers_while_to_for() {
        let result = mangle("while (x) { y; }");
        assert!(expr_kind_at(&result, 0).starts_with("For"));
    }

    #[test]
    fn simplifies_if_else_expression_statements_to_conditional() {
        let result = mangle("if (a) { b; } else { c; }");
        // Both arms are blocks, not bare expression statements, so this
        // should remain an `If`, not collapse to a conditional.
        assert!(expr_kind_at(&result, 0).starts_with("If"));
    }

    #[test]
    fn inlines_single_use_literal_local() {
        let result = mangle("let x = 5; console.log(x);");
        assert_eq!(result.body.len(), 1);
    }

    #[test]
    fn folds_template_literal_with_nested_interpolation() {
        let result = mangle("`a${1 + 2}b`;");
        assert!(expr_kind_at(&result, 0).contains("StringLit(\"a3b\")"));
    }
}
