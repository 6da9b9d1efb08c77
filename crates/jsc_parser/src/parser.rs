//! The `Parser` facade every `syntax::*` rule is written against: token
//! inspection/consumption, diagnostic emission, symbol/scope bookkeeping,
//! and the checkpoint/rewind machinery speculative grammar (arrow heads,
//! destructuring targets) needs. Parse rules live in [`crate::syntax`]; this
//! module only hosts the shared plumbing the productions build on.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::options::ParseOptions;
use crate::scope_tree::ScopeTree;
use crate::state::{ParserContext, ParserState, StrictMode};
use crate::symbol_table::SymbolTable;
use crate::token_set::TokenSet;
use crate::token_source::{ReLexContext, TokenSource};
use jsc_rowan::{Interner, Name, TextRange, TextSize};
use jsc_syntax::ast::{AstArena, ExprId, StmtId};
use jsc_syntax::scope::ScopeKind;
use jsc_syntax::symbol::SymbolId;
use jsc_syntax::SyntaxKind;

/// The standard `parse_*` return contract: `Present` once at least one
/// token was consumed, `Absent` when the rule recognized nothing at its
/// current position and must not have advanced the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedSyntax<T> {
    Present(T),
    Absent,
}

impl<T> ParsedSyntax<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, ParsedSyntax::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ParsedSyntax::Absent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParsedSyntax<U> {
        match self {
            ParsedSyntax::Present(value) => ParsedSyntax::Present(f(value)),
            ParsedSyntax::Absent => ParsedSyntax::Absent,
        }
    }

    /// Unwraps a `Present`, or runs `recover` to synthesize a fallback —
    /// used at call sites where the grammar requires *something* here
    /// (e.g. a statement body) even if what's next didn't parse as the
    /// preferred production.
    pub fn or_else(self, recover: impl FnOnce() -> T) -> T {
        match self {
            ParsedSyntax::Present(value) => value,
            ParsedSyntax::Absent => recover(),
        }
    }
}

/// A snapshot of every piece of mutable parser state a speculative parse
/// needs to roll back: token position, and the length of every append-only
/// store touched since. Arena/symbol/scope entries allocated during a
/// failed speculative parse are never freed — the arenas are append-only
/// by design, so they just become unreachable garbage rather than being
/// reclaimed.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    source_pos: u32,
    diagnostics_len: usize,
    expr_len: usize,
    stmt_len: usize,
    symbols_len: usize,
    scope_depth: usize,
}

/// Conditional-syntax gate: a production that parses successfully
/// everywhere but is only *valid* under some condition gets flagged
/// unusable with a diagnostic instead of being silently rejected,
/// preserving full error recovery.
pub trait SyntaxFeature: Sized {
    /// Flags `self` as an error unless `condition` holds, attaching
    /// `message` at `range`. Returns `self` unchanged either way so the
    /// node is still usable downstream as best-effort recovery.
    fn exclusive_syntax(
        self,
        parser: &mut Parser<impl TokenSource>,
        condition: bool,
        message: impl Into<String>,
        range: TextRange,
    ) -> Self {
        if !condition {
            parser.error(message, range);
        }
        self
    }

    /// The inverse: flags `self` as an error when `condition` holds (the
    /// syntax is excluded precisely when the condition is true — e.g.
    /// `with` statements excluded under strict mode).
    fn excluding_syntax(
        self,
        parser: &mut Parser<impl TokenSource>,
        condition: bool,
        message: impl Into<String>,
        range: TextRange,
    ) -> Self {
        self.exclusive_syntax(parser, !condition, message, range)
    }
}

impl SyntaxFeature for ExprId {}
impl SyntaxFeature for StmtId {}

pub struct Parser<S: TokenSource> {
    source: S,
    arena: AstArena,
    symbols: SymbolTable,
    scopes: ScopeTree,
    interner: Interner,
    diagnostics: DiagnosticSink,
    pub(crate) context: ParserContext,
    pub(crate) state: ParserState,
    pub(crate) options: ParseOptions,
    cancellation: crate::cancellation::CancellationToken,
    had_fatal_error: bool,
    fatal_error_count: u32,
    /// Stack of private-name declaration sets, one per enclosing class body,
    /// populated by a raw-token prescan before that class's members are
    /// parsed. Lets `#field` be
    /// referenced anywhere in the body regardless of textual declaration
    /// order: ordinary scope resolution already handles backward references
    /// for free, this stack is the fallback for forward ones.
    private_name_scopes: Vec<rustc_hash::FxHashMap<Name, TextRange>>,
}

/// Past this many fatal errors in one parse, further recovery attempts are
/// abandoned and the rest of the source becomes a single `Stmt::Error` —
/// recovery is best-effort, not unbounded.
const MAX_FATAL_ERRORS: u32 = 64;

impl<S: TokenSource> Parser<S> {
    pub fn new(
        source: S,
        options: ParseOptions,
        cancellation: crate::cancellation::CancellationToken,
    ) -> Self {
        let is_module = options.is_strict;
        Self {
            source,
            arena: AstArena::new(),
            symbols: SymbolTable::new(),
            scopes: ScopeTree::new(),
            interner: Interner::new(),
            diagnostics: DiagnosticSink::new(),
            context: ParserContext::top_level(is_module),
            state: ParserState::new(if is_module {
                StrictMode::strict(jsc_syntax::scope::StrictReason::Module)
            } else {
                StrictMode::sloppy()
            }),
            options,
            cancellation,
            had_fatal_error: false,
            fatal_error_count: 0,
            private_name_scopes: Vec::new(),
        }
    }

    // -- token inspection --------------------------------------------------

    pub fn cur(&self) -> SyntaxKind {
        self.source.current().kind
    }

    pub fn nth(&self, n: u32) -> SyntaxKind {
        match n {
            0 => self.source.current().kind,
            1 => self.source.lookahead().kind,
            _ => panic!("Parser only supports 1-token lookahead"),
        }
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.cur() == kind
    }

    pub fn at_ts(&self, set: TokenSet) -> bool {
        set.contains(self.cur())
    }

    pub fn nth_at(&self, n: u32, kind: SyntaxKind) -> bool {
        self.nth(n) == kind
    }

    pub fn cur_range(&self) -> TextRange {
        self.source.current().range
    }

    pub fn cur_text(&self) -> &str {
        self.source.text(self.cur_range())
    }

    pub fn cur_ident_text(&self) -> Option<&str> {
        match &self.source.current().payload {
            jsc_syntax::token::TokenPayload::Ident(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// The decoded literal payload of the current token (number/string/
    /// bigint/template/regex value), for productions that need more than
    /// just the raw source text.
    pub fn peek_current_payload(&self) -> &jsc_syntax::token::TokenPayload {
        &self.source.current().payload
    }

    pub fn preceded_by_line_break(&self) -> bool {
        self.source.current().preceded_by_line_break
    }

    /// Like [`Parser::preceded_by_line_break`] but for the lookahead token —
    /// needed to tell `async\nx => {}` (line break disables the async-arrow
    /// reading) apart from `async x => {}`.
    pub fn nth_preceded_by_line_break(&self, n: u32) -> bool {
        match n {
            0 => self.source.current().preceded_by_line_break,
            1 => self.source.lookahead().preceded_by_line_break,
            _ => panic!("Parser only supports 1-token lookahead"),
        }
    }

    pub fn at_eof(&self) -> bool {
        self.at(SyntaxKind::EOF)
    }

    // -- token consumption ---------------------------------------------------

    pub fn bump_any(&mut self) {
        debug_assert!(!self.at_eof(), "bump_any called at EOF");
        self.source.bump();
    }

    /// Consumes the current token, asserting it is `kind` — use only where
    /// the grammar guarantees it (an `at(kind)` check already gated entry).
    pub fn bump(&mut self, kind: SyntaxKind) {
        debug_assert_eq!(self.cur(), kind);
        self.bump_any();
    }

    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump_any();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or emits a recoverable diagnostic without consuming
    /// anything (so the caller's recovery set still sees the offending
    /// token).
    pub fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            let range = self.cur_range();
            self.error(format!("expected {kind:?}, found {:?}", self.cur()), range);
            false
        }
    }

    /// Automatic semicolon insertion: a `;` is consumed if present;
    /// otherwise it applies (and no diagnostic is emitted) when the next
    /// token is `}`/EOF or is preceded by a line break. Otherwise this is a
    /// genuine missing-semicolon error.
    pub fn expect_semi(&mut self) {
        if self.eat(SyntaxKind::SEMICOLON) {
            return;
        }
        if self.at(SyntaxKind::R_CURLY) || self.at_eof() || self.preceded_by_line_break() {
            return;
        }
        let range = self.cur_range();
        self.error("expected ';'", range);
    }

    pub fn relex(&mut self, ctx: ReLexContext) {
        self.source.relex(ctx);
    }

    /// Scans the whole source for `// @jsx*` pragma comments (spec §6) and
    /// applies them to `self.options.jsx` before any JSX production is
    /// parsed, warning on invalid combinations. A no-op under a loader that
    /// doesn't enable JSX.
    fn apply_jsx_pragmas(&mut self) {
        if !self.options.loader.enables_jsx() {
            return;
        }
        let whole_source = TextRange::new(TextSize::new(0), TextSize::new(self.source.source_len()));
        let source_text = self.source.text(whole_source).to_string();
        let pragmas = crate::options::scan_jsx_pragmas(&source_text);
        if pragmas.is_empty() {
            return;
        }
        let warnings = self.options.jsx.apply_pragmas(&pragmas);
        for (message, range) in warnings {
            self.warning(message, range);
        }
    }

    // -- diagnostics ---------------------------------------------------------

    pub fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.diagnostics.push(Diagnostic::error(message, range));
    }

    pub fn warning(&mut self, message: impl Into<String>, range: TextRange) {
        self.diagnostics.push(Diagnostic::warning(message, range));
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// A fatal error: the current production can't be recovered locally at
    /// all. Bumps the fatal-error budget and, once exhausted,
    /// flags `had_fatal_error` so the top-level loop stops attempting
    /// further recovery.
    pub fn fatal_error(&mut self, message: impl Into<String>, range: TextRange) {
        self.error(message, range);
        self.fatal_error_count += 1;
        if self.fatal_error_count >= MAX_FATAL_ERRORS {
            self.had_fatal_error = true;
        }
    }

    pub fn had_fatal_error(&self) -> bool {
        self.had_fatal_error
    }

    /// Skips tokens until one in `recovery_set` (or EOF), emitting no
    /// further diagnostics for the skipped tokens themselves — the single
    /// diagnostic the caller already raised describes the whole skipped
    /// span — the parser skips ahead to the next statement boundary.
    pub fn recover(&mut self, recovery_set: TokenSet) {
        let mut guard = 0u32;
        while !self.at_eof() && !self.at_ts(recovery_set) {
            self.bump_any();
            guard += 1;
            if guard > 1_000_000 {
                self.had_fatal_error = true;
                break;
            }
        }
    }

    // -- speculative parsing ---------------------------------------------------

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            source_pos: self.source.position(),
            diagnostics_len: self.diagnostics.len(),
            expr_len: self.arena.exprs.len(),
            stmt_len: self.arena.stmts.len(),
            symbols_len: self.symbols.len(),
            scope_depth: self.scopes.depth(),
        }
    }

    /// Rewinds token position and discards diagnostics raised since
    /// `checkpoint`. Arena/symbol entries allocated since then are left in
    /// place (append-only, see [`Checkpoint`]'s doc comment) but become
    /// unreachable once the caller discards whatever referenced them.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.source.rewind(checkpoint.source_pos);
        self.diagnostics.truncate(checkpoint.diagnostics_len);
        debug_assert_eq!(
            self.scopes.depth(),
            checkpoint.scope_depth,
            "rewound across an unbalanced open_scope/close_scope"
        );
    }

    // -- names/symbols/scopes --------------------------------------------------

    pub fn intern(&mut self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn resolve_name(&self, name: Name) -> &str {
        self.interner.resolve(name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeTree {
        &mut self.scopes
    }

    pub fn current_scope(&self) -> jsc_syntax::scope::ScopeId {
        self.scopes.current()
    }

    pub fn open_scope(&mut self, kind: ScopeKind) -> jsc_syntax::scope::ScopeId {
        self.scopes.open_scope(kind)
    }

    pub fn close_scope(&mut self) -> jsc_syntax::scope::ScopeId {
        self.scopes.close_scope()
    }

    /// Declares `name` as `kind`, reporting a redeclaration diagnostic
    /// immediately rather than deferring to the finalization pass — spec
    /// §4.3 treats this as a hard, inline-phase error, not the
    /// warning-or-escalate family the finalization pass handles.
    pub fn declare(
        &mut self,
        scope: jsc_syntax::scope::ScopeId,
        name: Name,
        kind: jsc_syntax::symbol::SymbolKind,
        range: TextRange,
        hoisted: bool,
    ) -> SymbolId {
        let symbol = self
            .symbols
            .alloc(crate::symbol_table::new_symbol(name, kind, range));
        let conflict = if hoisted {
            self.scopes.declare_hoisted(&mut self.symbols, scope, name, symbol)
        } else {
            self.scopes.declare(&mut self.symbols, scope, name, symbol)
        };
        if let Some(existing) = conflict {
            let existing_range = self.symbols.get(existing).declaration_range;
            let diagnostic = Diagnostic::error(
                format!(
                    "identifier '{}' has already been declared",
                    self.interner.resolve(name)
                ),
                range,
            )
            .with_note(
                format!("'{}' was originally declared here", self.interner.resolve(name)),
                Some(existing_range),
            );
            self.push_diagnostic(diagnostic);
        }
        symbol
    }

    /// Resolves an identifier use against the scope chain, installing a
    /// synthetic `Unbound` symbol (and recording the use against it) when
    /// nothing binds the name, so every use site still has a symbol to
    /// point diagnostics at.
    pub fn resolve_identifier(&mut self, name: Name, range: TextRange) -> SymbolId {
        if let Some(existing) = self.scopes.resolve(self.current_scope(), name) {
            self.symbols.record_use(existing);
            return existing;
        }
        let symbol = self.symbols.alloc(crate::symbol_table::new_symbol(
            name,
            jsc_syntax::symbol::SymbolKind::Unbound,
            range,
        ));
        self.symbols.record_use(symbol);
        symbol
    }

    // -- private names ----------------------------------------------------

    /// Pushed once per class body, before its members are parsed, with
    /// every `#name` spelling the prescan found anywhere in the body.
    pub fn push_private_name_scope(&mut self, names: rustc_hash::FxHashMap<Name, TextRange>) {
        self.private_name_scopes.push(names);
    }

    pub fn pop_private_name_scope(&mut self) {
        self.private_name_scopes.pop();
    }

    fn private_name_declared(&self, name: Name) -> bool {
        self.private_name_scopes
            .iter()
            .rev()
            .any(|scope| scope.contains_key(&name))
    }

    /// Resolves a `#name` reference. Ordinary scope resolution covers
    /// references after the member that declares them (private members
    /// declare into the enclosing `Class` scope just like any other
    /// symbol); when that fails, the prescanned [`private_name_scopes`]
    /// stack covers forward references by synthesizing a placeholder
    /// symbol rather than reporting a spurious "not defined" error. This
    /// placeholder does not alias the real declaration's `SymbolId` — a
    /// known simplification, since nothing downstream needs private-name
    /// uses and declarations to share identity.
    pub fn resolve_private_name(&mut self, name: Name, range: TextRange) -> SymbolId {
        if let Some(existing) = self.scopes.resolve(self.current_scope(), name) {
            self.symbols.record_use(existing);
            return existing;
        }
        if self.private_name_declared(name) {
            let symbol = self.symbols.alloc(crate::symbol_table::new_symbol(
                name,
                jsc_syntax::symbol::SymbolKind::PrivateField,
                range,
            ));
            self.symbols.record_use(symbol);
            return symbol;
        }
        self.error(
            format!(
                "private name '{}' is not defined in any enclosing class",
                self.interner.resolve(name)
            ),
            range,
        );
        let symbol = self.symbols.alloc(crate::symbol_table::new_symbol(
            name,
            jsc_syntax::symbol::SymbolKind::Unbound,
            range,
        ));
        self.symbols.record_use(symbol);
        symbol
    }

    // -- AST allocation --------------------------------------------------------

    pub fn alloc_expr(&mut self, range: TextRange, kind: jsc_syntax::ast::Expr) -> ExprId {
        self.arena.alloc_expr(range, kind)
    }

    pub fn alloc_stmt(&mut self, range: TextRange, kind: jsc_syntax::ast::Stmt) -> StmtId {
        self.arena.alloc_stmt(range, kind)
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut AstArena {
        &mut self.arena
    }

    // -- cancellation ------------------------------------------------------

    pub fn check_cancellation(&mut self) {
        if self.cancellation.is_cancelled() {
            self.had_fatal_error = true;
        }
    }

    // -- top level -----------------------------------------------------------

    /// Parses the whole source as a script or module. A module is
    /// detected either because `options.is_strict` forces it or because the
    /// body contains a top-level `import`/`export` — module-entailing
    /// syntax retroactively makes the whole file a module.
    pub fn parse_program(&mut self) -> Vec<StmtId> {
        self.apply_jsx_pragmas();
        let is_module = self.context.contains(ParserContext::MODULE);
        let scope = self.open_scope(ScopeKind::ModuleTopLevel);
        if is_module {
            self.scopes
                .mark_strict(scope, jsc_syntax::scope::StrictReason::Module);
        }

        let mut body = Vec::new();
        let mut saw_directive_prologue_end = false;
        while !self.at_eof() {
            self.check_cancellation();
            if self.had_fatal_error() {
                break;
            }
            if !saw_directive_prologue_end {
                if let Some(directive) = crate::syntax::stmt::try_parse_directive(self) {
                    if directive == "use strict" && !self.state.strict.is_strict() {
                        self.state.strict =
                            StrictMode::strict(jsc_syntax::scope::StrictReason::UseStrictDirective);
                        self.scopes.mark_strict(
                            scope,
                            jsc_syntax::scope::StrictReason::UseStrictDirective,
                        );
                    }
                    continue;
                }
                saw_directive_prologue_end = true;
            }
            match crate::syntax::stmt::parse_statement(self) {
                ParsedSyntax::Present(stmt) => body.push(stmt),
                ParsedSyntax::Absent => {
                    let range = self.cur_range();
                    self.fatal_error(format!("unexpected token {:?}", self.cur()), range);
                    if self.at_eof() {
                        break;
                    }
                    self.bump_any();
                }
            }
        }

        crate::syntax::stmt::run_var_hoisting(self, scope, &body);
        self.close_scope();
        body
    }

    #[allow(clippy::type_complexity)]
    pub fn finish(
        self,
    ) -> (
        AstArena,
        SymbolTable,
        ScopeTree,
        DiagnosticSink,
        Interner,
        bool,
    ) {
        (
            self.arena,
            self.symbols,
            self.scopes,
            self.diagnostics,
            self.interner,
            self.had_fatal_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use jsc_syntax::ast::Stmt;

    fn parse(src: &str) -> crate::ParseResult {
        crate::parse(src, ParseOptions::default())
    }

    #[test]
    fn expect_semi_inserts_before_closing_brace_and_line_break() {
        let result = parse("function f() { return 1\n}");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn missing_semicolon_without_asi_opportunity_is_an_error() {
        let result = parse("a b");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn unexpected_top_level_token_recovers_and_keeps_parsing() {
        let result = parse("@ let x = 1;");
        assert!(result.diagnostics.has_errors());
        assert!(result
            .body
            .iter()
            .any(|&id| matches!(result.arena.stmt(id).kind, Stmt::VarDecl { .. })));
    }

    #[test]
    fn redeclaring_let_emits_an_originally_declared_here_note() {
        let result = parse("let x; let x;");
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.message.contains("already been declared"))
            .expect("expected a duplicate-declaration diagnostic");
        assert!(diag.notes.iter().any(|n| n.message.contains("originally declared")));
    }

    #[test]
    fn unresolved_identifier_does_not_crash_and_is_marked_unbound() {
        let result = parse("doesNotExist;");
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn cancellation_token_halts_parsing_without_panicking() {
        let cancellation = crate::cancellation::CancellationToken::new();
        cancellation.cancel();
        let lexer = crate::lexer::Lexer::new("let x = 1; let y = 2; let z = 3;");
        let mut parser = crate::parser::Parser::new(lexer, ParseOptions::default(), cancellation);
        let _ = parser.parse_program();
        assert!(parser.had_fatal_error());
    }
}
