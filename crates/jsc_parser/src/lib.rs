//! A fast, error-tolerant parser and semantic lowering engine for
//! JavaScript, JSX, and the ECMAScript-module grammar.
//!
//! The crate consumes a lookahead-1 [`TokenSource`] and produces a typed
//! [`jsc_syntax::ast`] tree whose identifier uses are already resolved
//! against a [`ScopeTree`]/[`SymbolTable`], with two optional passes layered
//! on top:
//!
//! - [`mangler`] folds constants, eliminates dead branches, and inlines
//!   single-use locals without changing observable behavior.
//! - [`lower`] rewrites syntax the configured [`options::FeatureSet`]
//!   doesn't support (optional chaining, nullish coalescing, class fields,
//!   …) into equivalent lower-level constructs.
//!
//! # Parsing a single node
//!
//! Parse rules are named `parse_*`, take `&mut Parser` (plus whatever
//! context flags the production needs), and return [`ParsedSyntax<T>`]:
//! `Present(t)` once at least one token was consumed toward the production,
//! `Absent` when the rule didn't recognize its first token and must not
//! have advanced the parser at all. Each rule builds typed arena nodes
//! directly as it recognizes them, rather than emitting events to be
//! resolved into an untyped CST afterward.
//!
//! # Parsing lists & error recovery
//!
//! List-parsing loops must make progress every iteration; when
//! `parse_element` returns `Absent`, call [`Parser::recover`] with a
//! [`TokenSet`] of tokens that end the list so a malformed element doesn't
//! spin the loop forever — the parser skips ahead to the next statement
//! boundary instead.
//!
//! # Conditional syntax
//!
//! Some productions parse successfully but aren't valid in the current
//! file (`with` in strict mode, JSX outside a `.jsx`/`.tsx` loader). These
//! go through [`SyntaxFeature::exclusive_syntax`]/[`excluding_syntax`],
//! which still parses the full production (for perfect error recovery) but
//! attaches a diagnostic and flags the node unusable instead of silently
//! rejecting the input.

pub mod ascii;
pub mod cancellation;
pub mod diagnostics;
pub mod lexer;
pub mod lower;
pub mod mangler;
pub mod options;
pub mod parser;
pub mod scope_tree;
pub mod state;
pub mod symbol_table;
pub mod syntax;
pub mod token_set;
pub mod token_source;
pub mod validator;

pub use diagnostics::{Diagnostic, DiagnosticSink, Note, Severity};
pub use options::{FeatureSet, JsxOptions, Loader, ParseOptions};
pub use parser::{Parser, ParsedSyntax};
pub use scope_tree::ScopeTree;
pub use symbol_table::SymbolTable;
pub use token_source::{ReLexContext, TokenSource};

use jsc_rowan::Interner;
use jsc_syntax::ast::{AstArena, StmtId};

/// Everything a printer/bundler needs once parsing finishes: the root
/// statement list, the arena that owns every node, and the resolved
/// symbol/scope tables.
pub struct ParseResult {
    pub arena: AstArena,
    pub symbols: SymbolTable,
    pub scopes: ScopeTree,
    pub body: Vec<StmtId>,
    pub diagnostics: DiagnosticSink,
    /// Every interned `Name` used by `arena`/`symbols`/`scopes`; a printer
    /// resolves identifiers back to text through this.
    pub interner: Interner,
    /// Set when a fatal error cut parsing short; `body` still holds
    /// whatever was recovered before that point.
    pub had_fatal_error: bool,
}

/// Parse `source` as a script or module per `options.is_strict`/the
/// presence of module-entailing constructs, running the mangler and
/// lowerer afterward if configured. Uses the crate's own
/// minimal [`lexer::Lexer`] as the token source; callers with a richer
/// external tokenizer should drive [`Parser::new`] directly instead.
#[tracing::instrument(skip(source))]
pub fn parse(source: &str, options: ParseOptions) -> ParseResult {
    let cancellation = cancellation::CancellationToken::new();
    let lexer = lexer::Lexer::new(source);
    let mut parser = Parser::new(lexer, options.clone(), cancellation);
    let body = parser.parse_program();
    let (arena, symbols, mut scopes, mut diagnostics, interner, had_fatal_error) = parser.finish();

    validator::run_finalization_pass(&arena, &symbols, &mut scopes, &body, &mut diagnostics);

    let mut arena = arena;
    let mut body = body;
    let mut symbols = symbols;
    let mut interner = interner;
    if options.mangle_syntax {
        mangler::Mangler::new(&mut arena, &symbols, &interner).run(&mut body);
    }
    if !options.target_features.nothing_unsupported() {
        lower::Lowerer::new(&mut arena, &mut scopes, &mut symbols, &mut interner, options.target_features)
            .run(&mut body);
    }

    ParseResult {
        arena,
        symbols,
        scopes,
        body,
        diagnostics,
        interner,
        had_fatal_error,
    }
}
