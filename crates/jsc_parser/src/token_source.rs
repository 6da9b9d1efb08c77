//! The external token-source contract. The core parser only ever asks for
//! the current token, the next
//! token (for 1-token lookahead), and occasionally asks the source to
//! re-interpret the token it just produced under a different lexical goal
//! symbol — regex literal, JSX text/child, or a template continuation after
//! `}`. A byte-level tokenizer that already exists in a host toolchain can
//! implement this trait directly instead of using [`crate::lexer::Lexer`].

use jsc_syntax::Token;

/// Which lexical goal symbol a re-scan should use. JS's grammar is
/// context-sensitive at the *lexer* level for these three cases; the
/// parser decides
/// which context applies and asks the source to re-tokenize from the same
/// starting offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReLexContext {
    /// `/` at the start of a primary expression begins a regex literal.
    Regex,
    /// Inside a `</tag>...` JSX child position, text runs until `{`, `<`,
    /// or `}` (the last surfaced as a warning: a bare `}` inside JSX text).
    JsxChild,
    /// After an interpolation's closing `}`, continue scanning a template
    /// literal (`TEMPLATE_MIDDLE`/`TEMPLATE_TAIL`) instead of starting a
    /// fresh token from `}`.
    TemplateTail,
}

pub trait TokenSource {
    /// The token at the current position.
    fn current(&self) -> &Token;

    /// The token immediately after `current()`, without consuming it
    /// (1-token lookahead).
    fn lookahead(&self) -> &Token;

    /// Advance past `current()`, making `lookahead()`'s token current.
    fn bump(&mut self);

    /// Re-scan starting at `current()`'s start offset under `ctx`,
    /// replacing both `current()` and `lookahead()`.
    fn relex(&mut self, ctx: ReLexContext);

    /// Byte range of the whole source buffer being tokenized, used by the
    /// parser to report EOF-relative ranges for fatal errors.
    fn source_len(&self) -> u32;

    /// The raw source text for a range, used by identifier-text comparisons
    /// (`let`-as-identifier, reserved-word checks) that need the exact
    /// spelling rather than just the token kind.
    fn text(&self, range: jsc_rowan::TextRange) -> &str;

    /// Byte offset `current()` starts at — the resumption point for
    /// [`TokenSource::rewind`]. Used for the parser's speculative-parse
    /// checkpoints (arrow-parameter-list vs. parenthesized expression,
    /// object-literal vs. destructuring pattern).
    fn position(&self) -> u32;

    /// Re-tokenizes from `pos` (a value previously returned by
    /// [`TokenSource::position`]), discarding any diagnostics or state the
    /// source itself doesn't track externally. The parser is responsible for
    /// rewinding its own diagnostic sink/arena length alongside this.
    fn rewind(&mut self, pos: u32);
}
