use crate::kind::SyntaxKind;
use jsc_rowan::TextRange;

/// A lookahead-1 token: `(kind, range)` plus a decoded payload for literals.
/// The byte-level scanning that produces these is an external collaborator;
/// this type is the contract the core parser consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    /// True when at least one line break separates this token from the
    /// previous one — the only whitespace fact automatic semicolon
    /// insertion needs.
    pub preceded_by_line_break: bool,
    pub payload: TokenPayload,
}

impl Token {
    pub fn new(kind: SyntaxKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            preceded_by_line_break: false,
            payload: TokenPayload::None,
        }
    }

    pub fn with_line_break(mut self, preceded: bool) -> Self {
        self.preceded_by_line_break = preceded;
        self
    }

    pub fn with_payload(mut self, payload: TokenPayload) -> Self {
        self.payload = payload;
        self
    }
}

/// Decoded literal payload. `String`'s `value` may contain unpaired UTF-16
/// surrogates, preserved verbatim rather than replaced or rejected;
/// `Template`'s `cooked` is `None` when the cooked form is invalid (e.g. a
/// bad escape), per a tagged template's ability to receive a raw-only part.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenPayload {
    None,
    Ident(String),
    String { value: String, raw: String },
    Number(f64),
    BigInt(String),
    Template { cooked: Option<String>, raw: String },
    Regex { pattern: String, flags: String },
}

/// A single `TokenKind` abstraction used by the recovery/`TokenSet` machinery
/// where only the kind (not the full token) is needed.
pub type TokenKind = SyntaxKind;
