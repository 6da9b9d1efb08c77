/// Every terminal and the handful of pseudo-terminals (`EOF`, `ERROR_TOKEN`)
/// the token source can hand the parser. Named after the ECMAScript grammar
/// production or lexical goal symbol it corresponds to; `jsc_parser::token_set`
/// exposes a `T![...]` macro over this enum for terse token matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u16)]
pub enum SyntaxKind {
    EOF,
    ERROR_TOKEN,

    // literals
    IDENT,
    PRIVATE_NAME,
    NUMBER,
    BIGINT,
    STRING,
    REGEX,
    TEMPLATE_CHUNK,
    TEMPLATE_HEAD,
    TEMPLATE_MIDDLE,
    TEMPLATE_TAIL,
    NO_SUBSTITUTION_TEMPLATE,
    JSX_TEXT,

    // keywords
    BREAK_KW,
    CASE_KW,
    CATCH_KW,
    CLASS_KW,
    CONST_KW,
    CONTINUE_KW,
    DEBUGGER_KW,
    DEFAULT_KW,
    DELETE_KW,
    DO_KW,
    ELSE_KW,
    EXPORT_KW,
    EXTENDS_KW,
    FINALLY_KW,
    FOR_KW,
    FUNCTION_KW,
    IF_KW,
    IMPORT_KW,
    IN_KW,
    INSTANCEOF_KW,
    NEW_KW,
    RETURN_KW,
    SUPER_KW,
    SWITCH_KW,
    THIS_KW,
    THROW_KW,
    TRY_KW,
    TYPEOF_KW,
    VAR_KW,
    VOID_KW,
    WHILE_KW,
    WITH_KW,

    // contextual keywords (identifier-or-keyword depending on position)
    ASYNC_KW,
    AWAIT_KW,
    FROM_KW,
    GET_KW,
    LET_KW,
    OF_KW,
    SET_KW,
    STATIC_KW,
    YIELD_KW,
    AS_KW,
    USING_KW,
    ACCESSOR_KW,

    // punctuation
    L_CURLY,
    R_CURLY,
    L_PAREN,
    R_PAREN,
    L_BRACK,
    R_BRACK,
    SEMICOLON,
    COMMA,
    DOT,
    DOT2DOT, // `...`
    QUESTION,
    QUESTION_DOT,
    QUESTION2, // `??`
    QUESTION2EQ,
    COLON,
    ARROW, // `=>`
    EQ,
    EQ2,
    EQ3,
    NEQ,
    NEQ2,
    PLUS,
    PLUSEQ,
    PLUS2,
    MINUS,
    MINUSEQ,
    MINUS2,
    STAR,
    STAREQ,
    STAR2, // `**`
    STAR2EQ,
    SLASH,
    SLASHEQ,
    PERCENT,
    PERCENTEQ,
    AMP,
    AMPEQ,
    AMP2,
    AMP2EQ,
    PIPE,
    PIPEEQ,
    PIPE2,
    PIPE2EQ,
    CARET,
    CARETEQ,
    BANG,
    TILDE,
    LT,
    LTEQ,
    LT2,
    LT2EQ,
    GT,
    GTEQ,
    GT2,
    GT2EQ,
    GT3,
    GT3EQ,
    AT, // decorators (parsed, never interpreted — no decorator lowering is in scope)

    // whitespace/comments surfaced only because ASI needs to know about
    // line breaks; the concrete lexer folds them away otherwise.
    LINE_BREAK,
    COMMENT,
    SHEBANG,
}

impl SyntaxKind {
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::BREAK_KW
                | Self::CASE_KW
                | Self::CATCH_KW
                | Self::CLASS_KW
                | Self::CONST_KW
                | Self::CONTINUE_KW
                | Self::DEBUGGER_KW
                | Self::DEFAULT_KW
                | Self::DELETE_KW
                | Self::DO_KW
                | Self::ELSE_KW
                | Self::EXPORT_KW
                | Self::EXTENDS_KW
                | Self::FINALLY_KW
                | Self::FOR_KW
                | Self::FUNCTION_KW
                | Self::IF_KW
                | Self::IMPORT_KW
                | Self::IN_KW
                | Self::INSTANCEOF_KW
                | Self::NEW_KW
                | Self::RETURN_KW
                | Self::SUPER_KW
                | Self::SWITCH_KW
                | Self::THIS_KW
                | Self::THROW_KW
                | Self::TRY_KW
                | Self::TYPEOF_KW
                | Self::VAR_KW
                | Self::VOID_KW
                | Self::WHILE_KW
                | Self::WITH_KW
        )
    }

    /// Reserved only in strict mode / module code.
    pub const fn is_strict_reserved(self) -> bool {
        matches!(
            self,
            Self::LET_KW | Self::STATIC_KW | Self::YIELD_KW // plus the identifier-text-based set (`eval`, `arguments`, `implements`, …) checked by name, not kind
        )
    }

    pub const fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            Self::ASYNC_KW
                | Self::AWAIT_KW
                | Self::FROM_KW
                | Self::GET_KW
                | Self::LET_KW
                | Self::OF_KW
                | Self::SET_KW
                | Self::STATIC_KW
                | Self::YIELD_KW
                | Self::AS_KW
                | Self::USING_KW
                | Self::ACCESSOR_KW
        )
    }

    /// Tokens after which a `/` starts a division, not a regex literal.
    pub const fn ends_primary_expression(self) -> bool {
        matches!(
            self,
            Self::IDENT
                | Self::NUMBER
                | Self::BIGINT
                | Self::STRING
                | Self::NO_SUBSTITUTION_TEMPLATE
                | Self::TEMPLATE_TAIL
                | Self::R_PAREN
                | Self::R_BRACK
                | Self::R_CURLY
                | Self::THIS_KW
                | Self::SUPER_KW
                | Self::PLUS2
                | Self::MINUS2
        )
    }
}
