//! A minimal, self-contained scanner implementing [`TokenSource`]. Not the
//! "byte-level tokenizer" the spec calls out as an external collaborator in
//! spirit — it exists so this crate is buildable and testable end to end
//! without bringing in a separate tokenizer crate. It covers plain ASCII
//! identifiers, decimal/hex/octal/binary numbers, single/double-quoted
//! strings with common escapes, line/block comments, template literals, and
//! every punctuator the parser needs; it does not attempt full Unicode
//! identifier classification, exact `f64` literal parsing edge cases, or
//! JSX-entity decoding. A host with a richer tokenizer implements
//! [`TokenSource`] directly and skips this module entirely.

use crate::token_source::{ReLexContext, TokenSource};
use jsc_rowan::TextRange;
use jsc_syntax::token::TokenPayload;
use jsc_syntax::{SyntaxKind, Token};

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: u32,
    current: Token,
    lookahead: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut lexer = Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            current: Token::new(SyntaxKind::EOF, TextRange::empty(0u32.into())),
            lookahead: Token::new(SyntaxKind::EOF, TextRange::empty(0u32.into())),
        };
        lexer.current = lexer.scan();
        lexer.lookahead = lexer.scan();
        lexer
    }

    fn peek_byte(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    fn advance_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte(0)?;
        self.pos += 1;
        Some(b)
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || b == b'$'
    }

    fn is_ident_continue(b: u8) -> bool {
        Self::is_ident_start(b) || b.is_ascii_digit()
    }

    /// Skips whitespace/comments; returns whether a line break was crossed,
    /// which is all ASI (spec Glossary) needs to know about trivia.
    fn skip_trivia(&mut self) -> bool {
        let mut saw_line_break = false;
        loop {
            match self.peek_byte(0) {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.pos += 1;
                }
                Some(b'\n') => {
                    saw_line_break = true;
                    self.pos += 1;
                }
                Some(b'/') if self.peek_byte(1) == Some(b'/') => {
                    while !matches!(self.peek_byte(0), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_byte(1) == Some(b'*') => {
                    self.pos += 2;
                    while let Some(b) = self.peek_byte(0) {
                        if b == b'*' && self.peek_byte(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        if b == b'\n' {
                            saw_line_break = true;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        saw_line_break
    }

    fn scan(&mut self) -> Token {
        let line_break = self.skip_trivia();
        let start = self.pos;
        let Some(b) = self.peek_byte(0) else {
            return Token::new(SyntaxKind::EOF, TextRange::empty(start.into()))
                .with_line_break(line_break);
        };

        let token = if Self::is_ident_start(b) {
            self.scan_ident_or_keyword(start)
        } else if b.is_ascii_digit() {
            self.scan_number(start)
        } else if b == b'"' || b == b'\'' {
            self.scan_string(start, b)
        } else if b == b'`' {
            self.scan_template_chunk(start, true)
        } else if b == b'#' {
            self.pos += 1;
            while matches!(self.peek_byte(0), Some(c) if Self::is_ident_continue(c)) {
                self.pos += 1;
            }
            self.make(SyntaxKind::PRIVATE_NAME, start)
        } else {
            self.scan_punctuator(start)
        };
        token.with_line_break(line_break)
    }

    fn make(&self, kind: SyntaxKind, start: u32) -> Token {
        Token::new(kind, TextRange::at(start.into(), (self.pos - start).into()))
    }

    fn text_from(&self, start: u32) -> &'a str {
        &self.src[start as usize..self.pos as usize]
    }

    fn scan_ident_or_keyword(&mut self, start: u32) -> Token {
        while matches!(self.peek_byte(0), Some(b) if Self::is_ident_continue(b)) {
            self.pos += 1;
        }
        let text = self.text_from(start);
        let kind = keyword_kind(text).unwrap_or(SyntaxKind::IDENT);
        self.make(kind, start)
            .with_payload(TokenPayload::Ident(text.to_string()))
    }

    fn scan_number(&mut self, start: u32) -> Token {
        if self.peek_byte(0) == Some(b'0')
            && matches!(self.peek_byte(1), Some(b'x') | Some(b'X') | Some(b'o') | Some(b'O') | Some(b'b') | Some(b'B'))
        {
            self.pos += 2;
            while matches!(self.peek_byte(0), Some(b) if b.is_ascii_alphanumeric()) {
                self.pos += 1;
            }
        } else {
            while matches!(self.peek_byte(0), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
            if self.peek_byte(0) == Some(b'.') {
                self.pos += 1;
                while matches!(self.peek_byte(0), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            if matches!(self.peek_byte(0), Some(b'e') | Some(b'E')) {
                self.pos += 1;
                if matches!(self.peek_byte(0), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                while matches!(self.peek_byte(0), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        if self.peek_byte(0) == Some(b'n') {
            self.pos += 1;
            let text = self.text_from(start);
            return self
                .make(SyntaxKind::BIGINT, start)
                .with_payload(TokenPayload::BigInt(text.trim_end_matches('n').to_string()));
        }
        let text = self.text_from(start);
        let value = parse_numeric_literal(text);
        self.make(SyntaxKind::NUMBER, start)
            .with_payload(TokenPayload::Number(value))
    }

    fn scan_string(&mut self, start: u32, quote: u8) -> Token {
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek_byte(0) {
                None => break,
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.advance_byte() {
                        value.push(decode_simple_escape(escaped));
                    }
                }
                Some(_) => {
                    let ch_start = self.pos as usize;
                    let ch = self.src[ch_start..].chars().next().unwrap_or('\u{FFFD}');
                    self.pos += ch.len_utf8() as u32;
                    value.push(ch);
                }
            }
        }
        let raw = self.text_from(start).to_string();
        self.make(SyntaxKind::STRING, start)
            .with_payload(TokenPayload::String { value, raw })
    }

    /// Scans from `` ` `` or from a `}` that closes an interpolation back
    /// into template text, up to the next `${` or the closing `` ` ``.
    /// `is_head` selects `NO_SUBSTITUTION_TEMPLATE`/`TEMPLATE_HEAD` vs.
    /// `TEMPLATE_MIDDLE`/`TEMPLATE_TAIL` for the resulting kind.
    fn scan_template_chunk(&mut self, start: u32, is_head: bool) -> Token {
        self.pos += 1; // opening ` or }
        let mut cooked = String::new();
        let mut invalid = false;
        let kind = loop {
            match self.peek_byte(0) {
                None => break if is_head { SyntaxKind::NO_SUBSTITUTION_TEMPLATE } else { SyntaxKind::TEMPLATE_TAIL },
                Some(b'`') => {
                    self.pos += 1;
                    break if is_head {
                        SyntaxKind::NO_SUBSTITUTION_TEMPLATE
                    } else {
                        SyntaxKind::TEMPLATE_TAIL
                    };
                }
                Some(b'$') if self.peek_byte(1) == Some(b'{') => {
                    self.pos += 2;
                    break if is_head {
                        SyntaxKind::TEMPLATE_HEAD
                    } else {
                        SyntaxKind::TEMPLATE_MIDDLE
                    };
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.advance_byte() {
                        Some(e) => cooked.push(decode_simple_escape(e)),
                        None => invalid = true,
                    }
                }
                Some(_) => {
                    let ch_start = self.pos as usize;
                    let ch = self.src[ch_start..].chars().next().unwrap_or('\u{FFFD}');
                    self.pos += ch.len_utf8() as u32;
                    cooked.push(ch);
                }
            }
        };
        let raw = self.text_from(start).to_string();
        self.make(kind, start).with_payload(TokenPayload::Template {
            cooked: if invalid { None } else { Some(cooked) },
            raw,
        })
    }

    fn scan_punctuator(&mut self, start: u32) -> Token {
        macro_rules! op {
            ($len:expr, $kind:expr) => {{
                self.pos += $len;
                self.make($kind, start)
            }};
        }
        let b0 = self.bytes[self.pos as usize];
        let b1 = self.peek_byte(1);
        let b2 = self.peek_byte(2);
        use SyntaxKind::*;
        match (b0, b1, b2) {
            (b'.', Some(b'.'), Some(b'.')) => op!(3, DOT2DOT),
            (b'=', Some(b'='), Some(b'=')) => op!(3, EQ3),
            (b'!', Some(b'='), Some(b'=')) => op!(3, NEQ2),
            (b'*', Some(b'*'), Some(b'=')) => op!(3, STAR2EQ),
            (b'<', Some(b'<'), Some(b'=')) => op!(3, LT2EQ),
            (b'>', Some(b'>'), Some(b'>')) if self.peek_byte(3) == Some(b'=') => op!(4, GT3EQ),
            (b'>', Some(b'>'), Some(b'>')) => op!(3, GT3),
            (b'>', Some(b'>'), Some(b'=')) => op!(3, GT2EQ),
            (b'&', Some(b'&'), Some(b'=')) => op!(3, AMP2EQ),
            (b'|', Some(b'|'), Some(b'=')) => op!(3, PIPE2EQ),
            (b'?', Some(b'?'), Some(b'=')) => op!(3, QUESTION2EQ),
            (b'=', Some(b'='), _) => op!(2, EQ2),
            (b'!', Some(b'='), _) => op!(2, NEQ),
            (b'<', Some(b'='), _) => op!(2, LTEQ),
            (b'>', Some(b'='), _) => op!(2, GTEQ),
            (b'+', Some(b'='), _) => op!(2, PLUSEQ),
            (b'-', Some(b'='), _) => op!(2, MINUSEQ),
            (b'*', Some(b'='), _) => op!(2, STAREQ),
            (b'/', Some(b'='), _) => op!(2, SLASHEQ),
            (b'%', Some(b'='), _) => op!(2, PERCENTEQ),
            (b'&', Some(b'='), _) => op!(2, AMPEQ),
            (b'|', Some(b'='), _) => op!(2, PIPEEQ),
            (b'^', Some(b'='), _) => op!(2, CARETEQ),
            (b'+', Some(b'+'), _) => op!(2, PLUS2),
            (b'-', Some(b'-'), _) => op!(2, MINUS2),
            (b'*', Some(b'*'), _) => op!(2, STAR2),
            (b'&', Some(b'&'), _) => op!(2, AMP2),
            (b'|', Some(b'|'), _) => op!(2, PIPE2),
            (b'<', Some(b'<'), _) => op!(2, LT2),
            (b'>', Some(b'>'), _) => op!(2, GT2),
            (b'=', Some(b'>'), _) => op!(2, ARROW),
            (b'?', Some(b'.'), _) if !matches!(b2, Some(d) if d.is_ascii_digit()) => {
                op!(2, QUESTION_DOT)
            }
            (b'?', Some(b'?'), _) => op!(2, QUESTION2),
            (b'{', _, _) => op!(1, L_CURLY),
            (b'}', _, _) => op!(1, R_CURLY),
            (b'(', _, _) => op!(1, L_PAREN),
            (b')', _, _) => op!(1, R_PAREN),
            (b'[', _, _) => op!(1, L_BRACK),
            (b']', _, _) => op!(1, R_BRACK),
            (b';', _, _) => op!(1, SEMICOLON),
            (b',', _, _) => op!(1, COMMA),
            (b'.', _, _) => op!(1, DOT),
            (b'?', _, _) => op!(1, QUESTION),
            (b':', _, _) => op!(1, COLON),
            (b'=', _, _) => op!(1, EQ),
            (b'+', _, _) => op!(1, PLUS),
            (b'-', _, _) => op!(1, MINUS),
            (b'*', _, _) => op!(1, STAR),
            (b'/', _, _) => op!(1, SLASH),
            (b'%', _, _) => op!(1, PERCENT),
            (b'&', _, _) => op!(1, AMP),
            (b'|', _, _) => op!(1, PIPE),
            (b'^', _, _) => op!(1, CARET),
            (b'!', _, _) => op!(1, BANG),
            (b'~', _, _) => op!(1, TILDE),
            (b'<', _, _) => op!(1, LT),
            (b'>', _, _) => op!(1, GT),
            (b'@', _, _) => op!(1, AT),
            _ => op!(1, ERROR_TOKEN),
        }
    }
}

fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    use SyntaxKind::*;
    Some(match text {
        "break" => BREAK_KW,
        "case" => CASE_KW,
        "catch" => CATCH_KW,
        "class" => CLASS_KW,
        "const" => CONST_KW,
        "continue" => CONTINUE_KW,
        "debugger" => DEBUGGER_KW,
        "default" => DEFAULT_KW,
        "delete" => DELETE_KW,
        "do" => DO_KW,
        "else" => ELSE_KW,
        "export" => EXPORT_KW,
        "extends" => EXTENDS_KW,
        "finally" => FINALLY_KW,
        "for" => FOR_KW,
        "function" => FUNCTION_KW,
        "if" => IF_KW,
        "import" => IMPORT_KW,
        "in" => IN_KW,
        "instanceof" => INSTANCEOF_KW,
        "new" => NEW_KW,
        "return" => RETURN_KW,
        "super" => SUPER_KW,
        "switch" => SWITCH_KW,
        "this" => THIS_KW,
        "throw" => THROW_KW,
        "try" => TRY_KW,
        "typeof" => TYPEOF_KW,
        "var" => VAR_KW,
        "void" => VOID_KW,
        "while" => WHILE_KW,
        "with" => WITH_KW,
        "async" => ASYNC_KW,
        "await" => AWAIT_KW,
        "from" => FROM_KW,
        "get" => GET_KW,
        "let" => LET_KW,
        "of" => OF_KW,
        "set" => SET_KW,
        "static" => STATIC_KW,
        "yield" => YIELD_KW,
        "as" => AS_KW,
        "using" => USING_KW,
        "accessor" => ACCESSOR_KW,
        _ => return None,
    })
}

fn decode_simple_escape(byte: u8) -> char {
    match byte {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'b' => '\u{8}',
        b'f' => '\u{C}',
        b'v' => '\u{B}',
        b'0' => '\0',
        other => other as char,
    }
}

fn parse_numeric_literal(text: &str) -> f64 {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).unwrap_or(0) as f64;
    }
    if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        return u64::from_str_radix(oct, 8).unwrap_or(0) as f64;
    }
    if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        return u64::from_str_radix(bin, 2).unwrap_or(0) as f64;
    }
    text.parse().unwrap_or(f64::NAN)
}

impl<'a> TokenSource for Lexer<'a> {
    fn current(&self) -> &Token {
        &self.current
    }

    fn lookahead(&self) -> &Token {
        &self.lookahead
    }

    fn bump(&mut self) {
        self.current = std::mem::replace(&mut self.lookahead, self.scan());
    }

    fn relex(&mut self, ctx: ReLexContext) {
        let start = self.current.range.start().offset();
        self.pos = start;
        self.current = match ctx {
            ReLexContext::Regex => self.scan_regex(start),
            ReLexContext::JsxChild => self.scan_jsx_text(start),
            ReLexContext::TemplateTail => self.scan_template_chunk(start, false),
        };
        self.lookahead = self.scan();
    }

    fn source_len(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn text(&self, range: TextRange) -> &str {
        &self.src[range]
    }

    fn position(&self) -> u32 {
        self.current.range.start().offset()
    }

    fn rewind(&mut self, pos: u32) {
        self.pos = pos;
        self.current = self.scan();
        self.lookahead = self.scan();
    }
}

impl<'a> Lexer<'a> {
    fn scan_regex(&mut self, start: u32) -> Token {
        self.pos += 1; // leading '/'
        let mut in_class = false;
        loop {
            match self.peek_byte(0) {
                None | Some(b'\n') => break,
                Some(b'\\') => {
                    self.pos += 2;
                }
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        let pattern_end = self.pos;
        while matches!(self.peek_byte(0), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let pattern = self.src[(start + 1) as usize..(pattern_end - 1) as usize].to_string();
        let flags = self.src[pattern_end as usize..self.pos as usize].to_string();
        self.make(SyntaxKind::REGEX, start)
            .with_payload(TokenPayload::Regex { pattern, flags })
    }

    fn scan_jsx_text(&mut self, start: u32) -> Token {
        while !matches!(self.peek_byte(0), None | Some(b'<') | Some(b'{') | Some(b'}')) {
            self.pos += 1;
        }
        let text = self.text_from(start).to_string();
        self.make(SyntaxKind::JSX_TEXT, start)
            .with_payload(TokenPayload::Ident(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_and_identifiers() {
        let lexer = Lexer::new("let x = foo");
        assert_eq!(lexer.current().kind, SyntaxKind::LET_KW);
    }

    #[test]
    fn lexes_numbers() {
        let lexer = Lexer::new("0x1F");
        assert_eq!(lexer.current().kind, SyntaxKind::NUMBER);
        assert_eq!(
            lexer.current().payload,
            TokenPayload::Number(31.0)
        );
    }

    #[test]
    fn tracks_line_breaks_for_asi() {
        let mut lexer = Lexer::new("a\nb");
        assert!(!lexer.current().preceded_by_line_break);
        lexer.bump();
        assert!(lexer.current().preceded_by_line_break);
    }
}
