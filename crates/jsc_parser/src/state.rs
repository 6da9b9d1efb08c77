//! Grammar-parameter context flags and per-file parser state. The context
//! flags are the `[In]`/`[Yield]`/`[Await]`/`[Return]` grammar parameters
//! the ECMAScript grammar threads through every production; carried as a
//! `bitflags` set rather than extra function parameters so a production
//! that doesn't care about a given parameter never has to plumb it
//! through. `ParserState` is the rest of the per-file state that isn't
//! naturally scoped to one production: strict-mode-ness, the label set for
//! `break`/`continue` validation, and whether the file has committed to
//! module grammar.

use bitflags::bitflags;
use jsc_syntax::scope::StrictReason;

bitflags! {
    /// Grammar parameters in effect at the current parse position. Pushed
    /// and popped around productions that change them (function bodies
    /// reset `[Yield]`/`[Await]` to the new function's own async/generator-ness,
    /// `for` headers toggle `[In]` off while parsing the init clause, …).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParserContext: u16 {
        /// `in` is a valid relational operator (off inside a C-style `for`
        /// head's init expression).
        const IN = 1 << 0;
        /// `yield` is a keyword introducing a `YieldExpression`, not a
        /// plain identifier (inside a generator body).
        const YIELD = 1 << 1;
        /// `await` is a keyword introducing an `AwaitExpression`, not a
        /// plain identifier (inside an async function body, or top-level
        /// await in a module).
        const AWAIT = 1 << 2;
        /// `return` is valid directly in this context (inside a function
        /// body; off at the top level of a script/module).
        const RETURN = 1 << 3;
        /// Inside a class's `extends` clause or constructor before `super()`
        /// has executed; `super(...)` call syntax is conditionally valid.
        const DERIVED_CONSTRUCTOR = 1 << 4;
        /// Inside *any* class body — `super.prop` member access is valid,
        /// `new.target` is valid.
        const IN_CLASS = 1 << 5;
        /// Inside a function body somewhere — governs `new.target` and
        /// whether a bare `return` is a syntax error.
        const IN_FUNCTION = 1 << 6;
        /// Inside a loop or switch body — governs whether a bare
        /// `break;` is valid.
        const IN_BREAKABLE = 1 << 7;
        /// Inside a loop body specifically — governs whether a bare
        /// `continue;` is valid.
        const IN_ITERATION = 1 << 8;
        /// Inside a parameter list — `yield`/`await` expressions and
        /// `ArrowFunction`s in default values have their own restrictions.
        const IN_PARAMETERS = 1 << 9;
        /// Source is parsed as a module (top-level `import`/`export`
        /// legal, implicit strict mode, `await` reserved at top level).
        const MODULE = 1 << 10;
        /// `using`/`await using` in a `for` head are parsed but flagged
        /// unusable under this context (target lacks top-level `await`
        /// support — see repo design notes for the disposal-lowering
        /// boundary).
        const DISALLOW_USING_DECLARATION = 1 << 11;
    }
}

impl ParserContext {
    /// The context a fresh top-level script/module body starts in.
    pub fn top_level(is_module: bool) -> Self {
        let mut ctx = Self::IN;
        if is_module {
            ctx |= Self::MODULE | Self::AWAIT;
        }
        ctx
    }

    /// The context entered for a function body, inheriting `[In]` from the
    /// caller but resetting `[Yield]`/`[Await]`/`[Return]` to the new
    /// function's own async/generator-ness.
    pub fn for_function_body(self, is_async: bool, is_generator: bool) -> Self {
        let mut ctx = (self & Self::MODULE) | Self::IN | Self::RETURN | Self::IN_FUNCTION;
        if is_async {
            ctx |= Self::AWAIT;
        }
        if is_generator {
            ctx |= Self::YIELD;
        }
        ctx
    }

    pub fn with_in(self, value: bool) -> Self {
        self.with_flag(Self::IN, value)
    }

    pub fn with_flag(self, flag: Self, value: bool) -> Self {
        if value {
            self | flag
        } else {
            self & !flag
        }
    }
}

/// Tracks whether the current production is strict and, if so, why — for
/// the "strict mode triggered by ... here" note the validator attaches when
/// it escalates a warning into an error. Reuses
/// [`jsc_syntax::scope::StrictReason`], the same enum each
/// [`jsc_syntax::scope::Scope`] records its own strictness against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictMode {
    reason: Option<StrictReason>,
}

impl StrictMode {
    pub fn sloppy() -> Self {
        Self { reason: None }
    }

    pub fn strict(reason: StrictReason) -> Self {
        Self { reason: Some(reason) }
    }

    pub fn is_strict(self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(self) -> Option<StrictReason> {
        self.reason
    }
}

/// Per-file state that doesn't naturally nest with `ParserContext` pushes:
/// the active label set, the innermost-function's strict-mode-ness once
/// known, and how many fatal errors have fired — capped so a pathological
/// input can't spin recovery forever.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub strict: StrictMode,
    /// Labels currently in scope, innermost last, with whether each labels
    /// an iteration statement (relevant to `continue label;` validation).
    pub labels: Vec<(String, bool)>,
    pub speculative_diagnostics_depth: u32,
}

impl ParserState {
    pub fn new(strict: StrictMode) -> Self {
        Self {
            strict,
            labels: Vec::new(),
            speculative_diagnostics_depth: 0,
        }
    }

    pub fn push_label(&mut self, name: String, is_iteration: bool) {
        self.labels.push((name, is_iteration));
    }

    pub fn pop_label(&mut self) {
        self.labels.pop();
    }

    pub fn find_label(&self, name: &str) -> Option<bool> {
        self.labels
            .iter()
            .rev()
            .find(|(label, _)| label == name)
            .map(|(_, is_iteration)| *is_iteration)
    }

    pub fn label_is_duplicate(&self, name: &str) -> bool {
        self.labels.iter().any(|(label, _)| label == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_module_implies_await_and_strict_flags() {
        let ctx = ParserContext::top_level(true);
        assert!(ctx.contains(ParserContext::MODULE));
        assert!(ctx.contains(ParserContext::AWAIT));
        assert!(!ctx.contains(ParserContext::YIELD));
    }

    #[test]
    fn function_body_resets_yield_await() {
        let ctx = ParserContext::top_level(false).for_function_body(true, false);
        assert!(ctx.contains(ParserContext::AWAIT));
        assert!(!ctx.contains(ParserContext::YIELD));
        assert!(ctx.contains(ParserContext::RETURN));
    }

    #[test]
    fn label_lookup_finds_innermost_last() {
        let mut state = ParserState::new(StrictMode::sloppy());
        state.push_label("outer".into(), true);
        state.push_label("inner".into(), false);
        assert_eq!(state.find_label("inner"), Some(false));
        assert!(state.label_is_duplicate("outer"));
    }
}
