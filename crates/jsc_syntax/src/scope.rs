use crate::symbol::SymbolId;
use jsc_rowan::{Idx, Name, TextRange};
use rustc_hash::FxHashMap;

pub type ScopeId = Idx<Scope>;

/// A lexical scope: one node in the nested function/block/class/catch tree.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub members: FxHashMap<Name, SymbolId>,
    /// Compiler-introduced bindings (lowering/mangler temporaries) that live
    /// in this scope but aren't reachable by source-level name lookup.
    pub generated: Vec<SymbolId>,
    pub label_statements: Vec<LabelBinding>,
    pub contains_direct_eval: bool,
    pub is_strict: bool,
    pub strict_reason: Option<StrictReason>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            members: FxHashMap::default(),
            generated: Vec::new(),
            label_statements: Vec::new(),
            contains_direct_eval: false,
            is_strict: false,
            strict_reason: None,
        }
    }

    /// True for the kinds of scope that `var` declarations hoist to: the
    /// nearest enclosing function (or module top level).
    pub fn is_hoist_target(&self) -> bool {
        matches!(
            self.kind,
            ScopeKind::Function | ScopeKind::ModuleTopLevel | ScopeKind::FunctionArgs
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Block,
    Function,
    FunctionArgs,
    Catch,
    CatchBinding,
    Class,
    ClassStaticInit,
    With,
    For,
    ModuleTopLevel,
}

/// Why a scope (and everything textually nested in it) is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictReason {
    UseStrictDirective,
    ClassBody,
    Module,
}

#[derive(Debug, Clone)]
pub struct LabelBinding {
    pub name: Name,
    pub range: TextRange,
    /// Whether `continue` may legally target this label (only loop bodies).
    pub is_iteration_statement: bool,
}
