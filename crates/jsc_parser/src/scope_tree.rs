//! Scope stack and hoist-target resolution. The tree is append-only like
//! the symbol table: closing a scope doesn't
//! remove it, it just pops it off the *active* stack, so every `ScopeId`
//! handed out during parsing stays valid for the lowerer/mangler passes
//! that run afterward.

use jsc_rowan::Name;
use jsc_syntax::scope::{LabelBinding, Scope, ScopeId, ScopeKind, StrictReason};
use jsc_syntax::symbol::SymbolId;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: jsc_rowan::Arena<Scope>,
    /// Currently-open scopes, innermost last. Empty between `parse()` calls;
    /// only meaningful while a `Parser` is actively walking the tree.
    active: Vec<ScopeId>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter()
    }

    pub fn current(&self) -> ScopeId {
        *self
            .active
            .last()
            .expect("open_scope must be called before current()")
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Opens a new scope nested under the current top of the active stack
    /// (or with no parent, for the module/script root), pushes it, and
    /// returns its id.
    pub fn open_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.active.last().copied();
        let mut scope = Scope::new(kind, parent);
        if let Some(parent_id) = parent {
            scope.is_strict = self.scopes[parent_id].is_strict;
            scope.strict_reason = self.scopes[parent_id].strict_reason;
        }
        let id = self.scopes.alloc(scope);
        self.active.push(id);
        id
    }

    /// Closes the innermost open scope. Must match the most recent
    /// `open_scope` call (LIFO), asserted in debug builds.
    pub fn close_scope(&mut self) -> ScopeId {
        self.active.pop().expect("close_scope without matching open_scope")
    }

    pub fn mark_strict(&mut self, id: ScopeId, reason: StrictReason) {
        let scope = &mut self.scopes[id];
        scope.is_strict = true;
        scope.strict_reason = Some(reason);
    }

    /// Nearest enclosing scope (including `from`) that hoisted `var`s and
    /// function declarations land in.
    pub fn hoist_target(&self, from: ScopeId) -> ScopeId {
        let mut current = from;
        loop {
            if self.scopes[current].is_hoist_target() {
                return current;
            }
            match self.scopes[current].parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Declares `symbol` as `name` in `scope`, applying the redeclaration
    /// rules. Returns the existing conflicting symbol, if
    /// any, instead of installing the new one — callers still keep the
    /// freshly-allocated `Symbol` in the table (it's referenced from the
    /// AST regardless) but the validator uses the conflict to emit a
    /// diagnostic.
    pub fn declare(
        &mut self,
        symbols: &mut crate::symbol_table::SymbolTable,
        scope: ScopeId,
        name: Name,
        symbol: SymbolId,
    ) -> Option<SymbolId> {
        let existing = self.scopes[scope].members.get(&name).copied();
        match existing {
            Some(existing_id) => {
                let existing_kind = symbols.get(existing_id).kind;
                let new_kind = symbols.get(symbol).kind;
                if crate::symbol_table::SymbolTable::kinds_may_coexist(existing_kind, new_kind) {
                    self.scopes[scope].members.insert(name, symbol);
                    None
                } else {
                    Some(existing_id)
                }
            }
            None => {
                self.scopes[scope].members.insert(name, symbol);
                None
            }
        }
    }

    /// Declares a `var`/hoisted-function binding directly into its hoist
    /// target rather than the current (possibly nested block) scope.
    pub fn declare_hoisted(
        &mut self,
        symbols: &mut crate::symbol_table::SymbolTable,
        from: ScopeId,
        name: Name,
        symbol: SymbolId,
    ) -> Option<SymbolId> {
        let target = self.hoist_target(from);
        self.declare(symbols, target, name, symbol)
    }

    pub fn declare_generated(&mut self, scope: ScopeId, symbol: SymbolId) {
        self.scopes[scope].generated.push(symbol);
    }

    /// Walks outward from `from` looking up `name`, per ordinary lexical
    /// scoping. Returns `None` when nothing binds it — the caller installs
    /// an `Unbound` symbol for the use.
    pub fn resolve(&self, from: ScopeId, name: Name) -> Option<SymbolId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if let Some(&symbol) = self.scopes[id].members.get(&name) {
                return Some(symbol);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    pub fn push_label(&mut self, scope: ScopeId, binding: LabelBinding) {
        self.scopes[scope].label_statements.push(binding);
    }

    pub fn mark_direct_eval(&mut self, scope: ScopeId) {
        self.scopes[scope].contains_direct_eval = true;
        let mut current = Some(scope);
        while let Some(id) = current {
            self.scopes[id].contains_direct_eval = true;
            current = self.scopes[id].parent;
        }
    }

    pub fn snapshot_members(&self, scope: ScopeId) -> FxHashMap<Name, SymbolId> {
        self.scopes[scope].members.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScopeGuard {
    pub id: ScopeId,
}

impl ScopeTree {
    /// RAII-flavored helper: open now, remember to close later via
    /// [`ScopeTree::close_scope`] at the call site (Rust has no reliable
    /// `Drop`-based access back into `&mut self`, so this is a plain
    /// value rather than an actual guard).
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeGuard {
        ScopeGuard {
            id: self.open_scope(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_table::{new_symbol, SymbolTable};
    use jsc_rowan::{Interner, TextRange};
    use jsc_syntax::symbol::SymbolKind;

    #[test]
    fn resolve_walks_outward_through_parents() {
        let mut tree = ScopeTree::new();
        let mut symbols = SymbolTable::new();
        let mut interner = Interner::new();
        let name = interner.intern("x");

        let outer = tree.open_scope(ScopeKind::ModuleTopLevel);
        let sym = symbols.alloc(new_symbol(name, SymbolKind::Let, TextRange::empty(0u32.into())));
        tree.declare(&mut symbols, outer, name, sym);

        let inner = tree.open_scope(ScopeKind::Block);
        assert_eq!(tree.resolve(inner, name), Some(sym));
        tree.close_scope();
        tree.close_scope();
    }

    #[test]
    fn var_hoists_past_blocks_to_function_scope() {
        let mut tree = ScopeTree::new();
        let mut symbols = SymbolTable::new();
        let mut interner = Interner::new();
        let name = interner.intern("x");

        let func = tree.open_scope(ScopeKind::Function);
        let block = tree.open_scope(ScopeKind::Block);
        let sym = symbols.alloc(new_symbol(name, SymbolKind::Var, TextRange::empty(0u32.into())));
        tree.declare_hoisted(&mut symbols, block, name, sym);

        assert!(tree.get(func).members.contains_key(&name));
        assert!(!tree.get(block).members.contains_key(&name));
        tree.close_scope();
        tree.close_scope();
    }

    #[test]
    fn redeclaring_let_over_let_conflicts() {
        let mut tree = ScopeTree::new();
        let mut symbols = SymbolTable::new();
        let mut interner = Interner::new();
        let name = interner.intern("x");

        let scope = tree.open_scope(ScopeKind::Block);
        let first = symbols.alloc(new_symbol(name, SymbolKind::Let, TextRange::empty(0u32.into())));
        tree.declare(&mut symbols, scope, name, first);
        let second = symbols.alloc(new_symbol(name, SymbolKind::Let, TextRange::empty(1u32.into())));
        let conflict = tree.declare(&mut symbols, scope, name, second);
        assert_eq!(conflict, Some(first));
        tree.close_scope();
    }
}
