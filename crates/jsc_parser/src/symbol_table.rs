//! Declaration, resolution, and conflict detection for [`Symbol`]s (spec
//! §4.3). The table owns every `Symbol` in the file; [`ScopeTree`] (a
//! separate type, since scopes nest independently of the symbol arena's
//! flat append-only storage) owns the name → symbol maps per scope and
//! calls back into here to allocate/look up.

use jsc_rowan::{Idx, Name, TextRange};
use jsc_syntax::symbol::{Symbol, SymbolFlags, SymbolId, SymbolKind};

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: jsc_rowan::Arena<Symbol>,
}

/// Why [`SymbolTable::declare`] couldn't install a binding as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareConflict {
    /// A `let`/`const`/class/`var` collides with an existing lexical or
    /// `var` binding of the same name in the same scope.
    Redeclaration { existing: SymbolId },
    /// Two private names of non-accessor-pairable kinds collide.
    DuplicatePrivateName { existing: SymbolId },
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.alloc(symbol)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Records that `id` was referenced by a use. Not exact under the
    /// mangler's later deletions, hence "estimate".
    pub fn record_use(&mut self, id: SymbolId) {
        self.symbols[id].use_count_estimate += 1;
    }

    pub fn mark_captured(&mut self, id: SymbolId) {
        self.symbols[id].is_captured = true;
    }

    /// Whether `new_kind` declared where `existing_kind` already lives in
    /// the same scope is legal redeclaration. `var`/`var` and
    /// function/function at sloppy top level are fine; anything crossing a
    /// `var` boundary with a lexical declaration is not, and two lexicals of
    /// any kind never coexist.
    pub fn kinds_may_coexist(existing_kind: SymbolKind, new_kind: SymbolKind) -> bool {
        if existing_kind.is_var_like() && new_kind.is_var_like() {
            return true;
        }
        if existing_kind.is_function_like() && new_kind.is_function_like() {
            return true;
        }
        if let (Some(existing_pair), Some(new_pair)) = (
            existing_kind.private_accessor_pair(),
            new_kind.private_accessor_pair(),
        ) {
            return existing_pair != new_pair || existing_kind != new_kind;
        }
        false
    }
}

impl Idx<Symbol> {
    /// Convenience so call sites can write `symbol_id.name_range(...)`
    /// instead of round-tripping through the table twice.
    pub fn raw(self) -> u32 {
        self.into_raw()
    }
}

pub use jsc_syntax::symbol::{Symbol as SymbolData};

pub fn new_symbol(name: Name, kind: SymbolKind, declaration_range: TextRange) -> Symbol {
    let mut symbol = Symbol::new(name, kind, declaration_range);
    if matches!(kind, SymbolKind::Generated) {
        symbol.flags |= SymbolFlags::DO_NOT_RENAME;
    }
    symbol
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsc_rowan::TextRange;

    fn name(n: u32) -> Name {
        let mut interner = jsc_rowan::Interner::new();
        let _ = n;
        interner.intern("x")
    }

    #[test]
    fn var_var_may_coexist_but_var_let_may_not() {
        assert!(SymbolTable::kinds_may_coexist(SymbolKind::Var, SymbolKind::Var));
        assert!(!SymbolTable::kinds_may_coexist(SymbolKind::Var, SymbolKind::Let));
        assert!(!SymbolTable::kinds_may_coexist(SymbolKind::Let, SymbolKind::Let));
    }

    #[test]
    fn generated_symbols_are_never_renamed() {
        let mut table = SymbolTable::new();
        let id = table.alloc(new_symbol(name(0), SymbolKind::Generated, TextRange::empty(0u32.into())));
        assert!(table.get(id).flags.contains(SymbolFlags::DO_NOT_RENAME));
    }
}
