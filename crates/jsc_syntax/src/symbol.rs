use jsc_rowan::{Idx, Name, TextRange};

pub type SymbolId = Idx<Symbol>;

/// One entry per binding (declared or synthesized); also
/// one synthetic entry per *use* of an `Unbound` name so the validator can
/// still report a range for "x is not defined"-class warnings without a
/// separate use-table.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Name,
    pub kind: SymbolKind,
    pub use_count_estimate: u32,
    pub declaration_range: TextRange,
    pub is_captured: bool,
    pub flags: SymbolFlags,
}

impl Symbol {
    pub fn new(name: Name, kind: SymbolKind, declaration_range: TextRange) -> Self {
        Self {
            name,
            kind,
            use_count_estimate: 0,
            declaration_range,
            is_captured: false,
            flags: SymbolFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Unbound,
    Hoisted,
    HoistedFunction,
    ConstantHoistedFunction,
    Var,
    Let,
    Const,
    Catch,
    CatchBinding,
    Function,
    Class,
    Import,
    PrivateField,
    PrivateMethod,
    PrivateGetter,
    PrivateSetter,
    PrivateStaticField,
    PrivateStaticMethod,
    PrivateStaticGetter,
    PrivateStaticSetter,
    /// Compiler-introduced temporary (optional-chain base cache, lowering
    /// helper, …). Always carries `SymbolFlags::DO_NOT_RENAME`.
    Generated,
}

impl SymbolKind {
    /// `var`/`var` redeclaration is fine; any other pairing with a
    /// non-`var` kind at the same scope conflicts.
    pub fn is_var_like(self) -> bool {
        matches!(self, Self::Var | Self::Hoisted)
    }

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::Function | Self::HoistedFunction | Self::ConstantHoistedFunction
        )
    }

    pub fn is_lexical(self) -> bool {
        matches!(self, Self::Let | Self::Const | Self::Class)
    }

    pub fn is_private(self) -> bool {
        matches!(
            self,
            Self::PrivateField
                | Self::PrivateMethod
                | Self::PrivateGetter
                | Self::PrivateSetter
                | Self::PrivateStaticField
                | Self::PrivateStaticMethod
                | Self::PrivateStaticGetter
                | Self::PrivateStaticSetter
        )
    }

    /// Accessor pairs (`get`/`set`) consume the same private name slot
    /// without conflicting.
    pub fn private_accessor_pair(self) -> Option<(SymbolKind, SymbolKind)> {
        match self {
            Self::PrivateGetter | Self::PrivateSetter => {
                Some((Self::PrivateGetter, Self::PrivateSetter))
            }
            Self::PrivateStaticGetter | Self::PrivateStaticSetter => {
                Some((Self::PrivateStaticGetter, Self::PrivateStaticSetter))
            }
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Renaming/shadowing metadata the mangler and lowerer consult before
    /// touching a symbol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u8 {
        /// Set on every compiler-generated name and on any name captured by
        /// a direct `eval` in scope; the mangler must never rename it.
        const DO_NOT_RENAME = 1 << 0;
        /// Set when a declaration in an inner scope hides an outer one of
        /// the same interned name — informational, used by diagnostics.
        const WAS_SHADOWED = 1 << 1;
        /// Set on the lazily-synthesized `arguments` binding once the
        /// function body actually references it.
        const IMPLICIT_ARGUMENTS = 1 << 2;
    }
}
