//! Low-level primitives shared by every `jsc_*` crate: byte-offset text
//! ranges, a generic append-only arena indexed by a stable `u32` id, and a
//! process- (or parser-instance-) owned string interner.
//!
//! None of this is JavaScript-specific. The AST in `jsc_syntax::ast` is a
//! typed tree of `Expr`/`Stmt` nodes rather than an untyped lossless CST, so
//! there is no green/red tree duality here: a node is just a `u32` index
//! into a `Vec`, and cloning a handle is a `Copy`.

mod arena;
mod interner;
mod span;

pub use arena::{Arena, Idx};
pub use interner::{Interner, Name};
pub use span::{TextRange, TextSize};
